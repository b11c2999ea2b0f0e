//! Server configuration read from environment variables.
//!
//! # Environment Variables
//!
//! - `BIND_HOST` / `PORT` — listen address (default `0.0.0.0:8080`)
//! - `STYLE_LIBRARY_PATH` — YAML or JSON style library (built-in if unset)
//! - `RATE_LIMIT_PER_MINUTE` — per-client budget for POST endpoints (default 20, `0` disables)
//! - `TRUST_PROXY_HEADERS` — key rate limiting on `X-Forwarded-For` / `X-Real-IP` (default `false`)
//! - `EXPOSE_RESOLVED` — include resolved phrases in `/api/generate` responses (default `true`)
//! - `CORS_ORIGINS` — comma-separated allowed origins (permissive if unset)
//! - `STATIC_DIR` — directory served for non-API paths
//! - `GENERATION_TIMEOUT_SECS` — outbound call timeout (default 120)
//! - `GEMINI_API_KEY` / `GOOGLE_API_KEY`, `GEMINI_BASE_URL`, `TEXT_MODEL`, `IMAGE_MODEL`
//! - `IMAGE_PROVIDER` — `gemini` (default) or `huggingface`
//! - `HF_ENDPOINT_URL`, `HF_TOKEN`, `HF_INFERENCE_STEPS` (30), `HF_GUIDANCE_SCALE` (7.5)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 20;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

/// A variable was set to something unusable.
#[derive(Debug, Error)]
#[error("Invalid value '{value}' for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Which service renders images.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImageProvider {
    #[default]
    Gemini,
    HuggingFace,
}

impl FromStr for ImageProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "huggingface" | "hf" => Ok(Self::HuggingFace),
            other => Err(format!("unknown image provider '{}'", other)),
        }
    }
}

/// Settings for the outbound generation services.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub timeout: Duration,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub image_provider: ImageProvider,
    pub hf_endpoint_url: Option<String>,
    pub hf_token: Option<String>,
    pub hf_inference_steps: u32,
    pub hf_guidance_scale: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            gemini_api_key: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            image_provider: ImageProvider::Gemini,
            hf_endpoint_url: None,
            hf_token: None,
            hf_inference_steps: 30,
            hf_guidance_scale: 7.5,
        }
    }
}

/// Everything the server binary needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub library_path: Option<PathBuf>,
    /// Requests per client per minute; `0` disables limiting.
    pub rate_limit_per_minute: u32,
    /// Identify clients by proxy headers instead of the peer address. Only
    /// safe behind a reverse proxy that overwrites them.
    pub trust_proxy_headers: bool,
    pub expose_resolved: bool,
    pub cors_origins: Vec<String>,
    pub static_dir: Option<PathBuf>,
    pub generation: GenerationConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            library_path: None,
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
            trust_proxy_headers: false,
            expose_resolved: true,
            cors_origins: Vec::new(),
            static_dir: None,
            generation: GenerationConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();
        let generation_defaults = GenerationConfig::default();

        let generation = GenerationConfig {
            timeout: Duration::from_secs(parse_or(
                "GENERATION_TIMEOUT_SECS",
                get("GENERATION_TIMEOUT_SECS"),
                DEFAULT_TIMEOUT_SECS,
            )?),
            gemini_api_key: get("GEMINI_API_KEY").or_else(|| get("GOOGLE_API_KEY")),
            gemini_base_url: get("GEMINI_BASE_URL").unwrap_or(generation_defaults.gemini_base_url),
            text_model: get("TEXT_MODEL").unwrap_or(generation_defaults.text_model),
            image_model: get("IMAGE_MODEL").unwrap_or(generation_defaults.image_model),
            image_provider: parse_or("IMAGE_PROVIDER", get("IMAGE_PROVIDER"), ImageProvider::Gemini)?,
            hf_endpoint_url: get("HF_ENDPOINT_URL"),
            hf_token: get("HF_TOKEN"),
            hf_inference_steps: parse_or(
                "HF_INFERENCE_STEPS",
                get("HF_INFERENCE_STEPS"),
                generation_defaults.hf_inference_steps,
            )?,
            hf_guidance_scale: parse_or(
                "HF_GUIDANCE_SCALE",
                get("HF_GUIDANCE_SCALE"),
                generation_defaults.hf_guidance_scale,
            )?,
        };

        Ok(Self {
            host: get("BIND_HOST").unwrap_or(defaults.host),
            port: parse_or("PORT", get("PORT"), DEFAULT_PORT)?,
            library_path: get("STYLE_LIBRARY_PATH").map(PathBuf::from),
            rate_limit_per_minute: parse_or(
                "RATE_LIMIT_PER_MINUTE",
                get("RATE_LIMIT_PER_MINUTE"),
                DEFAULT_RATE_LIMIT_PER_MINUTE,
            )?,
            trust_proxy_headers: parse_bool(
                "TRUST_PROXY_HEADERS",
                get("TRUST_PROXY_HEADERS"),
                false,
            )?,
            expose_resolved: parse_bool("EXPOSE_RESOLVED", get("EXPOSE_RESOLVED"), true)?,
            cors_origins: get("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(str::trim)
                        .filter(|origin| !origin.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            static_dir: get("STATIC_DIR").map(PathBuf::from),
            generation,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(var: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = value else {
        return Ok(default);
    };
    match raw.parse::<T>() {
        Ok(parsed) => Ok(parsed),
        Err(e) => Err(ConfigError {
            var,
            reason: e.to_string(),
            value: raw,
        }),
    }
}

fn parse_bool(var: &'static str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = value else {
        return Ok(default);
    };
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError {
            var,
            value: raw,
            reason: "expected true or false".to_string(),
        }),
    }
}
