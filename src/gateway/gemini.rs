//! Google Gemini providers for descriptions and images.
//!
//! Both use the `generateContent` endpoint:
//! `{base_url}/models/{model}:generateContent`.
//!
//! # Authentication
//!
//! Uses `GEMINI_API_KEY` or `GOOGLE_API_KEY`, sent in the `x-goog-api-key`
//! header so the key never appears in a request URL. A missing key is
//! reported per call as [`GenerationError::NotConfigured`] so the server
//! still starts.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};

use super::{http_client, GenerationError, ImageData, ImageGenerator, TextGenerator};
use crate::config::GenerationConfig;

const PROVIDER: &str = "Gemini";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Shared request plumbing for both Gemini providers.
#[derive(Debug, Clone)]
struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    fn new(config: &GenerationConfig, model: &str) -> Result<Self, GenerationError> {
        Ok(Self {
            client: http_client(config)?,
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: config.gemini_api_key.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    async fn generate(&self, body: &Value) -> Result<Value, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GenerationError::NotConfigured {
                provider: PROVIDER,
                reason: "set GEMINI_API_KEY or GOOGLE_API_KEY".to_string(),
            })?;

        log::debug!("Gemini generateContent: model={}", self.model);
        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(GenerationError::Api {
                provider: PROVIDER,
                status: status.as_u16(),
                body: truncate(&text, 500),
            });
        }

        let json: Value = serde_json::from_str(&text).map_err(|e| {
            GenerationError::invalid(PROVIDER, format!("{} - Body: {}", e, truncate(&text, 500)))
        })?;
        if let Some(error) = json.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown Gemini API error");
            return Err(GenerationError::invalid(PROVIDER, message));
        }
        Ok(json)
    }
}

/// Description generator backed by a Gemini text model.
#[derive(Debug, Clone)]
pub struct GeminiTextGenerator {
    inner: GeminiClient,
}

impl GeminiTextGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        Ok(Self {
            inner: GeminiClient::new(config, &config.text_model)?,
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiTextGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
        });
        let response = self.inner.generate(&body).await?;
        parse_text_response(&response)
    }
}

/// Image generator backed by a Gemini image model. A reference image is
/// sent as inline data ahead of the prompt.
#[derive(Debug, Clone)]
pub struct GeminiImageGenerator {
    inner: GeminiClient,
}

impl GeminiImageGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        Ok(Self {
            inner: GeminiClient::new(config, &config.image_model)?,
        })
    }
}

#[async_trait]
impl ImageGenerator for GeminiImageGenerator {
    fn name(&self) -> &str {
        "gemini-image"
    }

    async fn generate_image(
        &self,
        prompt: &str,
        reference: Option<&ImageData>,
    ) -> Result<ImageData, GenerationError> {
        let body = image_request_body(prompt, reference);
        let response = self.inner.generate(&body).await?;
        parse_image_response(&response)
    }
}

fn image_request_body(prompt: &str, reference: Option<&ImageData>) -> Value {
    let mut parts = Vec::with_capacity(2);
    if let Some(image) = reference {
        parts.push(json!({
            "inlineData": {"mimeType": image.mime_type, "data": image.to_base64()}
        }));
    }
    parts.push(json!({"text": prompt}));

    json!({
        "contents": [{"role": "user", "parts": parts}],
        "generationConfig": {"responseModalities": ["IMAGE"]},
    })
}

fn candidate_parts(response: &Value) -> Result<&Vec<Value>, GenerationError> {
    response
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .ok_or_else(|| GenerationError::invalid(PROVIDER, "no candidates[0].content.parts"))
}

/// Concatenate the text parts of the first candidate.
pub(crate) fn parse_text_response(response: &Value) -> Result<String, GenerationError> {
    let text: Vec<&str> = candidate_parts(response)?
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    if text.is_empty() {
        return Err(GenerationError::invalid(PROVIDER, "no text in response"));
    }
    Ok(text.join(""))
}

/// Decode the first inline image of the first candidate.
pub(crate) fn parse_image_response(response: &Value) -> Result<ImageData, GenerationError> {
    let inline = candidate_parts(response)?
        .iter()
        .find_map(|part| part.get("inlineData").or_else(|| part.get("inline_data")))
        .ok_or_else(|| GenerationError::invalid(PROVIDER, "no image in response"))?;

    let data = inline
        .get("data")
        .and_then(Value::as_str)
        .ok_or_else(|| GenerationError::invalid(PROVIDER, "inlineData without data"))?;
    let mime_type = inline
        .get("mimeType")
        .or_else(|| inline.get("mime_type"))
        .and_then(Value::as_str)
        .unwrap_or("image/png");

    let bytes = BASE64
        .decode(data)
        .map_err(|e| GenerationError::invalid(PROVIDER, format!("bad image data: {}", e)))?;
    Ok(ImageData::new(bytes, mime_type))
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
