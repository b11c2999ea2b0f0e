//! Axum route handlers for the stylesynth HTTP server.
//!
//! # Routes
//!
//! - `GET  /health`        — Returns `{"status": "ok", "version": "...", "service": "stylesynth"}`
//! - `GET  /api/styles`    — Style names, axis names, and bucket ranges
//! - `POST /api/generate`  — Resolve parameters, assemble a prompt, generate description + image
//! - `POST /api/refine`    — Turn a parameter delta into an edit of a reference image
//!
//! The two POST routes sit behind the per-client rate limiter.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, DefaultBodyLimit, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::error::ApiError;
use crate::config::ServerConfig;
use crate::gateway::{ImageData, ImageGenerator, TextGenerator};
use crate::library::StyleLibrary;
use crate::prompt::{assemble_style, Scene};
use crate::refinement::{refine, Delta};
use crate::resolver::{lookup_style, resolve_style, ParameterSet, ResolvedPhraseMap, ValidationError};
use crate::security::RateLimiter;

/// Reference images arrive base64-encoded inside JSON.
const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    /// Immutable style library.
    pub library: Arc<StyleLibrary>,
    /// Description service.
    pub text: Arc<dyn TextGenerator>,
    /// Image service.
    pub image: Arc<dyn ImageGenerator>,
    /// Per-client request history.
    pub limiter: Arc<RateLimiter>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        library: StyleLibrary,
        text: Arc<dyn TextGenerator>,
        image: Arc<dyn ImageGenerator>,
    ) -> Self {
        Self {
            library: Arc::new(library),
            text,
            image,
            limiter: Arc::new(RateLimiter::per_minute(config.rate_limit_per_minute)),
            config: Arc::new(config),
        }
    }
}

/// Build the axum router with all routes.
pub fn app_router(state: AppState) -> Router {
    let limited = Router::new()
        .route("/api/generate", post(generate_handler))
        .route("/api/refine", post(refine_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route("/api/styles", get(styles_handler))
        .merge(limited);

    if let Some(dir) = &state.config.static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors_layer(&state.config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

// ---------------------------------------------------------------------------
// Rate limiting
// ---------------------------------------------------------------------------

async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let peer = request.extensions().get::<ConnectInfo<SocketAddr>>();
    let client = client_identity(request.headers(), peer, state.config.trust_proxy_headers);
    if !state.limiter.check(&client) {
        tracing::info!(client = %client, "Rate limit exceeded");
        return ApiError::RateLimited.into_response();
    }
    next.run(request).await
}

/// The peer address. With `trust_proxy` set, the first `X-Forwarded-For`
/// hop or `X-Real-IP` take precedence; clients can forge both, so they are
/// only honoured behind a proxy that overwrites them.
fn client_identity(
    headers: &HeaderMap,
    peer: Option<&ConnectInfo<SocketAddr>>,
    trust_proxy: bool,
) -> String {
    let peer_ip = peer.map(|ConnectInfo(addr)| addr.ip().to_string());
    if !trust_proxy {
        return peer_ip.unwrap_or_else(|| "unknown".to_string());
    }

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    forwarded
        .or(real_ip)
        .map(String::from)
        .or(peer_ip)
        .unwrap_or_else(|| "unknown".to_string())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /health — liveness probe.
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
        "service": "stylesynth",
    }))
}

#[derive(Debug, Serialize)]
struct StylesResponse<'a> {
    styles: Vec<&'a str>,
    axes: Vec<&'a str>,
    ranges: IndexMap<&'a str, [f64; 2]>,
}

/// GET /api/styles — library vocabulary in document order.
async fn styles_handler(State(state): State<AppState>) -> Response {
    let library = &state.library;
    let body = StylesResponse {
        styles: library.style_names(),
        axes: library.axis_names(),
        ranges: library
            .ranges
            .iter()
            .map(|(bucket, range)| (bucket.as_str(), [range.low, range.high]))
            .collect(),
    };
    Json(body).into_response()
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    style: String,
    result: String,
    image_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved: Option<ResolvedPhraseMap>,
}

/// POST /api/generate — resolve, assemble, and call both services.
///
/// Request: `{ "style": str, "params": {axis: number}, "scene"?: {"roomType"?, "constraints"?} }`
///
/// Text failure is fatal (500). Image failure is logged and returned as
/// `image_base64: null`.
async fn generate_handler(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Json(body) = payload?;
    let body = body_object(&body)?;
    let library = &state.library;

    let style_name = required_str(body, "style")?;
    let style = lookup_style(library, style_name)?;

    let params = match body.get("params") {
        None | Some(Value::Null) => None,
        Some(value) => Some(ParameterSet::from_json(library, "params", value)?),
    }
    .filter(|params| !params.is_empty())
    .ok_or_else(|| ValidationError::new("missing or empty 'params'"))?;

    let scene = match body.get("scene") {
        None | Some(Value::Null) => None,
        Some(value) => Some(
            serde_json::from_value::<Scene>(value.clone())
                .map_err(|e| ValidationError::new(format!("invalid 'scene': {}", e)))?,
        ),
    };

    let resolved = resolve_style(library, style, &params);
    let prompt = assemble_style(style, &resolved, scene.as_ref());
    tracing::info!(style = %style_name, axes = params.len(), "Generating interior");
    tracing::debug!("Prompt:\n{}", prompt);

    let (text, image) = tokio::join!(
        state.text.generate_text(&prompt),
        state.image.generate_image(&prompt, None)
    );

    let result = text.map_err(|e| {
        tracing::error!(provider = state.text.name(), "Text generation failed: {}", e);
        ApiError::from(e)
    })?;
    let image_base64 = match image {
        Ok(image) => Some(image.to_base64()),
        Err(e) => {
            tracing::warn!(provider = state.image.name(), "Image generation failed: {}", e);
            None
        }
    };

    Ok(Json(GenerateResponse {
        style: style_name.to_string(),
        result,
        image_base64,
        resolved: state.config.expose_resolved.then_some(resolved),
    }))
}

#[derive(Debug, Serialize)]
struct RefineResponse {
    style: String,
    refinement_type: String,
    p_0: ParameterSet,
    p_1: ParameterSet,
    delta: Delta,
    refinement_prompt: String,
    image_base64: String,
}

/// POST /api/refine — edit the reference image according to the parameter delta.
///
/// Request: `{ "style", "p_0", "p_1", "img_0": base64, "refinement_type" }`
///
/// The image is the only deliverable, so an image failure is a 500.
async fn refine_handler(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<RefineResponse>, ApiError> {
    let Json(body) = payload?;
    let body = body_object(&body)?;
    let library = &state.library;

    let style_name = required_str(body, "style")?;
    let p_0 = ParameterSet::from_json(library, "p_0", required(body, "p_0")?)?;
    let p_1 = ParameterSet::from_json(library, "p_1", required(body, "p_1")?)?;
    let reference = ImageData::from_base64(required_str(body, "img_0")?)
        .map_err(|e| ValidationError::new(format!("'img_0' is not valid base64: {}", e)))?;
    let refinement_type = required_str(body, "refinement_type")?;

    let refinement = refine(library, style_name, &p_0, &p_1, refinement_type)?;
    tracing::info!(
        style = %style_name,
        refinement_type = %refinement_type,
        phrases = refinement.phrases.len(),
        "Refining interior"
    );

    let image = state
        .image
        .generate_image(&refinement.prompt, Some(&reference))
        .await
        .map_err(|e| {
            tracing::error!(provider = state.image.name(), "Refinement image failed: {}", e);
            ApiError::from(e)
        })?;

    Ok(Json(RefineResponse {
        style: style_name.to_string(),
        refinement_type: refinement_type.to_string(),
        p_0,
        p_1,
        delta: refinement.delta,
        refinement_prompt: refinement.prompt,
        image_base64: image.to_base64(),
    }))
}

// ---------------------------------------------------------------------------
// Field extraction
// ---------------------------------------------------------------------------

fn body_object(body: &Value) -> Result<&serde_json::Map<String, Value>, ValidationError> {
    body.as_object()
        .ok_or_else(|| ValidationError::new("request body must be a JSON object"))
}

fn required<'a>(
    body: &'a serde_json::Map<String, Value>,
    field: &str,
) -> Result<&'a Value, ValidationError> {
    match body.get(field) {
        None | Some(Value::Null) => Err(ValidationError::missing(field)),
        Some(value) => Ok(value),
    }
}

fn required_str<'a>(
    body: &'a serde_json::Map<String, Value>,
    field: &str,
) -> Result<&'a str, ValidationError> {
    let value = required(body, field)?
        .as_str()
        .ok_or_else(|| ValidationError::new(format!("'{}' must be a string", field)))?;
    if value.trim().is_empty() {
        return Err(ValidationError::missing(field));
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
