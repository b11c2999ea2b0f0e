//! HTTP server for style-driven interior generation.
//!
//! # Endpoints
//!
//! - `GET  /health`       — Liveness probe
//! - `GET  /api/styles`   — Library vocabulary
//! - `POST /api/generate` — Prompt synthesis + description and image generation
//! - `POST /api/refine`   — Delta-driven edit of a reference image

pub mod error;
pub mod routes;

pub use error::ApiError;
pub use routes::{app_router, AppState};
