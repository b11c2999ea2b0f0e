//! stylesynth HTTP server binary.
//!
//! Loads the style library, wires the generation providers, and serves the
//! API with axum. See [`stylesynth::config`] for the environment variables.
//!
//! # Usage
//!
//! ```bash
//! GEMINI_API_KEY=... cargo run --bin server
//! # with a custom library and a Hugging Face image endpoint:
//! STYLE_LIBRARY_PATH=styles.yaml IMAGE_PROVIDER=huggingface \
//!   HF_ENDPOINT_URL=... HF_TOKEN=... cargo run --bin server
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use stylesynth::gateway::{build_image_generator, build_text_generator};
use stylesynth::security::RateLimiter;
use stylesynth::server::{app_router, AppState};
use stylesynth::{ServerConfig, StyleLibrary};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,stylesynth=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env().context("Invalid server configuration")?;

    let library = match &config.library_path {
        Some(path) => StyleLibrary::from_file(path)
            .with_context(|| format!("Failed to load style library from {:?}", path))?,
        None => StyleLibrary::builtin().context("Built-in style library is invalid")?,
    };
    tracing::info!(
        "Style library: {} styles, {} axes",
        library.styles.len(),
        library.axes.len()
    );

    let text = build_text_generator(&config.generation).context("Failed to build text provider")?;
    let image =
        build_image_generator(&config.generation).context("Failed to build image provider")?;
    if config.generation.gemini_api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY not set; generation calls will fail");
    }

    let bind_addr = config.bind_addr();
    let state = AppState::new(config, library, text, image);
    spawn_limiter_sweeper(Arc::clone(&state.limiter));

    let app = app_router(state);

    tracing::info!("stylesynth server starting on {}", bind_addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health       — liveness probe");
    tracing::info!("  GET  /api/styles   — library vocabulary");
    tracing::info!("  POST /api/generate — description + image");
    tracing::info!("  POST /api/refine   — delta-driven image edit");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server failed")?;

    tracing::info!("stylesynth server stopped");
    Ok(())
}

/// Periodically forget clients whose request history has expired.
fn spawn_limiter_sweeper(limiter: Arc<RateLimiter>) {
    if !limiter.is_enabled() {
        return;
    }
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(limiter.window());
        loop {
            interval.tick().await;
            let evicted = limiter.evict_idle();
            if evicted > 0 {
                tracing::debug!("Evicted {} idle rate-limit entries", evicted);
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
