//! Outbound text and image generation services.
//!
//! Handlers only see the [`TextGenerator`] and [`ImageGenerator`] traits;
//! [`build_text_generator`] and [`build_image_generator`] pick the concrete
//! provider from [`GenerationConfig`].
//!
//! Calls are independent and bounded by the configured client timeout. A
//! failure is returned as-is; the gateway never retries.

pub mod error;
pub mod gemini;
pub mod huggingface;

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

pub use error::GenerationError;
pub use gemini::{GeminiImageGenerator, GeminiTextGenerator};
pub use huggingface::HuggingFaceImageGenerator;

use crate::config::{GenerationConfig, ImageProvider};

/// Produces a written description from a prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    async fn generate_text(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Produces an image from a prompt, optionally editing a reference image.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    async fn generate_image(
        &self,
        prompt: &str,
        reference: Option<&ImageData>,
    ) -> Result<ImageData, GenerationError>;
}

/// Raw image bytes plus their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageData {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Decode a base64 payload, accepting an optional
    /// `data:<mime>;base64,` prefix. Without a prefix the MIME type is
    /// `image/png`.
    pub fn from_base64(encoded: &str) -> Result<Self, base64::DecodeError> {
        let encoded = encoded.trim();
        let (mime_type, payload) = match encoded
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(";base64,"))
        {
            Some((mime, payload)) if !mime.is_empty() => (mime, payload),
            Some((_, payload)) => ("image/png", payload),
            None => ("image/png", encoded),
        };
        let bytes = BASE64.decode(payload)?;
        Ok(Self::new(bytes, mime_type))
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }
}

/// Build the description provider.
pub fn build_text_generator(
    config: &GenerationConfig,
) -> Result<Arc<dyn TextGenerator>, GenerationError> {
    Ok(Arc::new(GeminiTextGenerator::new(config)?))
}

/// Build the image provider selected by `config.image_provider`.
pub fn build_image_generator(
    config: &GenerationConfig,
) -> Result<Arc<dyn ImageGenerator>, GenerationError> {
    match config.image_provider {
        ImageProvider::Gemini => Ok(Arc::new(GeminiImageGenerator::new(config)?)),
        ImageProvider::HuggingFace => Ok(Arc::new(HuggingFaceImageGenerator::new(config)?)),
    }
}

pub(crate) fn http_client(config: &GenerationConfig) -> Result<reqwest::Client, GenerationError> {
    Ok(reqwest::Client::builder().timeout(config.timeout).build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_data_plain_base64() {
        let image = ImageData::from_base64("aGVsbG8=").unwrap();
        assert_eq!(image.bytes, b"hello");
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.to_base64(), "aGVsbG8=");
    }

    #[test]
    fn test_image_data_data_url() {
        let image = ImageData::from_base64("data:image/jpeg;base64,aGVsbG8=").unwrap();
        assert_eq!(image.bytes, b"hello");
        assert_eq!(image.mime_type, "image/jpeg");
    }

    #[test]
    fn test_image_data_rejects_garbage() {
        assert!(ImageData::from_base64("not base64 !!").is_err());
    }

    #[test]
    fn test_builders_select_configured_provider() {
        let mut config = GenerationConfig::default();
        assert_eq!(build_text_generator(&config).unwrap().name(), "gemini");
        assert_eq!(build_image_generator(&config).unwrap().name(), "gemini-image");

        config.image_provider = ImageProvider::HuggingFace;
        assert_eq!(build_image_generator(&config).unwrap().name(), "huggingface");
    }
}
