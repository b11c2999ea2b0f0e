//! Hugging Face inference endpoint image provider.
//!
//! ## Configuration
//!
//! ```bash
//! IMAGE_PROVIDER=huggingface
//! HF_ENDPOINT_URL=https://xyz.endpoints.huggingface.cloud
//! HF_TOKEN=hf_...
//! HF_INFERENCE_STEPS=30
//! HF_GUIDANCE_SCALE=7.5
//! ```
//!
//! The endpoint answers with the raw image bytes.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::{json, Value};

use super::{http_client, GenerationError, ImageData, ImageGenerator};
use crate::config::GenerationConfig;

const PROVIDER: &str = "Hugging Face";

/// Text-to-image (and image-to-image) via a dedicated inference endpoint.
#[derive(Debug, Clone)]
pub struct HuggingFaceImageGenerator {
    client: reqwest::Client,
    endpoint_url: Option<String>,
    token: Option<String>,
    inference_steps: u32,
    guidance_scale: f64,
}

impl HuggingFaceImageGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        Ok(Self {
            client: http_client(config)?,
            endpoint_url: config.hf_endpoint_url.clone(),
            token: config.hf_token.clone(),
            inference_steps: config.hf_inference_steps,
            guidance_scale: config.hf_guidance_scale,
        })
    }

    fn request_body(&self, prompt: &str, reference: Option<&ImageData>) -> Value {
        let mut parameters = json!({
            "num_inference_steps": self.inference_steps,
            "guidance_scale": self.guidance_scale,
        });
        match reference {
            Some(image) => {
                parameters["prompt"] = json!(prompt);
                json!({"inputs": image.to_base64(), "parameters": parameters})
            }
            None => json!({"inputs": prompt, "parameters": parameters}),
        }
    }
}

#[async_trait]
impl ImageGenerator for HuggingFaceImageGenerator {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn generate_image(
        &self,
        prompt: &str,
        reference: Option<&ImageData>,
    ) -> Result<ImageData, GenerationError> {
        let endpoint = self
            .endpoint_url
            .as_deref()
            .ok_or_else(|| GenerationError::NotConfigured {
                provider: PROVIDER,
                reason: "set HF_ENDPOINT_URL".to_string(),
            })?;

        let mut request = self.client.post(endpoint).json(&self.request_body(prompt, reference));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        log::debug!("Hugging Face inference: reference={}", reference.is_some());

        let response = request.send().await?;
        let status = response.status();
        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("image/png")
            .to_string();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                provider: PROVIDER,
                status: status.as_u16(),
                body,
            });
        }
        if !mime_type.starts_with("image/") {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::invalid(
                PROVIDER,
                format!("expected image bytes, got '{}': {}", mime_type, body),
            ));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(GenerationError::invalid(PROVIDER, "empty image body"));
        }
        Ok(ImageData::new(bytes.to_vec(), mime_type))
    }
}
