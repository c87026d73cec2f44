//! Image synthesis client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::info;

use autoshort_models::FrameSize;

use crate::contract::ImageSynthesizer;
use crate::error::{GenError, GenResult};

const DEFAULT_TIMEOUT_SECS: u64 = 90;

/// HTTP image generation client returning encoded image bytes.
pub struct HttpImageSynthesizer {
    base_url: String,
    api_key: String,
    style_suffix: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    prompt: &'a str,
    width: u32,
    height: u32,
}

impl HttpImageSynthesizer {
    /// Create a client against `base_url` with the given key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> GenResult<Self> {
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            style_suffix: "vertical composition, high contrast, no text".to_string(),
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
                .build()?,
        })
    }

    /// Create a client from `IMAGE_API_URL` / `IMAGE_API_KEY`.
    pub fn from_env() -> GenResult<Self> {
        let base_url = std::env::var("IMAGE_API_URL")
            .map_err(|_| GenError::config("IMAGE_API_URL not configured"))?;
        let api_key = std::env::var("IMAGE_API_KEY")
            .map_err(|_| GenError::config("IMAGE_API_KEY not configured"))?;
        Self::new(base_url, api_key)
    }
}

#[async_trait]
impl ImageSynthesizer for HttpImageSynthesizer {
    async fn synthesize(&self, prompt: &str, target: FrameSize) -> GenResult<Vec<u8>> {
        let url = format!("{}/images/generate", self.base_url);
        let full_prompt = format!("{}, {}", prompt, self.style_suffix);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&ImageRequest {
                prompt: &full_prompt,
                width: target.width,
                height: target.height,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GenError::api(status, body));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(GenError::EmptyResponse);
        }

        info!("Synthesized visual ({} bytes) for \"{}\"", bytes.len(), prompt);
        Ok(bytes.to_vec())
    }
}
