//! Publishing client.
//!
//! Uploads a produced video to the hosting platform. OAuth/token
//! handling is the platform gateway's concern; this client only carries
//! the file and its metadata.

use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use autoshort_models::PublishMetadata;

use crate::contract::Publisher;
use crate::error::{GenError, GenResult};

const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// HTTP upload client for the hosting platform gateway.
pub struct HttpPublisher {
    base_url: String,
    api_key: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct PublishResponse {
    id: String,
}

impl HttpPublisher {
    /// Create a client against `base_url` with the given key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> GenResult<Self> {
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
                .build()?,
        })
    }

    /// Create a client from `PUBLISH_API_URL` / `PUBLISH_API_KEY`.
    pub fn from_env() -> GenResult<Self> {
        let base_url = std::env::var("PUBLISH_API_URL")
            .map_err(|_| GenError::config("PUBLISH_API_URL not configured"))?;
        let api_key = std::env::var("PUBLISH_API_KEY")
            .map_err(|_| GenError::config("PUBLISH_API_KEY not configured"))?;
        Self::new(base_url, api_key)
    }
}

#[async_trait]
impl Publisher for HttpPublisher {
    async fn publish(&self, media_file: &Path, metadata: &PublishMetadata) -> GenResult<String> {
        let url = format!("{}/videos", self.base_url);

        let bytes = tokio::fs::read(media_file).await?;
        let file_name = media_file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "short.mp4".to_string());

        let form = multipart::Form::new()
            .text(
                "metadata",
                serde_json::to_string(metadata)
                    .map_err(|e| GenError::malformed(format!("metadata: {}", e)))?,
            )
            .part(
                "file",
                multipart::Part::bytes(bytes)
                    .file_name(file_name)
                    .mime_str("video/mp4")
                    .map_err(GenError::Http)?,
            );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GenError::api(status, body));
        }

        let published: PublishResponse = response.json().await?;
        info!("Published {} as {}", media_file.display(), published.id);
        Ok(published.id)
    }
}
