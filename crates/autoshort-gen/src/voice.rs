//! Voice synthesis client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::info;

use crate::contract::VoiceSynthesizer;
use crate::error::{GenError, GenResult};

const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// HTTP text-to-speech client returning encoded audio bytes.
pub struct HttpVoiceSynthesizer {
    base_url: String,
    api_key: String,
    voice: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    input: &'a str,
    voice: &'a str,
    response_format: &'static str,
}

impl HttpVoiceSynthesizer {
    /// Create a client against `base_url` with the given key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> GenResult<Self> {
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            voice: "alloy".to_string(),
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
                .build()?,
        })
    }

    /// Create a client from `VOICE_API_URL` / `VOICE_API_KEY` / `VOICE_NAME`.
    pub fn from_env() -> GenResult<Self> {
        let base_url = std::env::var("VOICE_API_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let api_key = std::env::var("VOICE_API_KEY")
            .map_err(|_| GenError::config("VOICE_API_KEY not configured"))?;
        let mut synth = Self::new(base_url, api_key)?;
        if let Ok(voice) = std::env::var("VOICE_NAME") {
            synth.voice = voice;
        }
        Ok(synth)
    }
}

#[async_trait]
impl VoiceSynthesizer for HttpVoiceSynthesizer {
    async fn synthesize(&self, text: &str) -> GenResult<Vec<u8>> {
        let url = format!("{}/audio/speech", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&SpeechRequest {
                input: text,
                voice: &self.voice,
                response_format: "mp3",
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

        info!("Synthesized {} bytes of narration audio", bytes.len());
        Ok(bytes.to_vec())
    }
}
