//! Script generation client.
//!
//! Talks to an OpenAI-compatible chat completions endpoint and parses
//! the structured JSON script out of the reply, tolerating markdown code
//! fences around it.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use autoshort_models::{Script, TrendingContext};

use crate::contract::ScriptGenerator;
use crate::error::{GenError, GenResult};

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Chat-completions client for script generation.
pub struct HttpScriptGenerator {
    base_url: String,
    api_key: String,
    /// Models to try in order; the first that answers wins
    models: Vec<String>,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

impl HttpScriptGenerator {
    /// Create a client against `base_url` with the given key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> GenResult<Self> {
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            models: vec!["gpt-4o-mini".to_string(), "gpt-4o".to_string()],
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
                .build()?,
        })
    }

    /// Create a client from `SCRIPT_API_URL` / `SCRIPT_API_KEY`.
    pub fn from_env() -> GenResult<Self> {
        let base_url = std::env::var("SCRIPT_API_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let api_key = std::env::var("SCRIPT_API_KEY")
            .map_err(|_| GenError::config("SCRIPT_API_KEY not configured"))?;
        Self::new(base_url, api_key)
    }

    /// Override the model fallback list.
    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = models;
        self
    }

    async fn call_model(&self, model: &str, prompt: &str) -> GenResult<Script> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt.to_string(),
            }],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GenError::api(status, body));
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or(GenError::EmptyResponse)?;

        parse_script_json(content)
    }
}

#[async_trait]
impl ScriptGenerator for HttpScriptGenerator {
    async fn generate(&self, context: &TrendingContext) -> GenResult<Script> {
        let prompt = build_script_prompt(context);
        let mut last_error = None;

        for model in &self.models {
            info!("Requesting script from model {}", model);
            match self.call_model(model, &prompt).await {
                Ok(script) => {
                    info!("Script generated by {}: \"{}\"", model, script.title);
                    return Ok(script);
                }
                Err(e) => {
                    warn!("Model {} failed: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(GenError::EmptyResponse))
    }
}

/// Parse the script JSON out of a model reply, stripping markdown fences.
pub fn parse_script_json(content: &str) -> GenResult<Script> {
    let text = content.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);

    serde_json::from_str(text.trim()).map_err(|e| GenError::malformed(format!("script JSON: {}", e)))
}

/// Build the generation prompt for a trending context.
pub fn build_script_prompt(context: &TrendingContext) -> String {
    let mut prompt = String::from(
        "You write narration scripts for 45-60 second vertical videos. \
         Pick ONE of the trending topics below and write a punchy, factual \
         narration for it.\n\nTRENDING TOPICS:\n",
    );

    for topic in &context.topics {
        prompt.push_str(&format!("- {}\n", topic));
    }
    if !context.tags.is_empty() {
        prompt.push_str(&format!("\nRELATED TAGS: {}\n", context.tags.join(", ")));
    }

    prompt.push_str(
        r#"
Return ONLY a single JSON object with this schema:
{
  "title": "Video title",
  "hook": "One attention-grabbing opening line",
  "narration": "Full narration, 6-10 short sentences, each ending with a period",
  "thumbnail_caption": "2-4 word caption",
  "tags": ["tag1", "tag2"]
}"#,
    );

    prompt
}
