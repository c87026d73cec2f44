//! Trend discovery client.
//!
//! Fetches a trending snapshot from the video platform's metadata API.
//! Ranking heuristics live on the service side; this client only carries
//! the structured result to the script generator.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use autoshort_models::TrendingContext;

use crate::contract::TrendScout;
use crate::error::{GenError, GenResult};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP trend discovery client.
pub struct HttpTrendScout {
    base_url: String,
    api_key: String,
    region: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct TrendingResponse {
    items: Vec<TrendingItem>,
}

#[derive(Debug, Deserialize)]
struct TrendingItem {
    title: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    category: Option<String>,
}

impl HttpTrendScout {
    /// Create a client against `base_url` with the given key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> GenResult<Self> {
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            region: "US".to_string(),
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
                .build()?,
        })
    }

    /// Create a client from `TRENDS_API_URL` / `TRENDS_API_KEY` / `TRENDS_REGION`.
    pub fn from_env() -> GenResult<Self> {
        let base_url = std::env::var("TRENDS_API_URL")
            .map_err(|_| GenError::config("TRENDS_API_URL not configured"))?;
        let api_key = std::env::var("TRENDS_API_KEY")
            .map_err(|_| GenError::config("TRENDS_API_KEY not configured"))?;
        let mut scout = Self::new(base_url, api_key)?;
        if let Ok(region) = std::env::var("TRENDS_REGION") {
            scout.region = region;
        }
        Ok(scout)
    }
}

#[async_trait]
impl TrendScout for HttpTrendScout {
    async fn trending(&self) -> GenResult<TrendingContext> {
        let url = format!("{}/trending?region={}", self.base_url, self.region);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GenError::api(status, body));
        }

        let trending: TrendingResponse = response.json().await?;
        if trending.items.is_empty() {
            return Err(GenError::EmptyResponse);
        }

        let category = trending.items[0].category.clone();
        let mut topics = Vec::new();
        let mut tags = Vec::new();
        for item in trending.items {
            topics.push(item.title);
            tags.extend(item.tags);
        }
        tags.dedup();

        info!("Fetched {} trending topics", topics.len());
        Ok(TrendingContext {
            topics,
            tags,
            category,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_trending_maps_items() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "items": [
                {"title": "Topic A", "tags": ["a"], "category": "science"},
                {"title": "Topic B", "tags": ["b"]}
            ]
        });
        Mock::given(method("GET"))
            .and(path("/trending"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let scout = HttpTrendScout::new(server.uri(), "key").unwrap();
        let context = scout.trending().await.unwrap();
        assert_eq!(context.topics, vec!["Topic A", "Topic B"]);
        assert_eq!(context.category.as_deref(), Some("science"));
    }

    #[tokio::test]
    async fn test_empty_listing_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/trending"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"items": []})))
            .mount(&server)
            .await;

        let scout = HttpTrendScout::new(server.uri(), "key").unwrap();
        assert!(matches!(
            scout.trending().await,
            Err(GenError::EmptyResponse)
        ));
    }
}
