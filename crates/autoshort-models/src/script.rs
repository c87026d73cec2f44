//! Narration scripts and the trending context they are generated from.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Snapshot of trending topics handed to the script generator.
///
/// The scoring that produced it is a collaborator concern; the pipeline
/// only carries it from the trend scout to the script generator.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct TrendingContext {
    /// Trending topic titles, most relevant first
    pub topics: Vec<String>,

    /// Tags associated with the trending topics
    #[serde(default)]
    pub tags: Vec<String>,

    /// Free-form category hint (e.g. "science", "history")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl TrendingContext {
    /// Context with a single topic, mostly useful for manual triggers.
    pub fn from_topic(topic: impl Into<String>) -> Self {
        Self {
            topics: vec![topic.into()],
            tags: Vec::new(),
            category: None,
        }
    }
}

/// A generated narration script.
///
/// Produced by the external text generator and immutable once handed to
/// the pipeline. Upstream output is untrusted: run [`Validate::validate`]
/// before using a deserialized script.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct Script {
    /// Video title
    #[validate(length(min = 1, max = 100))]
    pub title: String,

    /// Opening hook line
    #[serde(default)]
    pub hook: String,

    /// Full narration text, sentence-terminated
    #[validate(length(min = 1))]
    pub narration: String,

    /// Short caption rendered on the thumbnail
    #[serde(default)]
    pub thumbnail_caption: String,

    /// Tags for publishing
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Script {
    /// Full text to feed the voice synthesizer (hook + narration).
    pub fn spoken_text(&self) -> String {
        if self.hook.is_empty() {
            self.narration.clone()
        } else {
            format!("{} {}", self.hook, self.narration)
        }
    }
}

/// Metadata attached to a published video.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PublishMetadata {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl PublishMetadata {
    /// Build publish metadata from a script.
    pub fn from_script(script: &Script) -> Self {
        Self {
            title: script.title.clone(),
            description: script.hook.clone(),
            tags: script.tags.clone(),
        }
    }
}
