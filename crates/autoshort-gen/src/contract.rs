//! Collaborator contracts.
//!
//! Each external service the pipeline depends on sits behind one of
//! these traits, so orchestration code can be exercised against doubles
//! and the fallback-vs-fatal decision stays out of the clients.

use std::path::Path;

use async_trait::async_trait;

use autoshort_models::{FrameSize, PublishMetadata, Script, TrendingContext};

use crate::error::GenResult;

/// Discovers the trending context a script is generated from.
#[async_trait]
pub trait TrendScout: Send + Sync {
    async fn trending(&self) -> GenResult<TrendingContext>;
}

/// Generates a narration script from trending context.
#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    async fn generate(&self, context: &TrendingContext) -> GenResult<Script>;
}

/// Synthesizes narration audio for the full script text.
#[async_trait]
pub trait VoiceSynthesizer: Send + Sync {
    /// Returns encoded audio bytes (mp3).
    async fn synthesize(&self, text: &str) -> GenResult<Vec<u8>>;
}

/// Synthesizes one visual for a segment prompt.
#[async_trait]
pub trait ImageSynthesizer: Send + Sync {
    /// Returns encoded image bytes at roughly `target` size; callers
    /// normalize to the canonical frame regardless.
    async fn synthesize(&self, prompt: &str, target: FrameSize) -> GenResult<Vec<u8>>;
}

/// Uploads a produced video to the hosting platform.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Returns the identifier assigned by the platform.
    async fn publish(&self, media_file: &Path, metadata: &PublishMetadata) -> GenResult<String>;
}
