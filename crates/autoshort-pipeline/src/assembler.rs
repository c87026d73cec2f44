//! Assembly seam between the pipeline and the media engine.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use autoshort_media::{assemble_video, AssemblySettings, MediaResult};
use autoshort_models::{AssetSet, Timeline};

/// Turns an asset set into one output media file.
///
/// The pipeline drives this trait so orchestration can be exercised
/// without a real encoder.
#[async_trait]
pub trait VideoAssembler: Send + Sync {
    async fn assemble(
        &self,
        assets: &AssetSet,
        timeline: &Timeline,
        output: &Path,
    ) -> MediaResult<PathBuf>;
}

/// The real assembler, backed by the FFmpeg compose graph.
pub struct FfmpegAssembler {
    settings: AssemblySettings,
}

impl FfmpegAssembler {
    pub fn new(settings: AssemblySettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl VideoAssembler for FfmpegAssembler {
    async fn assemble(
        &self,
        assets: &AssetSet,
        timeline: &Timeline,
        output: &Path,
    ) -> MediaResult<PathBuf> {
        assemble_video(assets, timeline, output, &self.settings).await
    }
}
