//! Asset synthesis coordination.
//!
//! Fans out to the external generators for one run: a single audio call
//! for the whole narration and one concurrent visual call per segment.
//! The fallback-vs-fatal decision lives here, in one policy table, not
//! in the clients.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use autoshort_gen::{ImageSynthesizer, VoiceSynthesizer};
use autoshort_media::workspace::RunWorkspace;
use autoshort_media::{cues_from_timeline, normalize_image, render_fallback_thumbnail, render_fallback_visual, write_srt};
use autoshort_models::{Asset, AssetKind, AssetSet, FrameSize, Script, Timeline};

use crate::error::{PipelineError, PipelineResult};

/// What a synthesis failure does to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// The run cannot continue without this asset
    Fatal,
    /// Substitute a locally rendered fallback and continue
    Fallback,
}

/// Failure policy per asset kind.
///
/// Narration is the one asset a video cannot exist without; everything
/// else degrades. The one exception is encoded separately: a run where
/// every visual failed is aborted by the coordinator itself.
pub fn policy_for(kind: AssetKind) -> FailurePolicy {
    match kind {
        AssetKind::AudioTrack => FailurePolicy::Fatal,
        AssetKind::Visual => FailurePolicy::Fallback,
        AssetKind::Thumbnail => FailurePolicy::Fallback,
        AssetKind::SubtitleCue => FailurePolicy::Fallback,
    }
}

/// Coordinates per-run asset synthesis.
pub struct AssetCoordinator {
    voice: Arc<dyn VoiceSynthesizer>,
    images: Arc<dyn ImageSynthesizer>,
    frame: FrameSize,
}

impl AssetCoordinator {
    pub fn new(
        voice: Arc<dyn VoiceSynthesizer>,
        images: Arc<dyn ImageSynthesizer>,
        frame: FrameSize,
    ) -> Self {
        Self {
            voice,
            images,
            frame,
        }
    }

    /// Produce the full asset set for a run inside its workspace.
    ///
    /// Visual requests run concurrently; the audio request is a single
    /// call. Returns `VoiceSynthesis` when audio fails and
    /// `NoVisualAssets` when every visual call failed.
    pub async fn synthesize(
        &self,
        script: &Script,
        timeline: &Timeline,
        workspace: &RunWorkspace,
    ) -> PipelineResult<AssetSet> {
        let audio = self.synthesize_audio(script, workspace).await?;
        let visuals = self.synthesize_visuals(timeline, workspace).await?;
        let thumbnail = self.synthesize_thumbnail(script, workspace).await;
        let subtitles = self.write_subtitles(timeline, workspace).await;

        Ok(AssetSet {
            audio,
            visuals,
            thumbnail,
            subtitles,
        })
    }

    async fn synthesize_audio(
        &self,
        script: &Script,
        workspace: &RunWorkspace,
    ) -> PipelineResult<Asset> {
        debug_assert_eq!(policy_for(AssetKind::AudioTrack), FailurePolicy::Fatal);

        let bytes = self
            .voice
            .synthesize(&script.spoken_text())
            .await
            .map_err(PipelineError::VoiceSynthesis)?;

        let path = workspace.audio_path();
        tokio::fs::write(&path, &bytes).await?;
        info!("Narration audio written ({} bytes)", bytes.len());

        Ok(Asset::audio(path))
    }

    async fn synthesize_visuals(
        &self,
        timeline: &Timeline,
        workspace: &RunWorkspace,
    ) -> PipelineResult<Vec<Asset>> {
        debug_assert_eq!(policy_for(AssetKind::Visual), FailurePolicy::Fallback);

        let requests = timeline.segments().iter().map(|segment| {
            let path = workspace.visual_path(segment.ordinal);
            async move {
                let result = self.images.synthesize(segment.prompt(), self.frame).await;
                let synthesized = match result {
                    Ok(bytes) => normalize_image(&bytes, self.frame, &path)
                        .map(|dims| Asset::visual(segment.ordinal, path.clone(), dims))
                        .map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                };

                match synthesized {
                    Ok(asset) => asset,
                    Err(reason) => {
                        warn!(
                            segment = segment.ordinal,
                            "Visual synthesis failed, substituting fallback: {}", reason
                        );
                        // Placeholder rendering is local and cannot fail
                        // for a well-formed frame; if it somehow does,
                        // the asset is dropped and counted as failed.
                        match render_fallback_visual(segment.ordinal, self.frame, &path) {
                            Ok(dims) => {
                                Asset::visual(segment.ordinal, path.clone(), dims).as_fallback()
                            }
                            Err(e) => {
                                warn!(segment = segment.ordinal, "Fallback rendering failed: {}", e);
                                Asset {
                                    segment_ordinal: segment.ordinal,
                                    kind: AssetKind::Visual,
                                    path,
                                    dimensions: None,
                                    is_fallback: true,
                                }
                            }
                        }
                    }
                }
            }
        });

        let visuals: Vec<Asset> = join_all(requests).await;

        // A narrated video with zero real visuals is not a valid output.
        let usable = visuals.iter().filter(|v| v.path.exists()).count();
        let fallbacks = visuals.iter().filter(|v| v.is_fallback).count();
        if usable == 0 || fallbacks == visuals.len() {
            return Err(PipelineError::NoVisualAssets);
        }

        if fallbacks > 0 {
            warn!(
                "{} of {} visuals degraded to fallbacks",
                fallbacks,
                visuals.len()
            );
        }

        // Assembly cycles the last visual over any missing slots, so a
        // visual whose fallback also failed to render is dropped here.
        Ok(visuals.into_iter().filter(|v| v.path.exists()).collect())
    }

    async fn synthesize_thumbnail(&self, script: &Script, workspace: &RunWorkspace) -> Option<Asset> {
        debug_assert_eq!(policy_for(AssetKind::Thumbnail), FailurePolicy::Fallback);

        let prompt = if script.thumbnail_caption.is_empty() {
            script.title.clone()
        } else {
            format!("{}: {}", script.title, script.thumbnail_caption)
        };

        let path = workspace.thumbnail_path();
        match self.images.synthesize(&prompt, self.frame).await {
            Ok(bytes) => match normalize_image(&bytes, self.frame, &path) {
                Ok(dims) => return Some(Asset::thumbnail(path, dims)),
                Err(e) => warn!("Thumbnail normalization failed: {}", e),
            },
            Err(e) => warn!("Thumbnail synthesis failed: {}", e),
        }

        render_fallback_thumbnail(self.frame, &path)
            .ok()
            .map(|dims| Asset::thumbnail(path, dims).as_fallback())
    }

    async fn write_subtitles(&self, timeline: &Timeline, workspace: &RunWorkspace) -> Option<Asset> {
        debug_assert_eq!(policy_for(AssetKind::SubtitleCue), FailurePolicy::Fallback);

        let cues = cues_from_timeline(timeline);
        let path = workspace.subtitles_path();
        match write_srt(&cues, &path).await {
            Ok(()) => Some(Asset::subtitles(path)),
            Err(e) => {
                warn!("Subtitle cue writing failed, continuing without: {}", e);
                None
            }
        }
    }
}
