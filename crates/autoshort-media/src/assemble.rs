//! Media assembly engine.
//!
//! Composes a validated asset set (audio track + ordered normalized
//! visuals + optional subtitle cues) into one muxed output file through a
//! deterministic compose graph. Assembly never performs content-aware
//! scaling decisions, only geometry: visuals arrive already normalized to
//! the canonical frame.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, warn};

use autoshort_models::{AssetSet, EncodingConfig, FrameSize, Timeline};

use crate::command::FfmpegRunner;
use crate::error::{MediaError, MediaResult};
use crate::graph::{ComposeGraph, VisualInput};

/// Extensions treated as still images; anything else is fed as a clip.
const STILL_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Assembly engine settings.
#[derive(Debug, Clone)]
pub struct AssemblySettings {
    pub frame: FrameSize,
    pub encoding: EncodingConfig,
    /// Encoder timeout; a hung encode must not pin the pipeline
    pub timeout_secs: u64,
}

impl Default for AssemblySettings {
    fn default() -> Self {
        Self {
            frame: FrameSize::default(),
            encoding: EncodingConfig::default(),
            timeout_secs: 600,
        }
    }
}

/// Compose the asset set into `output`.
///
/// Screen time follows the timeline: each visual is shown for its
/// segment's estimated duration, and when fewer visuals than segments are
/// available the last visual absorbs the remaining screen time. The
/// output duration is the shorter of the visual stream and the audio
/// track.
///
/// On failure no partial output file is left behind.
pub async fn assemble_video(
    assets: &AssetSet,
    timeline: &Timeline,
    output: impl AsRef<Path>,
    settings: &AssemblySettings,
) -> MediaResult<PathBuf> {
    let output = output.as_ref();

    if assets.visuals.is_empty() {
        return Err(MediaError::EmptyVisualSequence);
    }
    if !assets.audio.path.exists() {
        return Err(MediaError::AudioTrackMissing(assets.audio.path.clone()));
    }

    let durations = visual_durations(timeline, assets.visuals.len());

    let mut graph = ComposeGraph::new(settings.frame, settings.encoding.fps, &assets.audio.path);
    for (asset, duration) in assets.visuals.iter().zip(&durations) {
        if is_still(&asset.path) {
            graph.push_visual(VisualInput::still(&asset.path, *duration));
        } else {
            graph.push_visual(VisualInput::clip(&asset.path, *duration));
        }
    }
    if let Some(ref subs) = assets.subtitles {
        graph = graph.with_subtitles(&subs.path);
    }

    info!(
        visuals = assets.visuals.len(),
        fallbacks = assets.fallback_visual_count(),
        visual_secs = graph.visual_duration_secs(),
        "Assembling {}",
        output.display()
    );

    // The output ends with the shorter stream; a large mismatch between
    // the visual schedule and the narration means an upstream timing
    // problem worth surfacing before it truncates the result.
    if let Ok(info) = crate::probe::probe_media(&assets.audio.path).await {
        let drift = graph.visual_duration_secs() - info.duration;
        if drift.abs() > 2.0 {
            warn!(
                visual_secs = graph.visual_duration_secs(),
                audio_secs = info.duration,
                "Visual schedule and narration length disagree; output will be truncated"
            );
        }
    }

    let cmd = graph.to_command(output, &settings.encoding);
    let started = Instant::now();

    let result = FfmpegRunner::new()
        .with_timeout(settings.timeout_secs)
        .run(&cmd)
        .await;

    if let Err(e) = result {
        // A failed run must leave no output artifact visible downstream.
        if output.exists() {
            if let Err(rm) = std::fs::remove_file(output) {
                warn!("Failed to remove partial output {}: {}", output.display(), rm);
            }
        }
        metrics::counter!("autoshort_assembly_failures_total").increment(1);
        return Err(e);
    }

    if !output.exists() {
        return Err(MediaError::InvalidVideo(format!(
            "encoder reported success but produced no file: {}",
            output.display()
        )));
    }

    metrics::histogram!("autoshort_assembly_seconds").record(started.elapsed().as_secs_f64());
    info!("Assembled {}", output.display());

    Ok(output.to_path_buf())
}

/// Screen time per available visual, in timeline order.
///
/// With as many visuals as segments this is the segment durations. With
/// fewer visuals, the last one stands in for every remaining segment and
/// absorbs their combined duration. Surplus visuals get no screen time
/// and are dropped by the caller's zip.
pub fn visual_durations(timeline: &Timeline, visual_count: usize) -> Vec<f64> {
    let segments = timeline.segments();
    if visual_count == 0 || segments.is_empty() {
        return Vec::new();
    }

    let shown = visual_count.min(segments.len());
    let mut durations: Vec<f64> = segments[..shown]
        .iter()
        .map(|s| s.estimated_duration_secs)
        .collect();

    for segment in &segments[shown..] {
        if let Some(last) = durations.last_mut() {
            *last += segment.estimated_duration_secs;
        }
    }

    durations
}

fn is_still(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| STILL_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
