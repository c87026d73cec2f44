//! Production assets and the canonical frame.

use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default canonical frame: 9:16 portrait.
pub const DEFAULT_FRAME_WIDTH: u32 = 1080;
pub const DEFAULT_FRAME_HEIGHT: u32 = 1920;

/// The fixed output dimensions all visuals are normalized to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl Default for FrameSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_FRAME_WIDTH,
            height: DEFAULT_FRAME_HEIGHT,
        }
    }
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width:height ratio.
    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl std::fmt::Display for FrameSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Kind of a production asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// Narration audio for the whole run
    AudioTrack,
    /// Per-segment visual, normalized to the canonical frame
    Visual,
    /// Thumbnail image
    Thumbnail,
    /// Subtitle cue file
    SubtitleCue,
}

/// One asset produced for a run, stored inside the run workspace.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Asset {
    /// Ordinal of the segment this asset belongs to; audio and thumbnail
    /// assets use 0
    pub segment_ordinal: usize,

    /// Asset kind
    pub kind: AssetKind,

    /// Location inside the run workspace
    pub path: PathBuf,

    /// Dimensions after normalization, for visuals and thumbnails
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<FrameSize>,

    /// Whether this asset is a locally rendered fallback
    #[serde(default)]
    pub is_fallback: bool,
}

impl Asset {
    pub fn audio(path: PathBuf) -> Self {
        Self {
            segment_ordinal: 0,
            kind: AssetKind::AudioTrack,
            path,
            dimensions: None,
            is_fallback: false,
        }
    }

    pub fn visual(segment_ordinal: usize, path: PathBuf, dimensions: FrameSize) -> Self {
        Self {
            segment_ordinal,
            kind: AssetKind::Visual,
            path,
            dimensions: Some(dimensions),
            is_fallback: false,
        }
    }

    pub fn thumbnail(path: PathBuf, dimensions: FrameSize) -> Self {
        Self {
            segment_ordinal: 0,
            kind: AssetKind::Thumbnail,
            path,
            dimensions: Some(dimensions),
            is_fallback: false,
        }
    }

    pub fn subtitles(path: PathBuf) -> Self {
        Self {
            segment_ordinal: 0,
            kind: AssetKind::SubtitleCue,
            path,
            dimensions: None,
            is_fallback: false,
        }
    }

    /// Mark this asset as a locally rendered fallback.
    pub fn as_fallback(mut self) -> Self {
        self.is_fallback = true;
        self
    }
}

/// The validated set of assets handed to the assembly engine.
///
/// Holds exactly one audio track and a non-empty, ordinal-ordered visual
/// sequence; thumbnail and subtitles are optional.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AssetSet {
    pub audio: Asset,
    pub visuals: Vec<Asset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<Asset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitles: Option<Asset>,
}

impl AssetSet {
    /// Number of visuals that came back as fallbacks.
    pub fn fallback_visual_count(&self) -> usize {
        self.visuals.iter().filter(|v| v.is_fallback).count()
    }
}
