//! Segment timing model.
//!
//! Converts free-form narration text into an ordered, offset-annotated
//! sequence of timed segments. The conversion is pure: the same narration
//! and timing configuration always produce the same timeline, so asset
//! generation and assembly can be retried without re-deriving different
//! timings.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sentence terminators that delimit narration units.
const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Errors from timeline derivation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimingError {
    #[error("narration text contains no sentence-like units")]
    EmptyScript,
}

/// Timing configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct TimingConfig {
    /// Speech rate used to estimate segment durations
    pub words_per_minute: f64,

    /// Duration floor for very short units, in seconds
    pub min_segment_secs: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            words_per_minute: 150.0,
            min_segment_secs: 2.0,
        }
    }
}

/// Kind of visual cue backing a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VisualKind {
    /// Still image shown for the segment duration
    #[default]
    Image,
    /// Pre-rendered video clip
    Clip,
    /// Animated graphic
    MotionGraphic,
}

/// One timed narration unit paired with a visual cue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Segment {
    /// Position in the timeline, 0-based
    pub ordinal: usize,

    /// Narration text for this segment
    pub text: String,

    /// Estimated presentation duration in seconds
    pub estimated_duration_secs: f64,

    /// Kind of visual backing this segment
    #[serde(default)]
    pub visual_kind: VisualKind,

    /// Prompt for the visual generator; falls back to the segment text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual_prompt: Option<String>,
}

impl Segment {
    /// Prompt handed to the image synthesizer.
    pub fn prompt(&self) -> &str {
        self.visual_prompt.as_deref().unwrap_or(&self.text)
    }
}

/// Ordered, offset-annotated sequence of segments.
///
/// Invariant: start offsets are monotonically non-decreasing and
/// contiguous (`starts[i]` equals the sum of durations of segments
/// `0..i`), and the total duration is the sum of all segment durations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Timeline {
    segments: Vec<Segment>,
    starts: Vec<f64>,
}

impl Timeline {
    /// Derive a timeline from narration text.
    ///
    /// Narration is split into sentence-like units on `.`, `!` and `?`;
    /// empty units are discarded. Each unit's duration is estimated from
    /// the configured speech rate and clamped to the configured floor.
    pub fn from_narration(narration: &str, config: &TimingConfig) -> Result<Self, TimingError> {
        let units: Vec<&str> = narration
            .split(&SENTENCE_TERMINATORS[..])
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .collect();

        if units.is_empty() {
            return Err(TimingError::EmptyScript);
        }

        let mut segments = Vec::with_capacity(units.len());
        let mut starts = Vec::with_capacity(units.len());
        let mut cursor = 0.0f64;

        for (ordinal, unit) in units.into_iter().enumerate() {
            let words = unit.split_whitespace().count();
            let spoken = words as f64 / config.words_per_minute * 60.0;
            let duration = spoken.max(config.min_segment_secs);

            starts.push(cursor);
            segments.push(Segment {
                ordinal,
                text: unit.to_string(),
                estimated_duration_secs: duration,
                visual_kind: VisualKind::Image,
                visual_prompt: None,
            });
            cursor += duration;
        }

        Ok(Self { segments, starts })
    }

    /// Segments in presentation order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Start offset of a segment in seconds.
    pub fn start_of(&self, ordinal: usize) -> Option<f64> {
        self.starts.get(ordinal).copied()
    }

    /// Cumulative start offsets, parallel to [`Self::segments`].
    pub fn starts(&self) -> &[f64] {
        &self.starts
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True when the timeline holds no segments. Cannot happen for a
    /// timeline built by [`Self::from_narration`].
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Total presentation duration in seconds.
    pub fn total_duration_secs(&self) -> f64 {
        self.segments.iter().map(|s| s.estimated_duration_secs).sum()
    }
}
