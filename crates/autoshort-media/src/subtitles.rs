//! Subtitle cue generation.
//!
//! Cues are derived from the timeline and written as SRT, to be embedded
//! by the compose graph as a separate text stream rather than burned
//! into pixels.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

use autoshort_models::Timeline;

use crate::error::MediaResult;

/// One subtitle cue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleCue {
    /// 1-based SRT index
    pub index: usize,
    pub start_secs: f64,
    pub end_secs: f64,
    pub text: String,
}

/// Derive one cue per timeline segment.
pub fn cues_from_timeline(timeline: &Timeline) -> Vec<SubtitleCue> {
    timeline
        .segments()
        .iter()
        .map(|segment| {
            let start = timeline.start_of(segment.ordinal).unwrap_or(0.0);
            SubtitleCue {
                index: segment.ordinal + 1,
                start_secs: start,
                end_secs: start + segment.estimated_duration_secs,
                text: segment.text.clone(),
            }
        })
        .collect()
}

/// Write cues as an SRT file.
pub async fn write_srt(cues: &[SubtitleCue], dest: impl AsRef<Path>) -> MediaResult<()> {
    let mut out = String::new();
    for cue in cues {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            cue.index,
            format_srt_timestamp(cue.start_secs),
            format_srt_timestamp(cue.end_secs),
            cue.text
        ));
    }
    fs::write(dest, out).await?;
    Ok(())
}

/// Format seconds as an SRT timestamp (HH:MM:SS,mmm).
fn format_srt_timestamp(secs: f64) -> String {
    let total_ms = (secs.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let s = (total_ms / 1000) % 60;
    let m = (total_ms / 60_000) % 60;
    let h = total_ms / 3_600_000;
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}
