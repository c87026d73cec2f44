#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper and media assembly engine.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with multi-input support
//! - Progress parsing from `-progress pipe:2`
//! - A declarative compose graph rendered to encoder arguments
//! - The assembly engine (concat, scale/pad, mux, subtitle embedding)
//! - Visual normalization and fallback placeholder rendering
//! - Per-run workspaces with guaranteed teardown and a stale sweep

pub mod assemble;
pub mod command;
pub mod error;
pub mod graph;
pub mod normalize;
pub mod placeholder;
pub mod probe;
pub mod subtitles;
pub mod thumbnail;
pub mod workspace;

pub use assemble::{assemble_video, visual_durations, AssemblySettings};
pub use command::{check_ffmpeg, check_ffprobe, EncodeProgress, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use graph::{ComposeGraph, VisualInput};
pub use normalize::normalize_image;
pub use placeholder::{render_fallback_thumbnail, render_fallback_visual};
pub use probe::{get_duration, probe_media, MediaInfo};
pub use subtitles::{cues_from_timeline, write_srt, SubtitleCue};
pub use thumbnail::extract_preview;
pub use workspace::{sweep_stale, RunWorkspace};
