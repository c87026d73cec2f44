//! Shared data models for the autoshort producer.
//!
//! This crate provides Serde-serializable types for:
//! - Narration scripts and trending context
//! - Segments, timelines and the timing model
//! - Production assets and the canonical frame
//! - Production runs and their state machine states
//! - Scheduler configuration and status snapshots
//! - Encoding configuration

pub mod asset;
pub mod encoding;
pub mod run;
pub mod schedule;
pub mod script;
pub mod timeline;

// Re-export common types
pub use asset::{Asset, AssetKind, AssetSet, FrameSize};
pub use encoding::EncodingConfig;
pub use run::{ProductionRun, RunId, RunOutcome, RunRecord, RunState, Trigger};
pub use schedule::{ScheduleConfig, SchedulerStatus};
pub use script::{PublishMetadata, Script, TrendingContext};
pub use timeline::{Segment, Timeline, TimingConfig, TimingError, VisualKind};
