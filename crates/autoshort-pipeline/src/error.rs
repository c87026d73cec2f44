//! Pipeline error types.

use thiserror::Error;

use autoshort_gen::GenError;
use autoshort_media::MediaError;
use autoshort_models::TimingError;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that end a production run.
///
/// Per-segment visual synthesis failures never appear here: they are
/// recovered locally with fallback substitution.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("narration script is empty")]
    EmptyScript,

    #[error("scripting failed: {0}")]
    Scripting(String),

    #[error("voice synthesis failed: {0}")]
    VoiceSynthesis(#[source] GenError),

    #[error("all visual synthesis calls failed")]
    NoVisualAssets,

    #[error("assembly failed: {message}")]
    Assembly {
        message: String,
        /// Encoder diagnostic, when the encoder produced one
        diagnostic: Option<String>,
    },

    #[error("publish failed: {0}")]
    Publish(#[source] GenError),

    /// Idempotent rejection, not a true error: a run was requested while
    /// another run holds the pipeline.
    #[error("a production run is already in progress")]
    AlreadyRunning,

    #[error("media error: {0}")]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TimingError> for PipelineError {
    fn from(e: TimingError) -> Self {
        match e {
            TimingError::EmptyScript => Self::EmptyScript,
        }
    }
}

impl PipelineError {
    /// Create a scripting error.
    pub fn scripting(msg: impl Into<String>) -> Self {
        Self::Scripting(msg.into())
    }

    /// Wrap an assembly-stage failure, attaching the encoder diagnostic.
    pub fn assembly(e: MediaError) -> Self {
        Self::Assembly {
            diagnostic: e.encoder_diagnostic().map(str::to_string),
            message: e.to_string(),
        }
    }

    /// True for the idempotent "already running" rejection.
    pub fn is_already_running(&self) -> bool {
        matches!(self, Self::AlreadyRunning)
    }

    /// True when the run produced a video but failed to publish it.
    pub fn is_publish_failure(&self) -> bool {
        matches!(self, Self::Publish(_))
    }
}
