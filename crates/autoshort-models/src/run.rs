//! Production runs and their state machine.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a production run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a new random run ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What caused a run to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Fired by the recurring scheduler
    #[default]
    Scheduled,
    /// Requested through the control surface
    Manual,
}

/// Pipeline state of a production run.
///
/// `Idle` is both the initial state and the state the pipeline returns to
/// after a terminal state is recorded. A new run may only start from
/// `Idle`; `Failed` is reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// No run in flight
    #[default]
    Idle,
    /// Discovering trending context
    Hunting,
    /// Generating and validating the script
    Scripting,
    /// Synthesizing audio, visuals and thumbnail
    AssetGeneration,
    /// Composing the output media file
    Assembling,
    /// Uploading the produced file
    Publishing,
    /// Terminal success
    Completed,
    /// Terminal failure
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Hunting => "hunting",
            RunState::Scripting => "scripting",
            RunState::AssetGeneration => "asset_generation",
            RunState::Assembling => "assembling",
            RunState::Publishing => "publishing",
            RunState::Completed => "completed",
            RunState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }

    /// The state a run advances to when the current stage succeeds.
    pub fn next(&self) -> Option<RunState> {
        match self {
            RunState::Idle => Some(RunState::Hunting),
            RunState::Hunting => Some(RunState::Scripting),
            RunState::Scripting => Some(RunState::AssetGeneration),
            RunState::AssetGeneration => Some(RunState::Assembling),
            RunState::Assembling => Some(RunState::Publishing),
            RunState::Publishing => Some(RunState::Completed),
            RunState::Completed | RunState::Failed => None,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One end-to-end execution of the pipeline for one video.
///
/// Owned exclusively by the production pipeline; at most one live
/// instance exists at a time.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProductionRun {
    /// Unique run ID
    pub id: RunId,

    /// Current pipeline state
    pub state: RunState,

    /// What started this run
    pub trigger: Trigger,

    /// Start timestamp
    pub started_at: DateTime<Utc>,

    /// Completion timestamp, terminal states only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Path of the produced media file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub produced_video: Option<PathBuf>,

    /// Identifier assigned by the publisher
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_id: Option<String>,

    /// Last recorded error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl ProductionRun {
    /// Start a new run in the `Hunting` state.
    pub fn start(trigger: Trigger) -> Self {
        Self {
            id: RunId::new(),
            state: RunState::Hunting,
            trigger,
            started_at: Utc::now(),
            completed_at: None,
            produced_video: None,
            published_id: None,
            last_error: None,
        }
    }

    /// Advance to the next stage after the current one succeeded.
    pub fn advance(&mut self) {
        if let Some(next) = self.state.next() {
            self.state = next;
            if next == RunState::Completed {
                self.completed_at = Some(Utc::now());
            }
        }
    }

    /// Record a failure and move to the terminal `Failed` state.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.state = RunState::Failed;
        self.last_error = Some(error.into());
        self.completed_at = Some(Utc::now());
    }

    /// Outcome for the run log.
    ///
    /// A run that produced a video but failed to publish it is recorded
    /// as `ProducedOnly`, distinct from a production failure.
    pub fn outcome(&self) -> RunOutcome {
        if self.published_id.is_some() {
            RunOutcome::Published
        } else if self.produced_video.is_some() {
            RunOutcome::ProducedOnly
        } else {
            RunOutcome::Failed
        }
    }
}

/// Terminal outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Produced and published
    Published,
    /// Produced but publishing failed
    ProducedOnly,
    /// Production failed
    Failed,
}

/// Append-only run-log row, persisted for observability only.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RunRecord {
    pub run_id: RunId,
    pub outcome: RunOutcome,
    pub trigger: Trigger,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunRecord {
    /// Build a record from a terminal run.
    pub fn from_run(run: &ProductionRun) -> Self {
        Self {
            run_id: run.id.clone(),
            outcome: run.outcome(),
            trigger: run.trigger,
            started_at: run.started_at,
            completed_at: run.completed_at.unwrap_or_else(Utc::now),
            error: run.last_error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_order() {
        let mut state = RunState::Idle;
        let expected = [
            RunState::Hunting,
            RunState::Scripting,
            RunState::AssetGeneration,
            RunState::Assembling,
            RunState::Publishing,
            RunState::Completed,
        ];
        for want in expected {
            state = state.next().unwrap();
            assert_eq!(state, want);
        }
        assert!(state.next().is_none());
        assert!(RunState::Failed.next().is_none());
    }

    #[test]
    fn test_run_advances_to_completed() {
        let mut run = ProductionRun::start(Trigger::Manual);
        assert_eq!(run.state, RunState::Hunting);

        while !run.state.is_terminal() {
            run.advance();
        }
        assert_eq!(run.state, RunState::Completed);
        assert!(run.completed_at.is_some());
    }

    #[test]
    fn test_failure_is_terminal_and_recorded() {
        let mut run = ProductionRun::start(Trigger::Scheduled);
        run.advance(); // Scripting
        run.fail("voice synthesis unavailable");

        assert_eq!(run.state, RunState::Failed);
        assert_eq!(run.outcome(), RunOutcome::Failed);
        assert!(run.completed_at.is_some());

        let record = RunRecord::from_run(&run);
        assert_eq!(record.outcome, RunOutcome::Failed);
        assert_eq!(record.error.as_deref(), Some("voice synthesis unavailable"));
    }

    #[test]
    fn test_outcome_distinguishes_publish_failure() {
        let mut run = ProductionRun::start(Trigger::Manual);
        while run.state != RunState::Publishing {
            run.advance();
        }
        run.produced_video = Some(PathBuf::from("out.mp4"));
        run.advance();

        // Completed without a published id: produced but not published.
        assert_eq!(run.outcome(), RunOutcome::ProducedOnly);

        run.published_id = Some("vid-123".to_string());
        assert_eq!(run.outcome(), RunOutcome::Published);
    }
}
