//! Production pipeline state machine.
//!
//! Drives one run end to end: trend discovery, scripting, asset
//! synthesis, assembly and publishing. At most one run is live at a
//! time, enforced by the entry guard; manual and scheduled triggers
//! share this single start path.

use std::sync::{Arc, RwLock};

use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tracing::warn;
use validator::Validate;

use autoshort_gen::{ImageSynthesizer, Publisher, ScriptGenerator, TrendScout, VoiceSynthesizer};
use autoshort_media::workspace::RunWorkspace;
use autoshort_models::{
    ProductionRun, PublishMetadata, RunId, RunRecord, RunState, Timeline, Trigger,
};

use crate::assembler::VideoAssembler;
use crate::config::PipelineConfig;
use crate::coordinator::AssetCoordinator;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::RunLogger;
use crate::retry::{retry_async, RetryConfig, RetryResult};
use crate::runlog::RunLogStore;

/// The external collaborators one run talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub trends: Arc<dyn TrendScout>,
    pub scripts: Arc<dyn ScriptGenerator>,
    pub voice: Arc<dyn VoiceSynthesizer>,
    pub images: Arc<dyn ImageSynthesizer>,
    pub publisher: Arc<dyn Publisher>,
}

/// Point-in-time view of the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineStatus {
    pub state: RunState,
    pub current_run: Option<ProductionRun>,
}

/// The production pipeline.
///
/// Explicitly owned and `Arc`-shared; tests instantiate independent
/// pipelines side by side.
pub struct ProductionPipeline {
    config: PipelineConfig,
    collaborators: Collaborators,
    coordinator: AssetCoordinator,
    assembler: Arc<dyn VideoAssembler>,
    run_log: Arc<dyn RunLogStore>,
    /// Entry guard: exactly one permit, held for the length of a run
    guard: Arc<Semaphore>,
    current: RwLock<Option<ProductionRun>>,
}

impl ProductionPipeline {
    pub fn new(
        config: PipelineConfig,
        collaborators: Collaborators,
        assembler: Arc<dyn VideoAssembler>,
        run_log: Arc<dyn RunLogStore>,
    ) -> Self {
        let coordinator = AssetCoordinator::new(
            Arc::clone(&collaborators.voice),
            Arc::clone(&collaborators.images),
            config.frame,
        );

        Self {
            config,
            collaborators,
            coordinator,
            assembler,
            run_log,
            guard: Arc::new(Semaphore::new(1)),
            current: RwLock::new(None),
        }
    }

    /// Run one production to completion.
    ///
    /// Returns `AlreadyRunning` without side effects when a run is in
    /// flight. Run failures are returned after the failure has been
    /// recorded and the workspace torn down.
    pub async fn run_once(&self, trigger: Trigger) -> PipelineResult<RunRecord> {
        let permit = self.try_enter()?;
        self.drive(permit, ProductionRun::start(trigger)).await
    }

    /// Reserve the pipeline and hand back the new run's ID plus the
    /// future that drives it to completion.
    ///
    /// The entry permit is acquired here, so a competing trigger is
    /// rejected immediately; the caller decides whether to await the
    /// run or detach it. The run itself goes through the same path as
    /// [`Self::run_once`].
    pub fn prepare_run(
        self: Arc<Self>,
        trigger: Trigger,
    ) -> PipelineResult<(
        RunId,
        impl std::future::Future<Output = PipelineResult<RunRecord>> + Send + 'static,
    )> {
        let permit = self.try_enter()?;
        let run = ProductionRun::start(trigger);
        let id = run.id.clone();

        Ok((id, async move { self.drive(permit, run).await }))
    }

    /// Current pipeline state; `Idle` when no run is live.
    pub fn state(&self) -> RunState {
        self.current
            .read()
            .expect("pipeline state poisoned")
            .as_ref()
            .map(|r| r.state)
            .unwrap_or(RunState::Idle)
    }

    /// Status snapshot for the control surface.
    pub fn status(&self) -> PipelineStatus {
        let current = self.current.read().expect("pipeline state poisoned").clone();
        PipelineStatus {
            state: current.as_ref().map(|r| r.state).unwrap_or(RunState::Idle),
            current_run: current,
        }
    }

    /// The run log this pipeline appends to.
    pub fn run_log(&self) -> &Arc<dyn RunLogStore> {
        &self.run_log
    }

    fn try_enter(&self) -> PipelineResult<OwnedSemaphorePermit> {
        match Arc::clone(&self.guard).try_acquire_owned() {
            Ok(permit) => Ok(permit),
            Err(TryAcquireError::NoPermits) => Err(PipelineError::AlreadyRunning),
            Err(TryAcquireError::Closed) => Err(PipelineError::AlreadyRunning),
        }
    }

    /// Execute a run while holding the entry permit, record the result,
    /// and return the pipeline to idle.
    async fn drive(
        &self,
        _permit: OwnedSemaphorePermit,
        mut run: ProductionRun,
    ) -> PipelineResult<RunRecord> {
        metrics::counter!("autoshort_runs_total").increment(1);
        self.set_current(Some(run.clone()));

        let result = self.execute(&mut run).await;

        if let Err(ref e) = result {
            run.fail(e.to_string());
            self.set_current(Some(run.clone()));
            RunLogger::new(&run.id, run.state.as_str()).log_error(&e.to_string());
            metrics::counter!("autoshort_runs_failed_total").increment(1);
        } else {
            metrics::counter!("autoshort_runs_succeeded_total").increment(1);
        }

        let record = RunRecord::from_run(&run);
        if let Err(e) = self.run_log.append(record.clone()).await {
            // Observability only; a run never fails on run-log errors.
            warn!(run_id = %run.id, "Failed to append run record: {}", e);
        }

        self.set_current(None);

        result.map(|()| record)
    }

    /// The stage sequence. Each stage transition is driven by the
    /// successful completion of the corresponding collaborator or
    /// component call; the first failure aborts, and the workspace is
    /// dropped on every path out of this function.
    async fn execute(&self, run: &mut ProductionRun) -> PipelineResult<()> {
        let logger = RunLogger::new(&run.id, "hunting");
        logger.log_start(&format!("triggered ({:?})", run.trigger));

        let context = self
            .collaborators
            .trends
            .trending()
            .await
            .map_err(|e| PipelineError::scripting(format!("trend discovery failed: {}", e)))?;
        self.advance(run);

        let logger = logger.stage("scripting");
        let script = self
            .collaborators
            .scripts
            .generate(&context)
            .await
            .map_err(|e| PipelineError::scripting(e.to_string()))?;
        script
            .validate()
            .map_err(|e| PipelineError::scripting(format!("malformed script: {}", e)))?;

        let timeline = Timeline::from_narration(&script.narration, &self.config.timing)?;
        logger.log_progress(&format!(
            "\"{}\": {} segments, {:.1}s",
            script.title,
            timeline.len(),
            timeline.total_duration_secs()
        ));
        self.advance(run);

        let logger = logger.stage("asset_generation");
        let workspace = RunWorkspace::create(&self.config.workspace_root, run.id.as_str())?;
        let assets = self
            .coordinator
            .synthesize(&script, &timeline, &workspace)
            .await?;
        logger.log_progress(&format!(
            "{} visuals ({} fallback)",
            assets.visuals.len(),
            assets.fallback_visual_count()
        ));
        self.advance(run);

        let logger = logger.stage("assembling");
        let output = self
            .assembler
            .assemble(&assets, &timeline, &workspace.output_path())
            .await
            .map_err(PipelineError::assembly)?;
        run.produced_video = Some(output.clone());
        self.advance(run);

        let logger = logger.stage("publishing");
        let metadata = PublishMetadata::from_script(&script);
        let retry = RetryConfig::new("publish").with_max_retries(2);
        let published = match retry_async(&retry, || {
            self.collaborators.publisher.publish(&output, &metadata)
        })
        .await
        {
            RetryResult::Success(id) => id,
            RetryResult::Failed { error, attempts } => {
                logger.log_warning(&format!("publish failed after {} attempts", attempts));
                return Err(PipelineError::Publish(error));
            }
        };
        run.published_id = Some(published.clone());
        self.advance(run);

        logger.log_completion(&format!("published as {}", published));
        Ok(())
    }

    fn advance(&self, run: &mut ProductionRun) {
        run.advance();
        self.set_current(Some(run.clone()));
    }

    fn set_current(&self, run: Option<ProductionRun>) {
        *self.current.write().expect("pipeline state poisoned") = run;
    }
}
