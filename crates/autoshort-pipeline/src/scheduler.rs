//! Recurring scheduler and quota guard.
//!
//! Fires the production pipeline at fixed times of day, enforces the
//! runs-per-calendar-day quota, keeps a bounded history of recent
//! errors, and drives the periodic stale-workspace sweep. Time is read
//! through an injectable clock so day boundaries and fire times are
//! testable without wall-clock waits.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use autoshort_media::workspace::sweep_stale;
use autoshort_models::schedule::{SchedulerErrorEntry, RECENT_ERRORS_CAPACITY};
use autoshort_models::{RunId, RunRecord, SchedulerStatus, Trigger};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::ProductionPipeline;

/// Injectable time source.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Mutable scheduler bookkeeping.
struct SchedulerInner {
    /// Calendar day the quota counter belongs to
    day: NaiveDate,
    /// Runs counted against today's quota
    runs_today: u32,
    last_run_at: Option<DateTime<Utc>>,
    /// Last fire slot handled, so one slot fires at most once
    last_fired: Option<(NaiveDate, NaiveTime)>,
    total_success: u64,
    recent_errors: VecDeque<SchedulerErrorEntry>,
    last_sweep: Option<DateTime<Utc>>,
}

/// Everything the ticker task needs, shared between it and the
/// `Scheduler` facade.
struct SchedulerCore {
    config: PipelineConfig,
    pipeline: Arc<ProductionPipeline>,
    clock: Arc<dyn Clock>,
    inner: Mutex<SchedulerInner>,
}

impl SchedulerCore {
    /// One scheduler tick: roll the day counter, sweep stale
    /// workspaces, and fire the pipeline when a slot is due.
    async fn tick_once(&self) {
        let now = self.clock.now();
        self.maybe_sweep(now);

        if !self.claim_due_slot(now) {
            return;
        }

        {
            let mut inner = self.inner.lock().expect("scheduler poisoned");
            if inner.runs_today >= self.config.schedule.daily_quota {
                info!(
                    runs_today = inner.runs_today,
                    quota = self.config.schedule.daily_quota,
                    "Daily quota reached, skipping scheduled fire"
                );
                return;
            }
            inner.last_run_at = Some(now);
        }

        info!("Scheduled fire at {}", now);
        let result = self.pipeline.run_once(Trigger::Scheduled).await;
        self.record_outcome(Trigger::Scheduled, &result);
    }

    /// Roll the day if needed and claim the latest due fire slot.
    ///
    /// Returns true when a slot was due and not yet handled. The slot
    /// is marked handled before the run starts so a long run spanning
    /// several ticks fires once.
    fn claim_due_slot(&self, now: DateTime<Utc>) -> bool {
        let mut inner = self.inner.lock().expect("scheduler poisoned");

        let today = now.date_naive();
        if inner.day != today {
            info!(day = %today, "Calendar day rolled over, resetting quota counter");
            inner.day = today;
            inner.runs_today = 0;
        }

        let due = self
            .config
            .schedule
            .parsed_fire_times()
            .into_iter()
            .filter(|t| *t <= now.time())
            .next_back();

        let Some(slot_time) = due else {
            return false;
        };

        let slot = (today, slot_time);
        if inner.last_fired == Some(slot) {
            return false;
        }
        inner.last_fired = Some(slot);
        true
    }

    /// Record a run result in the quota counter, success counter and
    /// error ring buffer.
    fn record_outcome(&self, trigger: Trigger, result: &PipelineResult<RunRecord>) {
        let mut inner = self.inner.lock().expect("scheduler poisoned");
        let scheduled = trigger == Trigger::Scheduled;

        match result {
            Ok(_) => {
                inner.total_success += 1;
                if scheduled {
                    inner.runs_today += 1;
                }
            }
            Err(e) if e.is_already_running() => {
                // Idempotent rejection: nothing ran, nothing to count.
                info!("Trigger rejected: a run is already in progress");
            }
            Err(e) => {
                if scheduled && self.config.schedule.count_failed_runs_toward_quota {
                    inner.runs_today += 1;
                }
                push_error(&mut inner.recent_errors, self.clock.now(), e);
            }
        }
    }

    /// Sweep stale workspaces when the sweep interval elapsed.
    fn maybe_sweep(&self, now: DateTime<Utc>) {
        {
            let mut inner = self.inner.lock().expect("scheduler poisoned");
            let due = match inner.last_sweep {
                None => true,
                Some(last) => (now - last)
                    .to_std()
                    .map(|d| d >= self.config.sweep_interval)
                    .unwrap_or(true),
            };
            if !due {
                return;
            }
            inner.last_sweep = Some(now);
        }

        match sweep_stale(&self.config.workspace_root, self.config.retention) {
            Ok(0) => {}
            Ok(n) => info!("Swept {} stale workspace entries", n),
            Err(e) => warn!("Workspace sweep failed: {}", e),
        }
    }

    fn status(&self, is_active: bool) -> SchedulerStatus {
        let now = self.clock.now();
        let inner = self.inner.lock().expect("scheduler poisoned");
        SchedulerStatus {
            is_active,
            last_run_at: inner.last_run_at,
            next_fire_at: next_fire_at(now, &self.config.schedule.parsed_fire_times()),
            runs_today: inner.runs_today,
            total_success_count: inner.total_success,
            recent_errors: inner.recent_errors.iter().cloned().collect(),
        }
    }
}

/// The recurring scheduler.
///
/// Explicitly owned, no module-level state: tests instantiate
/// independent schedulers side by side.
pub struct Scheduler {
    core: Arc<SchedulerCore>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    shutdown: watch::Sender<bool>,
}

impl Scheduler {
    pub fn new(
        config: PipelineConfig,
        pipeline: Arc<ProductionPipeline>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        let day = clock.now().date_naive();

        Self {
            core: Arc::new(SchedulerCore {
                config,
                pipeline,
                clock,
                inner: Mutex::new(SchedulerInner {
                    day,
                    runs_today: 0,
                    last_run_at: None,
                    last_fired: None,
                    total_success: 0,
                    recent_errors: VecDeque::with_capacity(RECENT_ERRORS_CAPACITY),
                    last_sweep: None,
                }),
            }),
            ticker: Mutex::new(None),
            shutdown,
        }
    }

    /// Start the recurring ticker. Idempotent: starting an active
    /// scheduler reports the current state instead of erring.
    ///
    /// Returns true when this call started the scheduler.
    pub fn start(&self) -> bool {
        let mut ticker = self.ticker.lock().expect("scheduler poisoned");
        if ticker.is_some() {
            info!("Scheduler already active");
            return false;
        }

        let _ = self.shutdown.send(false);
        let mut shutdown_rx = self.shutdown.subscribe();
        let core = Arc::clone(&self.core);

        *ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(core.config.tick_interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        core.tick_once().await;
                    }
                }
            }
            info!("Scheduler ticker stopped");
        }));

        info!("Scheduler started");
        true
    }

    /// Stop the recurring ticker. Idempotent: stopping a stopped
    /// scheduler is a no-op.
    ///
    /// Returns true when this call stopped the scheduler. An in-flight
    /// run is not cancelled; only future fires stop.
    pub fn stop(&self) -> bool {
        let mut ticker = self.ticker.lock().expect("scheduler poisoned");
        match ticker.take() {
            Some(handle) => {
                let _ = self.shutdown.send(true);
                handle.abort();
                info!("Scheduler stopped");
                true
            }
            None => {
                info!("Scheduler already stopped");
                false
            }
        }
    }

    /// Whether the recurring ticker is active.
    pub fn is_active(&self) -> bool {
        self.ticker.lock().expect("scheduler poisoned").is_some()
    }

    /// Trigger a run now, outside the recurring cadence.
    ///
    /// Enters through the same pipeline guard as scheduled fires;
    /// whichever trigger arrives while idle proceeds and the other is
    /// rejected as already running, with no queueing. Manual runs do
    /// not count against the daily quota.
    pub fn trigger_now(&self) -> PipelineResult<RunId> {
        let (id, fut) = Arc::clone(&self.core.pipeline).prepare_run(Trigger::Manual)?;

        let core = Arc::clone(&self.core);
        tokio::spawn(async move {
            let result = fut.await;
            core.record_outcome(Trigger::Manual, &result);
        });

        Ok(id)
    }

    /// One scheduler tick, driven by the ticker task or by tests.
    pub async fn tick_once(&self) {
        self.core.tick_once().await;
    }

    /// Status snapshot for operators.
    pub fn status(&self) -> SchedulerStatus {
        self.core.status(self.is_active())
    }
}

/// Next fire instant strictly after `now`.
fn next_fire_at(now: DateTime<Utc>, times: &[NaiveTime]) -> Option<DateTime<Utc>> {
    if times.is_empty() {
        return None;
    }

    let today = now.date_naive();
    for t in times {
        if *t > now.time() {
            return Utc.from_local_datetime(&today.and_time(*t)).single();
        }
    }
    let tomorrow = today.succ_opt()?;
    Utc.from_local_datetime(&tomorrow.and_time(times[0])).single()
}

/// Push into the bounded ring buffer, evicting the oldest first.
fn push_error(
    errors: &mut VecDeque<SchedulerErrorEntry>,
    at: DateTime<Utc>,
    error: &PipelineError,
) {
    if errors.len() == RECENT_ERRORS_CAPACITY {
        errors.pop_front();
    }
    errors.push_back(SchedulerErrorEntry {
        at,
        message: error.to_string(),
    });
}
