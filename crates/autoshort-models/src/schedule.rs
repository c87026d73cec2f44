//! Scheduler configuration and status snapshots.

use chrono::{DateTime, NaiveTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Capacity of the recent-errors ring buffer.
pub const RECENT_ERRORS_CAPACITY: usize = 10;

/// Recurring schedule and quota configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScheduleConfig {
    /// UTC times of day at which the scheduler fires, "HH:MM"
    pub fire_times: Vec<String>,

    /// Maximum runs per calendar day
    pub daily_quota: u32,

    /// Whether failed runs count toward the daily quota.
    /// When true, quota accounting is run-count based; when false it is
    /// success-count based.
    #[serde(default = "default_count_failed")]
    pub count_failed_runs_toward_quota: bool,

    /// Whether the scheduler starts enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_count_failed() -> bool {
    true
}

fn default_enabled() -> bool {
    true
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            fire_times: vec!["09:00".to_string(), "15:00".to_string(), "21:00".to_string()],
            daily_quota: 3,
            count_failed_runs_toward_quota: true,
            enabled: true,
        }
    }
}

impl ScheduleConfig {
    /// Parse the configured fire times, discarding malformed entries.
    pub fn parsed_fire_times(&self) -> Vec<NaiveTime> {
        let mut times: Vec<NaiveTime> = self
            .fire_times
            .iter()
            .filter_map(|t| NaiveTime::parse_from_str(t, "%H:%M").ok())
            .collect();
        times.sort();
        times
    }
}

/// One entry in the scheduler's bounded error history.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SchedulerErrorEntry {
    pub at: DateTime<Utc>,
    pub message: String,
}

/// Point-in-time snapshot of the scheduler, for operators.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SchedulerStatus {
    /// Whether the recurring trigger is active
    pub is_active: bool,

    /// When the last run started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<DateTime<Utc>>,

    /// Next scheduled fire, when active
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_fire_at: Option<DateTime<Utc>>,

    /// Runs counted against today's quota
    pub runs_today: u32,

    /// Successful productions since process start
    pub total_success_count: u64,

    /// Most recent errors, oldest first, capacity 10
    pub recent_errors: Vec<SchedulerErrorEntry>,
}
