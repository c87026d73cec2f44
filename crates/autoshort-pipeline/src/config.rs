//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use autoshort_models::{EncodingConfig, FrameSize, ScheduleConfig, TimingConfig};

/// End-to-end production configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Segment timing model settings
    pub timing: TimingConfig,
    /// Canonical output frame
    pub frame: FrameSize,
    /// Encoder settings
    pub encoding: EncodingConfig,
    /// Root directory for per-run workspaces
    pub workspace_root: PathBuf,
    /// Retention window for the stale-workspace sweep
    pub retention: Duration,
    /// Encoder timeout for one assembly
    pub assembly_timeout: Duration,
    /// Recurring schedule and quota
    pub schedule: ScheduleConfig,
    /// Scheduler tick interval
    pub tick_interval: Duration,
    /// Interval between stale-workspace sweeps
    pub sweep_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            frame: FrameSize::default(),
            encoding: EncodingConfig::default(),
            workspace_root: PathBuf::from("/tmp/autoshort"),
            retention: Duration::from_secs(7 * 24 * 3600),
            assembly_timeout: Duration::from_secs(600),
            schedule: ScheduleConfig::default(),
            tick_interval: Duration::from_secs(30),
            sweep_interval: Duration::from_secs(3600),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let timing = TimingConfig {
            words_per_minute: env_parse("TIMING_WORDS_PER_MINUTE", defaults.timing.words_per_minute),
            min_segment_secs: env_parse("TIMING_MIN_SEGMENT_SECS", defaults.timing.min_segment_secs),
        };

        let frame = FrameSize::new(
            env_parse("FRAME_WIDTH", defaults.frame.width),
            env_parse("FRAME_HEIGHT", defaults.frame.height),
        );

        let mut encoding = EncodingConfig::default();
        encoding.crf = env_parse("ENCODE_CRF", encoding.crf);
        encoding.fps = env_parse("ENCODE_FPS", encoding.fps);
        if let Ok(preset) = std::env::var("ENCODE_PRESET") {
            encoding.preset = preset;
        }

        let schedule = ScheduleConfig {
            fire_times: std::env::var("SCHEDULE_FIRE_TIMES")
                .map(|s| s.split(',').map(|t| t.trim().to_string()).collect())
                .unwrap_or(defaults.schedule.fire_times),
            daily_quota: env_parse("SCHEDULE_DAILY_QUOTA", defaults.schedule.daily_quota),
            count_failed_runs_toward_quota: env_parse(
                "SCHEDULE_COUNT_FAILED_RUNS",
                defaults.schedule.count_failed_runs_toward_quota,
            ),
            enabled: env_parse("SCHEDULE_ENABLED", defaults.schedule.enabled),
        };

        Self {
            timing,
            frame,
            encoding,
            workspace_root: std::env::var("WORKSPACE_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.workspace_root),
            retention: Duration::from_secs(
                env_parse("WORKSPACE_RETENTION_DAYS", 7u64) * 24 * 3600,
            ),
            assembly_timeout: Duration::from_secs(env_parse("ASSEMBLY_TIMEOUT_SECS", 600u64)),
            schedule,
            tick_interval: Duration::from_secs(env_parse("SCHEDULER_TICK_SECS", 30u64)),
            sweep_interval: Duration::from_secs(env_parse("SWEEP_INTERVAL_SECS", 3600u64)),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
