//! End-to-end pipeline behavior against collaborator doubles.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use autoshort_gen::{
    GenError, GenResult, ImageSynthesizer, Publisher, ScriptGenerator, TrendScout,
    VoiceSynthesizer,
};
use autoshort_media::{MediaError, MediaResult};
use autoshort_models::{
    AssetSet, FrameSize, PublishMetadata, RunOutcome, RunState, ScheduleConfig, Script, Timeline,
    TimingConfig, TrendingContext, Trigger,
};
use autoshort_pipeline::{
    Clock, Collaborators, InMemoryRunLog, PipelineConfig, PipelineError, ProductionPipeline,
    RunLogStore, Scheduler, VideoAssembler,
};

#[derive(Clone, Copy, PartialEq)]
enum ImagesMode {
    Ok,
    FailAll,
    FailFirst(usize),
}

#[derive(Clone, Copy)]
struct Behavior {
    fail_trends: bool,
    fail_script: bool,
    /// Narration with terminators but no sentence content
    blank_narration: bool,
    fail_voice: bool,
    voice_delay_ms: u64,
    images: ImagesMode,
    fail_assembly: bool,
    fail_publish: bool,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            fail_trends: false,
            fail_script: false,
            blank_narration: false,
            fail_voice: false,
            voice_delay_ms: 0,
            images: ImagesMode::Ok,
            fail_assembly: false,
            fail_publish: false,
        }
    }
}

struct StubTrends(Behavior);

#[async_trait]
impl TrendScout for StubTrends {
    async fn trending(&self) -> GenResult<TrendingContext> {
        if self.0.fail_trends {
            return Err(GenError::api(502, "platform down"));
        }
        Ok(TrendingContext::from_topic("lunar recession"))
    }
}

struct StubScripts(Behavior);

#[async_trait]
impl ScriptGenerator for StubScripts {
    async fn generate(&self, _context: &TrendingContext) -> GenResult<Script> {
        if self.0.fail_script {
            return Err(GenError::malformed("no json"));
        }
        let narration = if self.0.blank_narration {
            "...".to_string()
        } else {
            "Hello world. This is a test.".to_string()
        };
        Ok(Script {
            title: "The Moon Is Leaving".to_string(),
            hook: String::new(),
            narration,
            thumbnail_caption: "MOON".to_string(),
            tags: vec!["space".to_string()],
        })
    }
}

struct StubVoice(Behavior);

#[async_trait]
impl VoiceSynthesizer for StubVoice {
    async fn synthesize(&self, _text: &str) -> GenResult<Vec<u8>> {
        if self.0.voice_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.0.voice_delay_ms)).await;
        }
        if self.0.fail_voice {
            return Err(GenError::api(500, "tts down"));
        }
        Ok(b"ID3fakeaudio".to_vec())
    }
}

struct StubImages {
    mode: ImagesMode,
    calls: AtomicUsize,
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(32, 32, image::Rgba([9, 9, 9, 255]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();
    bytes
}

#[async_trait]
impl ImageSynthesizer for StubImages {
    async fn synthesize(&self, _prompt: &str, _target: FrameSize) -> GenResult<Vec<u8>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let fail = match self.mode {
            ImagesMode::Ok => false,
            ImagesMode::FailAll => true,
            ImagesMode::FailFirst(n) => call < n,
        };
        if fail {
            Err(GenError::api(500, "image service down"))
        } else {
            Ok(png_bytes())
        }
    }
}

struct StubPublisher(Behavior);

#[async_trait]
impl Publisher for StubPublisher {
    async fn publish(&self, media_file: &Path, _metadata: &PublishMetadata) -> GenResult<String> {
        if self.0.fail_publish {
            return Err(GenError::api(401, "token expired"));
        }
        assert!(
            media_file.exists(),
            "produced file must exist until publish succeeds"
        );
        Ok("vid-123".to_string())
    }
}

/// Records what reached assembly and writes a fake output file.
struct StubAssembler {
    fail: bool,
    seen: Mutex<Option<(usize, usize)>>,
}

#[async_trait]
impl VideoAssembler for StubAssembler {
    async fn assemble(
        &self,
        assets: &AssetSet,
        _timeline: &Timeline,
        output: &Path,
    ) -> MediaResult<PathBuf> {
        *self.seen.lock().unwrap() =
            Some((assets.visuals.len(), assets.fallback_visual_count()));
        if self.fail {
            return Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some("x264 [error]: cannot open encoder".to_string()),
                Some(1),
            ));
        }
        std::fs::write(output, b"video")?;
        Ok(output.to_path_buf())
    }
}

struct World {
    pipeline: Arc<ProductionPipeline>,
    run_log: Arc<InMemoryRunLog>,
    assembler: Arc<StubAssembler>,
    workspace_root: PathBuf,
    _tmp: tempfile::TempDir,
}

fn build_world(behavior: Behavior) -> World {
    let tmp = tempfile::tempdir().unwrap();
    let workspace_root = tmp.path().join("work");

    let config = PipelineConfig {
        timing: TimingConfig {
            words_per_minute: 150.0,
            min_segment_secs: 2.0,
        },
        frame: FrameSize::new(64, 128),
        workspace_root: workspace_root.clone(),
        ..PipelineConfig::default()
    };

    let collaborators = Collaborators {
        trends: Arc::new(StubTrends(behavior)),
        scripts: Arc::new(StubScripts(behavior)),
        voice: Arc::new(StubVoice(behavior)),
        images: Arc::new(StubImages {
            mode: behavior.images,
            calls: AtomicUsize::new(0),
        }),
        publisher: Arc::new(StubPublisher(behavior)),
    };

    let run_log = Arc::new(InMemoryRunLog::new());
    let assembler = Arc::new(StubAssembler {
        fail: behavior.fail_assembly,
        seen: Mutex::new(None),
    });

    let pipeline = Arc::new(ProductionPipeline::new(
        config,
        collaborators,
        Arc::clone(&assembler) as Arc<dyn VideoAssembler>,
        Arc::clone(&run_log) as Arc<dyn RunLogStore>,
    ));

    World {
        pipeline,
        run_log,
        assembler,
        workspace_root,
        _tmp: tmp,
    }
}

fn assert_no_residue(root: &Path) {
    if root.exists() {
        let leftovers: Vec<_> = std::fs::read_dir(root).unwrap().collect();
        assert!(leftovers.is_empty(), "residual files: {:?}", leftovers);
    }
}

#[tokio::test]
async fn successful_run_publishes_and_cleans_up() {
    let world = build_world(Behavior::default());

    let record = world.pipeline.run_once(Trigger::Manual).await.unwrap();
    assert_eq!(record.outcome, RunOutcome::Published);
    assert_eq!(record.trigger, Trigger::Manual);
    assert!(record.error.is_none());

    assert_eq!(world.pipeline.state(), RunState::Idle);
    assert_no_residue(&world.workspace_root);

    let recent = world.run_log.recent(10).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].run_id, record.run_id);

    // Two segments from "Hello world. This is a test.", no fallbacks.
    assert_eq!(*world.assembler.seen.lock().unwrap(), Some((2, 0)));
}

#[tokio::test]
async fn second_trigger_is_rejected_while_running() {
    let world = build_world(Behavior {
        voice_delay_ms: 300,
        ..Behavior::default()
    });

    let pipeline = Arc::clone(&world.pipeline);
    let first = tokio::spawn(async move { pipeline.run_once(Trigger::Scheduled).await });

    // Let the first run reach the slow voice call.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_ne!(world.pipeline.state(), RunState::Idle);

    let second = world.pipeline.run_once(Trigger::Manual).await;
    match second {
        Err(e) => assert!(e.is_already_running()),
        Ok(_) => panic!("second run must be rejected"),
    }

    let record = first.await.unwrap().unwrap();
    assert_eq!(record.outcome, RunOutcome::Published);

    // The rejection neither ran nor corrupted anything.
    assert_eq!(world.run_log.recent(10).await.unwrap().len(), 1);
    assert_no_residue(&world.workspace_root);
}

#[tokio::test]
async fn failure_at_every_stage_tears_down_and_returns_to_idle() {
    let cases: Vec<(&str, Behavior)> = vec![
        (
            "hunting",
            Behavior {
                fail_trends: true,
                ..Behavior::default()
            },
        ),
        (
            "scripting",
            Behavior {
                fail_script: true,
                ..Behavior::default()
            },
        ),
        (
            "timing",
            Behavior {
                blank_narration: true,
                ..Behavior::default()
            },
        ),
        (
            "voice",
            Behavior {
                fail_voice: true,
                ..Behavior::default()
            },
        ),
        (
            "visuals",
            Behavior {
                images: ImagesMode::FailAll,
                ..Behavior::default()
            },
        ),
        (
            "assembly",
            Behavior {
                fail_assembly: true,
                ..Behavior::default()
            },
        ),
        (
            "publish",
            Behavior {
                fail_publish: true,
                ..Behavior::default()
            },
        ),
    ];

    for (stage, behavior) in cases {
        let world = build_world(behavior);
        let result = world.pipeline.run_once(Trigger::Scheduled).await;
        assert!(result.is_err(), "stage {} must fail the run", stage);

        assert_eq!(
            world.pipeline.state(),
            RunState::Idle,
            "stage {} must return to idle",
            stage
        );
        assert_no_residue(&world.workspace_root);

        let recent = world.run_log.recent(10).await.unwrap();
        assert_eq!(recent.len(), 1, "stage {} must append a record", stage);
        assert!(recent[0].error.is_some());

        // Failures are not sticky: the next run proceeds normally.
        let retry = world.pipeline.run_once(Trigger::Scheduled).await;
        assert!(retry.is_err(), "same stage fails again for {}", stage);
        assert_eq!(world.pipeline.state(), RunState::Idle);
    }
}

#[tokio::test]
async fn error_variants_match_the_failing_stage() {
    let world = build_world(Behavior {
        blank_narration: true,
        ..Behavior::default()
    });
    assert!(matches!(
        world.pipeline.run_once(Trigger::Manual).await,
        Err(PipelineError::EmptyScript)
    ));

    let world = build_world(Behavior {
        fail_voice: true,
        ..Behavior::default()
    });
    assert!(matches!(
        world.pipeline.run_once(Trigger::Manual).await,
        Err(PipelineError::VoiceSynthesis(_))
    ));

    let world = build_world(Behavior {
        images: ImagesMode::FailAll,
        ..Behavior::default()
    });
    assert!(matches!(
        world.pipeline.run_once(Trigger::Manual).await,
        Err(PipelineError::NoVisualAssets)
    ));

    let world = build_world(Behavior {
        fail_assembly: true,
        ..Behavior::default()
    });
    match world.pipeline.run_once(Trigger::Manual).await {
        Err(PipelineError::Assembly { diagnostic, .. }) => {
            assert!(diagnostic.unwrap().contains("x264"));
        }
        other => panic!("expected assembly error, got {:?}", other.map(|r| r.outcome)),
    }
}

#[tokio::test]
async fn partial_visual_failure_still_assembles_with_fallbacks() {
    let world = build_world(Behavior {
        images: ImagesMode::FailFirst(1),
        ..Behavior::default()
    });

    let record = world.pipeline.run_once(Trigger::Scheduled).await.unwrap();
    assert_eq!(record.outcome, RunOutcome::Published);

    let (visuals, fallbacks) = world.assembler.seen.lock().unwrap().unwrap();
    assert_eq!(visuals, 2);
    assert_eq!(fallbacks, 1);
}

#[tokio::test]
async fn publish_failure_is_recorded_as_produced_only() {
    let world = build_world(Behavior {
        fail_publish: true,
        ..Behavior::default()
    });

    let result = world.pipeline.run_once(Trigger::Scheduled).await;
    match result {
        Err(e) => assert!(e.is_publish_failure()),
        Ok(_) => panic!("publish failure must surface"),
    }

    let recent = world.run_log.recent(10).await.unwrap();
    assert_eq!(recent[0].outcome, RunOutcome::ProducedOnly);
    assert_no_residue(&world.workspace_root);
}

// ---------------------------------------------------------------------------
// Scheduler behavior with a manual clock
// ---------------------------------------------------------------------------

struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    fn starting_at(t: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self(Mutex::new(t)))
    }

    fn set(&self, t: DateTime<Utc>) {
        *self.0.lock().unwrap() = t;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

fn scheduler_world(
    behavior: Behavior,
    quota: u32,
    count_failed: bool,
    clock: Arc<ManualClock>,
) -> (Arc<Scheduler>, World) {
    let world = build_world(behavior);

    let config = PipelineConfig {
        workspace_root: world.workspace_root.clone(),
        schedule: ScheduleConfig {
            fire_times: vec!["09:00".to_string(), "15:00".to_string(), "21:00".to_string()],
            daily_quota: quota,
            count_failed_runs_toward_quota: count_failed,
            enabled: true,
        },
        ..PipelineConfig::default()
    };

    let scheduler = Arc::new(Scheduler::new(
        config,
        Arc::clone(&world.pipeline),
        clock as Arc<dyn Clock>,
    ));
    (scheduler, world)
}

#[tokio::test]
async fn quota_skips_fires_until_day_boundary() {
    let clock = ManualClock::starting_at(utc(2024, 3, 10, 9, 0));
    let (scheduler, world) =
        scheduler_world(Behavior::default(), 2, true, Arc::clone(&clock));

    // Two slots, two runs.
    scheduler.tick_once().await;
    clock.set(utc(2024, 3, 10, 15, 0));
    scheduler.tick_once().await;
    assert_eq!(world.run_log.recent(10).await.unwrap().len(), 2);
    assert_eq!(scheduler.status().runs_today, 2);

    // Quota of 2 reached: the third slot is skipped without a run.
    clock.set(utc(2024, 3, 10, 21, 0));
    scheduler.tick_once().await;
    assert_eq!(world.run_log.recent(10).await.unwrap().len(), 2);
    assert_eq!(world.pipeline.state(), RunState::Idle);

    // Day boundary resets the counter and fires proceed again.
    clock.set(utc(2024, 3, 11, 9, 0));
    scheduler.tick_once().await;
    assert_eq!(world.run_log.recent(10).await.unwrap().len(), 3);
    assert_eq!(scheduler.status().runs_today, 1);
}

#[tokio::test]
async fn one_slot_fires_at_most_once() {
    let clock = ManualClock::starting_at(utc(2024, 3, 10, 9, 0));
    let (scheduler, world) =
        scheduler_world(Behavior::default(), 10, true, Arc::clone(&clock));

    scheduler.tick_once().await;
    // Several ticks inside the same slot window.
    clock.set(utc(2024, 3, 10, 9, 1));
    scheduler.tick_once().await;
    clock.set(utc(2024, 3, 10, 9, 2));
    scheduler.tick_once().await;

    assert_eq!(world.run_log.recent(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn failed_runs_count_toward_quota_when_configured() {
    let behavior = Behavior {
        fail_assembly: true,
        ..Behavior::default()
    };

    // Run-count accounting: the failed 09:00 run consumes the quota.
    let clock = ManualClock::starting_at(utc(2024, 3, 10, 9, 0));
    let (scheduler, world) = scheduler_world(behavior, 1, true, Arc::clone(&clock));
    scheduler.tick_once().await;
    clock.set(utc(2024, 3, 10, 15, 0));
    scheduler.tick_once().await;
    assert_eq!(world.run_log.recent(10).await.unwrap().len(), 1);
    assert_eq!(scheduler.status().runs_today, 1);

    // Success-count accounting: failures do not consume the quota.
    let clock = ManualClock::starting_at(utc(2024, 3, 10, 9, 0));
    let (scheduler, world) = scheduler_world(behavior, 1, false, Arc::clone(&clock));
    scheduler.tick_once().await;
    clock.set(utc(2024, 3, 10, 15, 0));
    scheduler.tick_once().await;
    assert_eq!(world.run_log.recent(10).await.unwrap().len(), 2);
    assert_eq!(scheduler.status().runs_today, 0);
    assert_eq!(scheduler.status().recent_errors.len(), 2);
}

#[tokio::test]
async fn scheduler_start_and_stop_are_idempotent() {
    let clock = ManualClock::starting_at(utc(2024, 3, 10, 8, 0));
    let (scheduler, _world) =
        scheduler_world(Behavior::default(), 3, true, Arc::clone(&clock));

    assert!(!scheduler.is_active());
    assert!(scheduler.start());
    assert!(!scheduler.start(), "second start is a no-op");
    assert!(scheduler.is_active());

    assert!(scheduler.stop());
    assert!(!scheduler.stop(), "second stop is a no-op");
    assert!(!scheduler.is_active());

    // Restart works after a stop.
    assert!(scheduler.start());
    scheduler.stop();
}

#[tokio::test]
async fn manual_trigger_reports_success_but_skips_quota() {
    let clock = ManualClock::starting_at(utc(2024, 3, 10, 8, 0));
    let (scheduler, _world) =
        scheduler_world(Behavior::default(), 3, true, Arc::clone(&clock));

    let id = scheduler.trigger_now().unwrap();
    assert!(!id.as_str().is_empty());

    // Wait for the detached run to finish and its outcome to be recorded.
    let mut tries = 0;
    while scheduler.status().total_success_count == 0 && tries < 100 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        tries += 1;
    }

    let status = scheduler.status();
    assert_eq!(status.total_success_count, 1);
    assert_eq!(status.runs_today, 0, "manual runs do not consume quota");
}

#[tokio::test]
async fn next_fire_is_reported_in_status() {
    let clock = ManualClock::starting_at(utc(2024, 3, 10, 10, 0));
    let (scheduler, _world) =
        scheduler_world(Behavior::default(), 3, true, Arc::clone(&clock));

    let next = scheduler.status().next_fire_at.unwrap();
    assert_eq!(next, utc(2024, 3, 10, 15, 0));
}
