//! Control surface behavior against a stubbed pipeline.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use autoshort_api::{build_router, ApiConfig, AppState};
use autoshort_gen::{
    GenResult, ImageSynthesizer, Publisher, ScriptGenerator, TrendScout, VoiceSynthesizer,
};
use autoshort_media::MediaResult;
use autoshort_models::{
    AssetSet, FrameSize, PublishMetadata, Script, Timeline, TrendingContext,
};
use autoshort_pipeline::{
    Clock, Collaborators, InMemoryRunLog, PipelineConfig, ProductionPipeline, Scheduler,
    VideoAssembler,
};

struct StubTrends;

#[async_trait]
impl TrendScout for StubTrends {
    async fn trending(&self) -> GenResult<TrendingContext> {
        Ok(TrendingContext::from_topic("a topic"))
    }
}

struct StubScripts;

#[async_trait]
impl ScriptGenerator for StubScripts {
    async fn generate(&self, _context: &TrendingContext) -> GenResult<Script> {
        Ok(Script {
            title: "Title".to_string(),
            hook: String::new(),
            narration: "Hello world. This is a test.".to_string(),
            thumbnail_caption: String::new(),
            tags: Vec::new(),
        })
    }
}

/// Slow enough that a second trigger lands mid-run.
struct SlowVoice;

#[async_trait]
impl VoiceSynthesizer for SlowVoice {
    async fn synthesize(&self, _text: &str) -> GenResult<Vec<u8>> {
        tokio::time::sleep(Duration::from_millis(300)).await;
        Ok(b"ID3fakeaudio".to_vec())
    }
}

struct StubImages;

#[async_trait]
impl ImageSynthesizer for StubImages {
    async fn synthesize(&self, _prompt: &str, _target: FrameSize) -> GenResult<Vec<u8>> {
        let img = image::RgbaImage::from_pixel(16, 16, image::Rgba([1, 1, 1, 255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Png,
            )
            .unwrap();
        Ok(bytes)
    }
}

struct StubPublisher;

#[async_trait]
impl Publisher for StubPublisher {
    async fn publish(&self, _media_file: &Path, _metadata: &PublishMetadata) -> GenResult<String> {
        Ok("vid-1".to_string())
    }
}

struct StubAssembler;

#[async_trait]
impl VideoAssembler for StubAssembler {
    async fn assemble(
        &self,
        _assets: &AssetSet,
        _timeline: &Timeline,
        output: &Path,
    ) -> MediaResult<std::path::PathBuf> {
        std::fs::write(output, b"video")?;
        Ok(output.to_path_buf())
    }
}

struct FrozenClock;

impl Clock for FrozenClock {
    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::Utc::now()
    }
}

fn test_state(tmp: &tempfile::TempDir) -> AppState {
    let config = PipelineConfig {
        frame: FrameSize::new(32, 64),
        workspace_root: tmp.path().join("work"),
        ..PipelineConfig::default()
    };

    let collaborators = Collaborators {
        trends: Arc::new(StubTrends),
        scripts: Arc::new(StubScripts),
        voice: Arc::new(SlowVoice),
        images: Arc::new(StubImages),
        publisher: Arc::new(StubPublisher),
    };

    let pipeline = Arc::new(ProductionPipeline::new(
        config.clone(),
        collaborators,
        Arc::new(StubAssembler),
        Arc::new(InMemoryRunLog::new()),
    ));
    let scheduler = Arc::new(Scheduler::new(config, Arc::clone(&pipeline), Arc::new(FrozenClock)));

    AppState::new(ApiConfig::default(), pipeline, scheduler)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn healthz_answers_ok() {
    let tmp = tempfile::tempdir().unwrap();
    let router = build_router(test_state(&tmp));

    let response = router
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn status_reports_idle_pipeline() {
    let tmp = tempfile::tempdir().unwrap();
    let router = build_router(test_state(&tmp));

    let response = router
        .oneshot(Request::get("/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["pipeline_state"], "idle");
    assert_eq!(json["scheduler"]["is_active"], false);
}

#[tokio::test]
async fn second_trigger_reports_already_running_with_success_status() {
    let tmp = tempfile::tempdir().unwrap();
    let router = build_router(test_state(&tmp));

    let first = router
        .clone()
        .oneshot(Request::post("/run/trigger").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first_json = body_json(first).await;
    assert_eq!(first_json["started"], true);
    assert!(first_json["run_id"].is_string());

    // The run is still inside the slow voice call.
    let second = router
        .oneshot(Request::post("/run/trigger").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK, "no-op, not an error");
    let second_json = body_json(second).await;
    assert_eq!(second_json["started"], false);
    assert_eq!(second_json["reason"], "already running");
}

#[tokio::test]
async fn scheduler_endpoints_are_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let router = build_router(test_state(&tmp));

    let start = router
        .clone()
        .oneshot(Request::post("/scheduler/start").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(start).await;
    assert_eq!(json["active"], true);
    assert_eq!(json["changed"], true);

    let again = router
        .clone()
        .oneshot(Request::post("/scheduler/start").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(again).await;
    assert_eq!(json["active"], true);
    assert_eq!(json["changed"], false);

    let stop = router
        .clone()
        .oneshot(Request::post("/scheduler/stop").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(stop).await;
    assert_eq!(json["changed"], true);

    let stop_again = router
        .oneshot(Request::post("/scheduler/stop").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(stop_again).await;
    assert_eq!(json["changed"], false);
}

#[tokio::test]
async fn recent_runs_starts_empty() {
    let tmp = tempfile::tempdir().unwrap();
    let router = build_router(test_state(&tmp));

    let response = router
        .oneshot(Request::get("/runs/recent?limit=5").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 0);
}
