//! Control surface handlers.
//!
//! Each endpoint maps 1:1 onto a scheduler or pipeline operation.
//! "Already running" is an idempotent no-op reported with a success
//! status; genuine failures get error statuses.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use autoshort_media::{check_ffmpeg, check_ffprobe};
use autoshort_models::{ProductionRun, RunRecord, SchedulerStatus};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

/// Liveness probe.
pub async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Readiness probe: the encoder toolchain must be present.
pub async fn readyz() -> ApiResult<Json<HealthResponse>> {
    check_ffmpeg().map_err(|e| ApiError::not_ready(e.to_string()))?;
    check_ffprobe().map_err(|e| ApiError::not_ready(e.to_string()))?;
    Ok(Json(HealthResponse { status: "ready" }))
}

#[derive(Serialize)]
pub struct StatusResponse {
    pipeline_state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_run: Option<ProductionRun>,
    scheduler: SchedulerStatus,
}

/// Combined pipeline and scheduler status.
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let pipeline = state.pipeline.status();
    Json(StatusResponse {
        pipeline_state: pipeline.state.to_string(),
        current_run: pipeline.current_run,
        scheduler: state.scheduler.status(),
    })
}

#[derive(Serialize)]
pub struct SchedulerToggleResponse {
    active: bool,
    changed: bool,
}

/// Start the scheduler. Starting an active scheduler is a no-op.
pub async fn scheduler_start(State(state): State<AppState>) -> Json<SchedulerToggleResponse> {
    let changed = state.scheduler.start();
    Json(SchedulerToggleResponse {
        active: true,
        changed,
    })
}

/// Stop the scheduler. Stopping a stopped scheduler is a no-op.
pub async fn scheduler_stop(State(state): State<AppState>) -> Json<SchedulerToggleResponse> {
    let changed = state.scheduler.stop();
    Json(SchedulerToggleResponse {
        active: false,
        changed,
    })
}

#[derive(Serialize)]
pub struct TriggerResponse {
    started: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    run_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

/// Trigger a run now.
pub async fn trigger_run(State(state): State<AppState>) -> ApiResult<Json<TriggerResponse>> {
    match state.scheduler.trigger_now() {
        Ok(id) => Ok(Json(TriggerResponse {
            started: true,
            run_id: Some(id.to_string()),
            reason: None,
        })),
        Err(e) if e.is_already_running() => Ok(Json(TriggerResponse {
            started: false,
            run_id: None,
            reason: Some("already running".to_string()),
        })),
        Err(e) => Err(e.into()),
    }
}

#[derive(Deserialize)]
pub struct RecentQuery {
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    20
}

/// Most recent run records, newest first.
pub async fn recent_runs(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> ApiResult<Json<Vec<RunRecord>>> {
    let records = state
        .pipeline
        .run_log()
        .recent(query.limit.min(100))
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(Json(records))
}
