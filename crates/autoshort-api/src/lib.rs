//! Control surface for the autoshort producer.
//!
//! Thin axum layer over the scheduler and pipeline: health and
//! readiness probes, status, scheduler start/stop and the manual run
//! trigger.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::build_router;
pub use state::AppState;
