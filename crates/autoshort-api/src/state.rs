//! Application state.

use std::sync::Arc;

use autoshort_pipeline::{ProductionPipeline, Scheduler};

use crate::config::ApiConfig;

/// Shared application state.
///
/// Explicitly constructed and injected into the router; no module-level
/// singletons, so tests can stand up independent instances in parallel.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: Arc<ProductionPipeline>,
    pub scheduler: Arc<Scheduler>,
}

impl AppState {
    pub fn new(
        config: ApiConfig,
        pipeline: Arc<ProductionPipeline>,
        scheduler: Arc<Scheduler>,
    ) -> Self {
        Self {
            config,
            pipeline,
            scheduler,
        }
    }
}
