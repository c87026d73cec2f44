//! Run-log persistence contract.
//!
//! Append-only observability rows; never required for the correctness
//! of a run. The managed store behind the JSONL file (or any other
//! backend) is an external concern.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::warn;

use autoshort_models::RunRecord;

use crate::error::PipelineResult;

/// Append-only run log.
#[async_trait]
pub trait RunLogStore: Send + Sync {
    /// Append one record.
    async fn append(&self, record: RunRecord) -> PipelineResult<()>;

    /// Most recent records, newest first, up to `limit`.
    async fn recent(&self, limit: usize) -> PipelineResult<Vec<RunRecord>>;
}

/// In-memory run log, for tests and single-process deployments.
#[derive(Default)]
pub struct InMemoryRunLog {
    records: Mutex<Vec<RunRecord>>,
}

impl InMemoryRunLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RunLogStore for InMemoryRunLog {
    async fn append(&self, record: RunRecord) -> PipelineResult<()> {
        self.records.lock().expect("run log poisoned").push(record);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> PipelineResult<Vec<RunRecord>> {
        let records = self.records.lock().expect("run log poisoned");
        Ok(records.iter().rev().take(limit).cloned().collect())
    }
}

/// File-backed run log, one JSON record per line.
pub struct JsonlRunLog {
    path: PathBuf,
}

impl JsonlRunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RunLogStore for JsonlRunLog {
    async fn append(&self, record: RunRecord) -> PipelineResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut line = serde_json::to_string(&record).map_err(std::io::Error::other)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        Ok(())
    }

    async fn recent(&self, limit: usize) -> PipelineResult<Vec<RunRecord>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records: Vec<RunRecord> = Vec::new();
        for line in content.lines() {
            match serde_json::from_str(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping malformed run-log line: {}", e),
            }
        }

        records.reverse();
        records.truncate(limit);
        Ok(records)
    }
}
