//! Persistence layer for run history

#[cfg(feature = "sqlite")]
pub mod store;

#[cfg(feature = "sqlite")]
pub use store::SqliteRunStore;

use crate::core::state::{RunReport, RunStatus};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Summary of one run, as stored in history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique run ID
    pub run_id: Uuid,

    /// Branch of the triggering event
    pub branch: String,

    /// Action of the triggering event (kebab-case)
    pub action: String,

    /// Overall status
    pub status: RunStatus,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run completed (if complete)
    pub completed_at: Option<DateTime<Utc>>,

    /// Number of pipelines that succeeded
    pub succeeded: usize,

    /// Number of pipelines that failed
    pub failed: usize,

    /// Number of pipelines that were skipped
    pub skipped: usize,

    /// Total number of planned pipelines
    pub total: usize,
}

/// Trait for persistence backends
#[async_trait::async_trait]
pub trait PersistenceBackend: Send + Sync {
    /// Save a run summary
    async fn save_run(&self, run: &RunSummary) -> Result<()>;

    /// Load a run by ID
    async fn load_run(&self, run_id: Uuid) -> Result<Option<RunSummary>>;

    /// List the most recent runs, newest first
    async fn list_runs(&self, limit: usize) -> Result<Vec<RunSummary>>;
}

/// In-memory persistence (for testing or ephemeral use)
pub struct InMemoryPersistence {
    runs: tokio::sync::RwLock<std::collections::HashMap<Uuid, RunSummary>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self {
            runs: tokio::sync::RwLock::new(std::collections::HashMap::new()),
        }
    }
}

impl Default for InMemoryPersistence {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PersistenceBackend for InMemoryPersistence {
    async fn save_run(&self, run: &RunSummary) -> Result<()> {
        let mut runs = self.runs.write().await;
        runs.insert(run.run_id, run.clone());
        Ok(())
    }

    async fn load_run(&self, run_id: Uuid) -> Result<Option<RunSummary>> {
        let runs = self.runs.read().await;
        Ok(runs.get(&run_id).cloned())
    }

    async fn list_runs(&self, limit: usize) -> Result<Vec<RunSummary>> {
        let runs = self.runs.read().await;
        let mut all: Vec<RunSummary> = runs.values().cloned().collect();
        all.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        all.truncate(limit);
        Ok(all)
    }
}

/// Create a summary from a finished run report
pub fn create_summary(report: &RunReport) -> RunSummary {
    RunSummary {
        run_id: report.run_id,
        branch: report.branch.clone(),
        action: report.action.to_string(),
        status: report.status,
        started_at: report.started_at,
        completed_at: report.completed_at,
        succeeded: report.succeeded_count(),
        failed: report.failed_count(),
        skipped: report.skipped_count(),
        total: report.results.len(),
    }
}
