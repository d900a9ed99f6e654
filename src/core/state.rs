//! Execution state and result models

use crate::core::event::Action;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a pipeline within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStatus {
    /// Pipeline has not started
    Pending,
    /// Pipeline is currently running
    Running,
    /// Every step succeeded
    Succeeded,
    /// A step failed; later steps were not run
    Failed,
    /// Never ran because a dependency did not succeed (or the run was cancelled)
    Skipped,
}

impl PipelineStatus {
    /// Check if the pipeline is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineStatus::Succeeded | PipelineStatus::Failed | PipelineStatus::Skipped
        )
    }
}

/// Status of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    /// Every command exited zero
    Succeeded,
    /// A command exited non-zero, errored, or timed out
    Failed,
    /// Not run because an earlier step failed
    Skipped,
}

/// Result of running one step, finalized exactly once
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    /// Step name (for reporting)
    pub name: String,

    /// Terminal status
    pub status: StepStatus,

    /// Exit code of the last command run (0 on success, the failing code otherwise)
    pub exit_code: Option<i32>,

    /// Captured stdout of the commands run so far
    pub stdout: String,

    /// Captured stderr of the commands run so far
    pub stderr: String,

    /// Runner-level error (spawn failure, timeout), if any
    pub error: Option<String>,

    /// When the step started
    pub started_at: Option<DateTime<Utc>>,

    /// When the step reached its terminal state
    pub completed_at: Option<DateTime<Utc>>,
}

impl StepResult {
    /// A step that was never run because an earlier step failed
    pub fn skipped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: StepStatus::Skipped,
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            error: None,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn is_succeeded(&self) -> bool {
        self.status == StepStatus::Succeeded
    }

    pub fn is_failed(&self) -> bool {
        self.status == StepStatus::Failed
    }
}

/// Result of running one pipeline, finalized exactly once
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Pipeline name
    pub name: String,

    /// Terminal status
    pub status: PipelineStatus,

    /// Per-step results, in declaration order
    pub steps: Vec<StepResult>,

    /// Name of the step that failed, if any
    pub failed_step: Option<String>,

    /// Why the pipeline was skipped, if it was
    pub skip_reason: Option<String>,

    /// When execution started
    pub started_at: Option<DateTime<Utc>>,

    /// When execution reached its terminal state
    pub completed_at: Option<DateTime<Utc>>,
}

impl PipelineResult {
    /// A pipeline that never started
    pub fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: PipelineStatus::Skipped,
            steps: Vec::new(),
            failed_step: None,
            skip_reason: Some(reason.into()),
            started_at: None,
            completed_at: Some(Utc::now()),
        }
    }

    pub fn is_succeeded(&self) -> bool {
        self.status == PipelineStatus::Succeeded
    }

    pub fn is_failed(&self) -> bool {
        self.status == PipelineStatus::Failed
    }

    pub fn is_skipped(&self) -> bool {
        self.status == PipelineStatus::Skipped
    }

    /// Get a step result by name
    pub fn step(&self, name: &str) -> Option<&StepResult> {
        self.steps.iter().find(|s| s.name == name)
    }
}

/// Overall status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    /// Every planned pipeline succeeded
    Succeeded,
    /// At least one pipeline failed or was skipped
    Failed,
}

/// The structured report for one run invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique run ID
    pub run_id: Uuid,

    /// Branch of the triggering event
    pub branch: String,

    /// Action of the triggering event
    pub action: Action,

    /// Overall status
    pub status: RunStatus,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run completed
    pub completed_at: Option<DateTime<Utc>>,

    /// Per-pipeline results, in plan order
    pub results: Vec<PipelineResult>,
}

impl RunReport {
    /// Create a report for a run that is about to start
    pub fn new(branch: impl Into<String>, action: Action) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            branch: branch.into(),
            action,
            status: RunStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
            results: Vec::new(),
        }
    }

    /// Seal the report: the run is over, no further writes
    pub fn finalize(&mut self) {
        self.completed_at = Some(Utc::now());
        self.status = if self.results.iter().all(|r| r.is_succeeded()) {
            RunStatus::Succeeded
        } else {
            RunStatus::Failed
        };
    }

    /// Get a pipeline result by name
    pub fn result(&self, name: &str) -> Option<&PipelineResult> {
        self.results.iter().find(|r| r.name == name)
    }

    pub fn succeeded_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_succeeded()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_failed()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_skipped()).count()
    }

    /// True when every planned pipeline succeeded; drives the process exit code
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Succeeded
    }
}
