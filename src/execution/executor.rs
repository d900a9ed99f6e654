//! Pipeline executor - runs one pipeline's steps sequentially

use crate::core::pipeline::Pipeline;
use crate::core::state::{PipelineResult, PipelineStatus, StepResult};
use crate::execution::runner::{CommandRunner, StepRunner};
use chrono::Utc;
use std::sync::atomic::AtomicBool;
use tracing::{info, warn};

/// Executes a single pipeline: steps strictly in order, short-circuiting on
/// the first failure. Steps after the failure point are recorded as skipped.
pub struct PipelineExecutor<R> {
    steps: StepRunner<R>,
}

impl<R: CommandRunner> PipelineExecutor<R> {
    pub fn new(runner: R) -> Self {
        Self {
            steps: StepRunner::new(runner),
        }
    }

    /// Execute a pipeline and return its finalized result
    pub async fn execute(&self, pipeline: &Pipeline, cancelled: &AtomicBool) -> PipelineResult {
        info!("Executing pipeline: {}", pipeline.name);
        let started_at = Utc::now();

        let mut results: Vec<StepResult> = Vec::with_capacity(pipeline.steps.len());
        let mut failed_step: Option<String> = None;

        for (index, step) in pipeline.steps.iter().enumerate() {
            let result = self.steps.run(step, cancelled).await;

            if result.is_failed() {
                warn!("Pipeline {}: step {} failed", pipeline.name, step.name);
                failed_step = Some(step.name.clone());
                results.push(result);
                // Remaining steps are not run
                for unrun in &pipeline.steps[index + 1..] {
                    results.push(StepResult::skipped(unrun.name.clone()));
                }
                break;
            }

            results.push(result);
        }

        let status = if failed_step.is_some() {
            PipelineStatus::Failed
        } else {
            PipelineStatus::Succeeded
        };
        info!("Pipeline {} finished: {:?}", pipeline.name, status);

        PipelineResult {
            name: pipeline.name.clone(),
            status,
            steps: results,
            failed_step,
            skip_reason: None,
            started_at: Some(started_at),
            completed_at: Some(Utc::now()),
        }
    }
}
