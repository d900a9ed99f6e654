//! Run orchestration - matches triggers, plans layers, executes pipelines

use crate::core::event::{match_event, Event};
use crate::core::registry::Registry;
use crate::core::state::{PipelineResult, PipelineStatus, RunReport, RunStatus};
use crate::execution::executor::PipelineExecutor;
use crate::execution::runner::CommandRunner;
use crate::execution::scheduler::{plan, ExecutionPlan};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Events that occur during a run
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted {
        run_id: Uuid,
        branch: String,
        action: String,
        pipeline_count: usize,
    },
    PipelineStarted {
        name: String,
    },
    PipelineCompleted {
        name: String,
        status: PipelineStatus,
    },
    PipelineSkipped {
        name: String,
        reason: String,
    },
    RunCompleted {
        run_id: Uuid,
        status: RunStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// The run coordinator.
///
/// Owns the result map for the duration of a run (single writer); pipelines
/// within a layer execute as concurrent tasks, and the coordinator waits for
/// the whole layer before starting the next one.
pub struct ExecutionEngine<R> {
    executor: Arc<PipelineExecutor<R>>,
    handlers: Mutex<Vec<EventHandler>>,
    cancelled: Arc<AtomicBool>,
}

impl<R: CommandRunner + Send + Sync + 'static> ExecutionEngine<R> {
    pub fn new(runner: R) -> Self {
        Self {
            executor: Arc::new(PipelineExecutor::new(runner)),
            handlers: Mutex::new(Vec::new()),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.handlers.lock().unwrap().push(Arc::new(handler));
    }

    /// Handle for external cancellation (e.g. a ctrl-c hook).
    ///
    /// Once set, no further pipeline or command starts; completed results are
    /// preserved and everything not yet started is reported skipped.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    fn emit(&self, event: ExecutionEvent) {
        let handlers = self.handlers.lock().unwrap();
        for handler in handlers.iter() {
            handler(event.clone());
        }
    }

    /// Match the event against the registry, plan, and execute
    pub async fn run(&self, registry: &Registry, event: &Event) -> RunReport {
        let selected = match_event(event, registry);
        info!(
            "Event ({}, {}) matched {} pipeline(s)",
            event.branch,
            event.action,
            selected.len()
        );
        let plan = plan(&selected, registry);
        self.run_plan(registry, &plan, event).await
    }

    /// Execute a prepared plan, layer by layer
    pub async fn run_plan(
        &self,
        registry: &Registry,
        plan: &ExecutionPlan,
        event: &Event,
    ) -> RunReport {
        let mut report = RunReport::new(event.branch.clone(), event.action);
        info!(
            "Starting run {} ({} pipelines in {} layers)",
            report.run_id,
            plan.pipeline_count(),
            plan.layers().len()
        );
        self.emit(ExecutionEvent::RunStarted {
            run_id: report.run_id,
            branch: event.branch.clone(),
            action: event.action.to_string(),
            pipeline_count: plan.pipeline_count(),
        });

        let mut results: HashMap<String, PipelineResult> = HashMap::new();

        for layer in plan.layers() {
            let mut handles = Vec::new();

            for name in layer {
                let Some(pipeline) = registry.get(name) else {
                    continue;
                };

                if self.cancelled.load(Ordering::SeqCst) {
                    let reason = "run cancelled".to_string();
                    self.emit(ExecutionEvent::PipelineSkipped {
                        name: name.clone(),
                        reason: reason.clone(),
                    });
                    results.insert(name.clone(), PipelineResult::skipped(name.clone(), reason));
                    continue;
                }

                // Dependency gate: a failed or skipped dependency propagates
                // as a skip, never as a failure of this pipeline
                let blocking = pipeline
                    .depends_on
                    .iter()
                    .find(|dep| results.get(dep.as_str()).map_or(true, |r| !r.is_succeeded()));
                if let Some(dep) = blocking {
                    let reason = format!("dependency '{}' did not succeed", dep);
                    warn!("Skipping pipeline {}: {}", name, reason);
                    self.emit(ExecutionEvent::PipelineSkipped {
                        name: name.clone(),
                        reason: reason.clone(),
                    });
                    results.insert(name.clone(), PipelineResult::skipped(name.clone(), reason));
                    continue;
                }

                self.emit(ExecutionEvent::PipelineStarted { name: name.clone() });
                let executor = self.executor.clone();
                let cancelled = self.cancelled.clone();
                let pipeline = pipeline.clone();
                let handle =
                    tokio::spawn(async move { executor.execute(&pipeline, &cancelled).await });
                handles.push((name.clone(), handle));
            }

            // Layer barrier: wait for every pipeline task before moving on
            for (name, handle) in handles {
                let result = match handle.await {
                    Ok(result) => result,
                    Err(e) => {
                        error!("Pipeline task {} panicked: {}", name, e);
                        PipelineResult {
                            name: name.clone(),
                            status: PipelineStatus::Failed,
                            steps: Vec::new(),
                            failed_step: None,
                            skip_reason: None,
                            started_at: None,
                            completed_at: Some(Utc::now()),
                        }
                    }
                };
                self.emit(ExecutionEvent::PipelineCompleted {
                    name: name.clone(),
                    status: result.status,
                });
                results.insert(name, result);
            }
        }

        for name in plan.pipelines() {
            if let Some(result) = results.remove(name) {
                report.results.push(result);
            }
        }
        report.finalize();

        info!("Run {} finished: {:?}", report.run_id, report.status);
        self.emit(ExecutionEvent::RunCompleted {
            run_id: report.run_id,
            status: report.status,
        });

        report
    }
}
