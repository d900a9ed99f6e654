//! Shared test utilities
#![allow(dead_code)]

use async_trait::async_trait;
use stagehand::core::config::Config;
use stagehand::core::event::{Action, Event};
use stagehand::core::registry::Registry;
use stagehand::core::state::RunReport;
use stagehand::execution::{CommandOutput, CommandRunner, ExecutionEngine, RunnerError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Mock command runner: scripted outcomes per command string, every
/// invocation recorded for ordering and never-ran assertions
pub struct MockRunner {
    outcomes: HashMap<String, CommandOutput>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockRunner {
    /// Runner where every command succeeds, echoing its own name on stdout
    pub fn new() -> Self {
        Self {
            outcomes: HashMap::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script a failing outcome for one command
    pub fn fail_on(mut self, command: &str, exit_code: i32, stderr: &str) -> Self {
        self.outcomes.insert(
            command.to_string(),
            CommandOutput {
                exit_code,
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        );
        self
    }

    /// Script a successful outcome with specific stdout
    pub fn with_output(mut self, command: &str, stdout: &str) -> Self {
        self.outcomes.insert(
            command.to_string(),
            CommandOutput {
                exit_code: 0,
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        );
        self
    }

    /// Handle on the call log; clone before moving the runner into an engine
    pub fn call_log(&self) -> Arc<Mutex<Vec<String>>> {
        self.calls.clone()
    }
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, command: &str) -> Result<CommandOutput, RunnerError> {
        self.calls.lock().unwrap().push(command.to_string());
        Ok(self.outcomes.get(command).cloned().unwrap_or(CommandOutput {
            exit_code: 0,
            stdout: format!("{}\n", command),
            stderr: String::new(),
        }))
    }
}

/// Build a validated registry from YAML, panicking on any config error
pub fn registry_from_yaml(yaml: &str) -> Registry {
    Config::from_yaml(yaml)
        .unwrap_or_else(|e| panic!("Failed to parse config YAML: {}", e))
        .into_registry()
        .unwrap_or_else(|e| panic!("Invalid config: {}", e))
}

/// Run an event against a YAML config with the given mock runner.
///
/// Returns the run report plus the full command invocation log.
pub async fn run_scenario(
    yaml: &str,
    branch: &str,
    action: Action,
    runner: MockRunner,
) -> (RunReport, Vec<String>) {
    let registry = registry_from_yaml(yaml);
    let calls = runner.call_log();
    let engine = ExecutionEngine::new(runner);

    let report = engine.run(&registry, &Event::new(branch, action)).await;

    let calls = calls.lock().unwrap().clone();
    (report, calls)
}

/// Assert a pipeline succeeded
pub fn assert_pipeline_succeeded(report: &RunReport, name: &str) {
    let result = report
        .result(name)
        .unwrap_or_else(|| panic!("Pipeline '{}' not in report", name));
    assert!(
        result.is_succeeded(),
        "Pipeline '{}' should have succeeded, got {:?}",
        name,
        result.status
    );
}

/// Assert a pipeline failed
pub fn assert_pipeline_failed(report: &RunReport, name: &str) {
    let result = report
        .result(name)
        .unwrap_or_else(|| panic!("Pipeline '{}' not in report", name));
    assert!(
        result.is_failed(),
        "Pipeline '{}' should have failed, got {:?}",
        name,
        result.status
    );
}

/// Assert a pipeline was skipped (not run, not failed)
pub fn assert_pipeline_skipped(report: &RunReport, name: &str) {
    let result = report
        .result(name)
        .unwrap_or_else(|| panic!("Pipeline '{}' not in report", name));
    assert!(
        result.is_skipped(),
        "Pipeline '{}' should have been skipped, got {:?}",
        name,
        result.status
    );
}
