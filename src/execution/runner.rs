//! Step runner: shell command execution

use crate::core::pipeline::Step;
use crate::core::state::{StepResult, StepStatus};
use async_trait::async_trait;
use chrono::Utc;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

/// Error types for command execution
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to spawn command: {0}")]
    Spawn(String),

    #[error("timed out after {0} seconds")]
    Timeout(u64),

    #[error("failed to decode command output: {0}")]
    Output(String),
}

/// Captured outcome of one command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Trait for the command-execution collaborator - allows for different implementations
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run one command string, returning exit code and captured output
    async fn run(&self, command: &str) -> Result<CommandOutput, RunnerError>;
}

/// Runs commands through the user's shell as `<shell> -c <command>`
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
}

impl ShellRunner {
    /// Create a runner using `$SHELL`, falling back to `sh`
    pub fn new() -> Self {
        let shell = env::var("SHELL").unwrap_or_else(|_| "sh".to_string());
        Self { shell }
    }

    /// Create a runner with an explicit shell
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command: &str) -> Result<CommandOutput, RunnerError> {
        debug!("Spawning `{} -c {}`", self.shell, command);

        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| RunnerError::Spawn(e.to_string()))?;

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| RunnerError::Output(e.to_string()))?;
        let stderr = String::from_utf8(output.stderr)
            .map_err(|e| RunnerError::Output(e.to_string()))?;
        let exit_code = output.status.code().unwrap_or(-1);

        debug!(
            "Command exited {} with {} bytes of stdout",
            exit_code,
            stdout.len()
        );

        Ok(CommandOutput {
            exit_code,
            stdout,
            stderr,
        })
    }
}

/// Runs one step's commands strictly in order, failing fast on the first
/// non-zero exit or runner error
pub struct StepRunner<R> {
    runner: R,
}

impl<R: CommandRunner> StepRunner<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Execute a step and return its finalized result.
    ///
    /// The `cancelled` flag is checked before each command; once set, the
    /// current step fails instead of starting further commands.
    pub async fn run(&self, step: &Step, cancelled: &AtomicBool) -> StepResult {
        info!("Running step: {}", step.name);
        let started_at = Utc::now();

        let result = match step.timeout_secs {
            Some(secs) => {
                match timeout(Duration::from_secs(secs), self.run_commands(step, cancelled)).await
                {
                    Ok(result) => result,
                    Err(_) => {
                        warn!("Step {} timed out after {}s", step.name, secs);
                        StepResult {
                            name: step.name.clone(),
                            status: StepStatus::Failed,
                            exit_code: None,
                            stdout: String::new(),
                            stderr: String::new(),
                            error: Some(RunnerError::Timeout(secs).to_string()),
                            started_at: None,
                            completed_at: None,
                        }
                    }
                }
            }
            None => self.run_commands(step, cancelled).await,
        };

        StepResult {
            started_at: Some(started_at),
            completed_at: Some(Utc::now()),
            ..result
        }
    }

    async fn run_commands(&self, step: &Step, cancelled: &AtomicBool) -> StepResult {
        let mut stdout = String::new();
        let mut stderr = String::new();

        for command in &step.commands {
            if cancelled.load(Ordering::SeqCst) {
                return StepResult {
                    name: step.name.clone(),
                    status: StepStatus::Failed,
                    exit_code: None,
                    stdout,
                    stderr,
                    error: Some("run cancelled".to_string()),
                    started_at: None,
                    completed_at: None,
                };
            }

            debug!("Step {}: running `{}`", step.name, command);
            match self.runner.run(command).await {
                Ok(output) => {
                    stdout.push_str(&output.stdout);
                    stderr.push_str(&output.stderr);
                    if !output.success() {
                        warn!(
                            "Step {}: `{}` exited {}",
                            step.name, command, output.exit_code
                        );
                        return StepResult {
                            name: step.name.clone(),
                            status: StepStatus::Failed,
                            exit_code: Some(output.exit_code),
                            stdout,
                            stderr,
                            error: None,
                            started_at: None,
                            completed_at: None,
                        };
                    }
                }
                Err(e) => {
                    warn!("Step {}: `{}` errored: {}", step.name, command, e);
                    return StepResult {
                        name: step.name.clone(),
                        status: StepStatus::Failed,
                        exit_code: None,
                        stdout,
                        stderr,
                        error: Some(e.to_string()),
                        started_at: None,
                        completed_at: None,
                    };
                }
            }
        }

        StepResult {
            name: step.name.clone(),
            status: StepStatus::Succeeded,
            exit_code: Some(0),
            stdout,
            stderr,
            error: None,
            started_at: None,
            completed_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn step(name: &str, commands: &[&str]) -> Step {
        Step {
            name: name.to_string(),
            commands: commands.iter().map(|c| c.to_string()).collect(),
            timeout_secs: None,
        }
    }

    // Scripted runner: maps a command string to an outcome
    struct ScriptedRunner {
        outcomes: Vec<(String, CommandOutput)>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        fn new(outcomes: Vec<(&str, i32, &str, &str)>) -> Self {
            Self {
                outcomes: outcomes
                    .into_iter()
                    .map(|(cmd, code, out, err)| {
                        (
                            cmd.to_string(),
                            CommandOutput {
                                exit_code: code,
                                stdout: out.to_string(),
                                stderr: err.to_string(),
                            },
                        )
                    })
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(&self, command: &str) -> Result<CommandOutput, RunnerError> {
            self.calls.lock().unwrap().push(command.to_string());
            self.outcomes
                .iter()
                .find(|(cmd, _)| cmd == command)
                .map(|(_, out)| out.clone())
                .ok_or_else(|| RunnerError::Spawn(format!("unscripted command: {}", command)))
        }
    }

    #[tokio::test]
    async fn test_commands_run_in_order() {
        let runner = ScriptedRunner::new(vec![
            ("first", 0, "one\n", ""),
            ("second", 0, "two\n", ""),
        ]);
        let steps = StepRunner::new(runner);
        let cancelled = AtomicBool::new(false);

        let result = steps.run(&step("both", &["first", "second"]), &cancelled).await;

        assert_eq!(result.status, StepStatus::Succeeded);
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.stdout, "one\ntwo\n");
        assert_eq!(steps.runner().calls(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_nonzero_exit_stops_remaining_commands() {
        let runner = ScriptedRunner::new(vec![
            ("first", 1, "", "boom\n"),
            ("second", 0, "", ""),
        ]);
        let steps = StepRunner::new(runner);
        let cancelled = AtomicBool::new(false);

        let result = steps.run(&step("both", &["first", "second"]), &cancelled).await;

        assert_eq!(result.status, StepStatus::Failed);
        assert_eq!(result.exit_code, Some(1));
        assert_eq!(result.stderr, "boom\n");
        assert_eq!(steps.runner().calls(), vec!["first"]);
    }

    #[tokio::test]
    async fn test_runner_error_fails_step() {
        let runner = ScriptedRunner::new(vec![]);
        let steps = StepRunner::new(runner);
        let cancelled = AtomicBool::new(false);

        let result = steps.run(&step("oops", &["missing"]), &cancelled).await;

        assert_eq!(result.status, StepStatus::Failed);
        assert!(result.error.unwrap().contains("unscripted command"));
    }

    #[tokio::test]
    async fn test_cancelled_flag_fails_before_running() {
        let runner = ScriptedRunner::new(vec![("first", 0, "", "")]);
        let steps = StepRunner::new(runner);
        let cancelled = AtomicBool::new(true);

        let result = steps.run(&step("noop", &["first"]), &cancelled).await;

        assert_eq!(result.status, StepStatus::Failed);
        assert_eq!(result.error.as_deref(), Some("run cancelled"));
        assert!(steps.runner().calls().is_empty());
    }

    #[tokio::test]
    async fn test_shell_runner_captures_output() {
        let runner = ShellRunner::with_shell("sh");
        let output = runner.run("echo hello").await.unwrap();

        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_shell_runner_reports_exit_code() {
        let runner = ShellRunner::with_shell("sh");
        let output = runner.run("exit 3").await.unwrap();

        assert!(!output.success());
        assert_eq!(output.exit_code, 3);
    }

    #[tokio::test]
    async fn test_step_timeout_fails_step() {
        let runner = ShellRunner::with_shell("sh");
        let steps = StepRunner::new(runner);
        let cancelled = AtomicBool::new(false);

        let slow = Step {
            name: "slow".to_string(),
            commands: vec!["sleep 5".to_string()],
            timeout_secs: Some(1),
        };
        let result = steps.run(&slow, &cancelled).await;

        assert_eq!(result.status, StepStatus::Failed);
        assert!(result.error.unwrap().contains("timed out"));
    }
}
