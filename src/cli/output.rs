//! CLI output formatting

use crate::core::state::{PipelineResult, PipelineStatus, RunReport, RunStatus, StepStatus};
use crate::execution::ExecutionEvent;
use crate::persistence::RunSummary;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Create a progress bar over the planned pipelines
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Format a pipeline status for display
pub fn format_pipeline_status(status: PipelineStatus) -> String {
    match status {
        PipelineStatus::Pending => style("PENDING").dim().to_string(),
        PipelineStatus::Running => style("RUNNING").yellow().to_string(),
        PipelineStatus::Succeeded => style("SUCCEEDED").green().to_string(),
        PipelineStatus::Failed => style("FAILED").red().to_string(),
        PipelineStatus::Skipped => style("SKIPPED").dim().to_string(),
    }
}

/// Format a step status for display
pub fn format_step_status(status: StepStatus) -> String {
    match status {
        StepStatus::Succeeded => style("succeeded").green().to_string(),
        StepStatus::Failed => style("failed").red().to_string(),
        StepStatus::Skipped => style("skipped").dim().to_string(),
    }
}

/// Format a run status for display
pub fn format_run_status(status: RunStatus) -> String {
    match status {
        RunStatus::Running => style("RUNNING").yellow().to_string(),
        RunStatus::Succeeded => style("SUCCEEDED").green().to_string(),
        RunStatus::Failed => style("FAILED").red().to_string(),
    }
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::RunStarted {
            run_id,
            branch,
            action,
            pipeline_count,
        } => format!(
            "{} Run {} for ({}, {}): {} pipeline(s)",
            ROCKET,
            style(&run_id.to_string()[..8]).dim(),
            style(branch).cyan(),
            style(action).cyan(),
            pipeline_count
        ),
        ExecutionEvent::PipelineStarted { name } => {
            format!("{} {}", SPINNER, style(name).cyan())
        }
        ExecutionEvent::PipelineCompleted { name, status } => match status {
            PipelineStatus::Succeeded => format!("{} {}", CHECK, style(name).green()),
            _ => format!("{} {}", CROSS, style(name).red()),
        },
        ExecutionEvent::PipelineSkipped { name, reason } => {
            format!("{} {} ({})", WARN, style(name).dim(), style(reason).dim())
        }
        ExecutionEvent::RunCompleted { run_id, status } => format!(
            "{} Run ({}) {}",
            INFO,
            style(&run_id.to_string()[..8]).dim(),
            format_run_status(*status)
        ),
    }
}

/// Format one pipeline's result as report lines
pub fn format_pipeline_result(result: &PipelineResult) -> String {
    let mut lines = vec![format!(
        "  {} - {}",
        style(&result.name).bold(),
        format_pipeline_status(result.status)
    )];

    if let Some(reason) = &result.skip_reason {
        lines.push(format!("    {}", style(reason).dim()));
    }

    for step in &result.steps {
        let mut line = format!("    {} {}", style(&step.name).cyan(), format_step_status(step.status));
        if step.status == StepStatus::Failed {
            if let Some(code) = step.exit_code {
                line.push_str(&format!(" (exit {})", code));
            }
            if let Some(error) = &step.error {
                line.push_str(&format!(" ({})", error));
            }
        }
        lines.push(line);

        if step.status == StepStatus::Failed {
            let captured = if step.stderr.is_empty() {
                &step.stdout
            } else {
                &step.stderr
            };
            if !captured.is_empty() {
                for line_text in format_output(captured, 5).lines() {
                    lines.push(format!("      {}", style(line_text).dim()));
                }
            }
        }
    }

    lines.join("\n")
}

/// Format a whole run report
pub fn format_report(report: &RunReport) -> String {
    let mut lines = vec![format!(
        "{} Run {} - {} ({} succeeded, {} failed, {} skipped)",
        INFO,
        style(&report.run_id.to_string()[..8]).dim(),
        format_run_status(report.status),
        style(report.succeeded_count()).green(),
        style(report.failed_count()).red(),
        style(report.skipped_count()).dim(),
    )];

    for result in &report.results {
        lines.push(format_pipeline_result(result));
    }

    lines.join("\n")
}

/// Format a stored run summary for the history listing
pub fn format_run_summary(summary: &RunSummary) -> String {
    let status_icon = match summary.status {
        RunStatus::Succeeded => CHECK,
        RunStatus::Failed => CROSS,
        RunStatus::Running => SPINNER,
    };

    format!(
        "{} {} - ({}, {}) - {} ({}/{} succeeded)",
        status_icon,
        style(&summary.run_id.to_string()[..8]).dim(),
        style(&summary.branch).bold(),
        summary.action,
        format_run_status(summary.status),
        summary.succeeded,
        summary.total
    )
}

/// Format captured output with truncation
pub fn format_output(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();

    if lines.len() <= max_lines {
        output.to_string()
    } else {
        let truncated = lines[..max_lines].join("\n");
        format!(
            "{}\n{} ({} more lines)",
            truncated,
            style("[truncated]").dim(),
            lines.len() - max_lines
        )
    }
}
