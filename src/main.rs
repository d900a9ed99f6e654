mod cli;
mod core;
mod execution;
mod persistence;

use anyhow::{Context, Result};
use cli::commands::{HistoryCommand, ListCommand, PlanCommand, RunCommand, ValidateCommand};
use cli::output::*;
use cli::{Cli, Command};
use execution::{ExecutionEngine, ExecutionEvent, ShellRunner};
use persistence::{create_summary, PersistenceBackend, SqliteRunStore};
use std::sync::atomic::Ordering;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::core::config::Config;
use crate::core::event::{match_event, Event};
use crate::core::registry::Registry;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Run(cmd) => run_event(cmd).await?,
        Command::Plan(cmd) => show_plan(cmd)?,
        Command::Validate(cmd) => validate_config(cmd)?,
        Command::List(cmd) => list_pipelines(cmd)?,
        Command::History(cmd) => show_history(cmd).await?,
    }

    Ok(())
}

fn load_registry(file: &str) -> Result<Registry> {
    let config = Config::from_file(file).context("Failed to load pipeline config")?;
    let registry = config
        .into_registry()
        .context("Invalid pipeline configuration")?;
    Ok(registry)
}

async fn run_event(cmd: &RunCommand) -> Result<()> {
    let registry = load_registry(&cmd.file)?;

    println!(
        "{} Loaded {} pipeline(s) from {}",
        INFO,
        style(registry.len()).cyan(),
        style(&cmd.file).bold()
    );

    let event = Event::new(&cmd.branch, cmd.action);
    let selected = match_event(&event, &registry);
    if selected.is_empty() {
        println!(
            "{} No pipeline triggers match ({}, {})",
            INFO,
            style(&event.branch).cyan(),
            style(event.action).cyan()
        );
        return Ok(());
    }

    let plan = execution::plan(&selected, &registry);
    let engine = ExecutionEngine::new(ShellRunner::new());

    // Console output + progress over the planned pipelines
    let progress = create_progress_bar(plan.pipeline_count());
    let bar = progress.clone();
    engine.add_event_handler(move |event| {
        bar.println(format_execution_event(&event));
        if matches!(
            event,
            ExecutionEvent::PipelineCompleted { .. } | ExecutionEvent::PipelineSkipped { .. }
        ) {
            bar.inc(1);
        }
    });

    // Ctrl-c cancels cooperatively: in-flight commands are killed on drop,
    // everything not yet started is reported skipped
    let cancel = engine.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.store(true, Ordering::SeqCst);
        }
    });

    println!();
    let report = engine.run_plan(&registry, &plan, &event).await;
    progress.finish_and_clear();

    // Save to history
    if !cmd.no_history {
        let store = SqliteRunStore::with_default_path().await?;
        let summary = create_summary(&report);
        store.save_run(&summary).await?;
        println!(
            "\n{} Run saved to history (ID: {})",
            INFO,
            style(&summary.run_id.to_string()[..8]).dim()
        );
    }

    println!("\n{}", format_report(&report));

    // One exit code for the whole invocation
    if report.is_success() {
        println!("\n{} Run completed {}", CHECK, style("successfully").green());
    } else {
        println!("\n{} Run {}", CROSS, style("failed").red());
        std::process::exit(1);
    }

    Ok(())
}

fn show_plan(cmd: &PlanCommand) -> Result<()> {
    let registry = load_registry(&cmd.file)?;
    let event = Event::new(&cmd.branch, cmd.action);
    let selected = match_event(&event, &registry);
    let plan = execution::plan(&selected, &registry);

    if cmd.json {
        let data = serde_json::json!({
            "branch": event.branch,
            "action": event.action,
            "layers": plan.layers(),
        });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    if plan.is_empty() {
        println!(
            "{} No pipeline triggers match ({}, {})",
            INFO,
            style(&event.branch).cyan(),
            style(event.action).cyan()
        );
        return Ok(());
    }

    println!(
        "{} Execution plan for ({}, {}):",
        INFO,
        style(&event.branch).cyan(),
        style(event.action).cyan()
    );
    for (index, layer) in plan.layers().iter().enumerate() {
        println!(
            "  layer {}: {}",
            style(index).cyan(),
            style(layer.join(", ")).bold()
        );
    }

    Ok(())
}

fn validate_config(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating configuration...", INFO);

    let config = match Config::from_file(&cmd.file) {
        Ok(config) => config,
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            std::process::exit(1);
        }
    };

    if cmd.json {
        let json = serde_json::to_string_pretty(&config)?;
        println!("{}", json);
    }

    match config.into_registry() {
        Ok(registry) => {
            println!("{} Configuration is valid!", CHECK);
            println!("  Pipelines: {}", style(registry.len()).cyan());
            let triggered = registry.iter().filter(|p| p.has_triggers()).count();
            println!("  With triggers: {}", style(triggered).cyan());
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            std::process::exit(1);
        }
    }
}

fn list_pipelines(cmd: &ListCommand) -> Result<()> {
    let registry = load_registry(&cmd.file)?;

    if cmd.json {
        let pipelines: Vec<_> = registry
            .iter()
            .map(|p| {
                serde_json::json!({
                    "name": p.name,
                    "steps": p.steps.iter().map(|s| &s.name).collect::<Vec<_>>(),
                    "triggers": p.triggers,
                    "depends_on": p.depends_on,
                })
            })
            .collect();
        let data = serde_json::json!({ "pipelines": pipelines });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    println!("{} Declared pipelines:", INFO);
    for pipeline in registry.iter() {
        println!(
            "  {} ({} step(s))",
            style(&pipeline.name).bold(),
            style(pipeline.steps.len()).cyan()
        );
        for trigger in &pipeline.triggers {
            let actions: Vec<String> = trigger.actions.iter().map(|a| a.to_string()).collect();
            println!(
                "    on ({}) x ({})",
                style(trigger.branches.join(", ")).cyan(),
                style(actions.join(", ")).cyan()
            );
        }
        if !pipeline.depends_on.is_empty() {
            println!(
                "    after {}",
                style(pipeline.depends_on.join(", ")).dim()
            );
        }
    }

    Ok(())
}

async fn show_history(cmd: &HistoryCommand) -> Result<()> {
    let store = SqliteRunStore::with_default_path().await?;

    // If a specific run is requested
    if let Some(run_id_str) = &cmd.run_id {
        let run_id = uuid::Uuid::parse_str(run_id_str).context("Invalid run ID format")?;
        match store.load_run(run_id).await? {
            Some(summary) => {
                if cmd.json {
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                } else {
                    print_run_details(&summary);
                }
            }
            None => println!("{} Run not found", WARN),
        }
        return Ok(());
    }

    let runs = store.list_runs(cmd.limit).await?;
    if runs.is_empty() {
        println!("{} No runs found", INFO);
        return Ok(());
    }

    if cmd.json {
        let data = serde_json::json!({ "runs": runs });
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        println!("{} Run history (showing latest {}):", INFO, cmd.limit);
        for summary in &runs {
            println!("  {}", format_run_summary(summary));
        }
    }

    Ok(())
}

fn print_run_details(summary: &persistence::RunSummary) {
    println!("{} Run Details", INFO);
    println!("  ID: {}", style(summary.run_id).cyan());
    println!(
        "  Event: ({}, {})",
        style(&summary.branch).bold(),
        summary.action
    );
    println!("  Status: {}", format_run_status(summary.status));
    println!("  Started: {}", style(summary.started_at.to_rfc3339()).dim());
    if let Some(completed) = summary.completed_at {
        println!("  Completed: {}", style(completed.to_rfc3339()).dim());
        if let Ok(duration) = completed.signed_duration_since(summary.started_at).to_std() {
            println!("  Duration: {}", style(format_duration(duration)).dim());
        }
    }
    println!(
        "  Pipelines: {} succeeded, {} failed, {} skipped ({} total)",
        style(summary.succeeded).green(),
        style(summary.failed).red(),
        style(summary.skipped).dim(),
        summary.total
    );
}

fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
