//! CLI command definitions

use crate::core::event::Action;
use clap::Args;

/// Run the pipelines matching an event
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to the pipeline YAML file
    #[arg(short, long)]
    pub file: String,

    /// Branch of the triggering event
    #[arg(short, long)]
    pub branch: String,

    /// Action of the triggering event
    #[arg(short, long, value_enum, default_value_t = Action::Manual)]
    pub action: Action,

    /// Don't save the run to history
    #[arg(long)]
    pub no_history: bool,
}

/// Show the execution plan for an event without running anything
#[derive(Debug, Args, Clone)]
pub struct PlanCommand {
    /// Path to the pipeline YAML file
    #[arg(short, long)]
    pub file: String,

    /// Branch of the triggering event
    #[arg(short, long)]
    pub branch: String,

    /// Action of the triggering event
    #[arg(short, long, value_enum, default_value_t = Action::Manual)]
    pub action: Action,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Validate a pipeline configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to the pipeline YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// List declared pipelines with their triggers and dependencies
#[derive(Debug, Args, Clone)]
pub struct ListCommand {
    /// Path to the pipeline YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Show run history
#[derive(Debug, Args, Clone)]
pub struct HistoryCommand {
    /// Number of recent runs to show
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Show details for a specific run ID
    #[arg(long)]
    pub run_id: Option<String>,
}
