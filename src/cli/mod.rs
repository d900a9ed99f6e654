//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{HistoryCommand, ListCommand, PlanCommand, RunCommand, ValidateCommand};

/// Trigger-driven CI pipeline runner
#[derive(Debug, Parser, Clone)]
#[command(name = "stagehand")]
#[command(version = "0.1.0")]
#[command(about = "A trigger-driven CI pipeline runner", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the pipelines matching an event
    Run(RunCommand),

    /// Show the execution plan for an event
    Plan(PlanCommand),

    /// Validate a pipeline configuration
    Validate(ValidateCommand),

    /// List declared pipelines
    List(ListCommand),

    /// Show run history
    History(HistoryCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}

use std::ffi::OsString;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::Action;

    #[test]
    fn test_parse_run_command() {
        let cli = Cli::try_parse_from([
            "stagehand", "run", "--file", "stagehand.yml", "--branch", "dev", "--action",
            "pre-push",
        ])
        .unwrap();

        match cli.command {
            Command::Run(cmd) => {
                assert_eq!(cmd.file, "stagehand.yml");
                assert_eq!(cmd.branch, "dev");
                assert_eq!(cmd.action, Action::PrePush);
                assert!(!cmd.no_history);
            }
            other => panic!("expected run command, got {:?}", other),
        }
    }

    #[test]
    fn test_action_defaults_to_manual() {
        let cli = Cli::try_parse_from(["stagehand", "plan", "-f", "stagehand.yml", "-b", "main"])
            .unwrap();

        match cli.command {
            Command::Plan(cmd) => assert_eq!(cmd.action, Action::Manual),
            other => panic!("expected plan command, got {:?}", other),
        }
    }
}
