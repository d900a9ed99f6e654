//! Pipeline domain model

use crate::core::config::{PipelineConfig, StepConfig, TriggerConfig};
use crate::core::event::Action;
use serde::{Deserialize, Serialize};

/// A pipeline definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    /// Pipeline name, unique within a registry
    pub name: String,

    /// Ordered steps
    pub steps: Vec<Step>,

    /// Trigger rules; empty means the pipeline only runs as a dependency
    pub triggers: Vec<Trigger>,

    /// Names of pipelines that must succeed before this one may start
    pub depends_on: Vec<String>,
}

impl Pipeline {
    /// Create a pipeline from configuration
    pub fn from_config(config: &PipelineConfig) -> Self {
        Pipeline {
            name: config.name.clone(),
            steps: config.steps.iter().map(Step::from_config).collect(),
            triggers: config.triggers.iter().map(Trigger::from_config).collect(),
            depends_on: config.depends_on.clone(),
        }
    }

    /// Check whether any trigger entry matches the event fields
    pub fn matches(&self, branch: &str, action: Action) -> bool {
        self.triggers.iter().any(|t| t.matches(branch, action))
    }

    pub fn has_triggers(&self) -> bool {
        !self.triggers.is_empty()
    }
}

/// A single step: an ordered sequence of shell commands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Step name (for reporting)
    pub name: String,

    /// Commands, executed strictly in order
    pub commands: Vec<String>,

    /// Optional timeout for the whole step; exceeding it fails the step
    pub timeout_secs: Option<u64>,
}

impl Step {
    pub fn from_config(config: &StepConfig) -> Self {
        Step {
            name: config.name.clone(),
            commands: config.commands.clone(),
            timeout_secs: config.timeout_secs,
        }
    }
}

/// A trigger rule: the event must match one branch AND one action of the entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    pub branches: Vec<String>,
    pub actions: Vec<Action>,
}

impl Trigger {
    pub fn from_config(config: &TriggerConfig) -> Self {
        Trigger {
            branches: config.branches.clone(),
            actions: config.actions.clone(),
        }
    }

    pub fn matches(&self, branch: &str, action: Action) -> bool {
        self.branches.iter().any(|b| b == branch) && self.actions.contains(&action)
    }
}
