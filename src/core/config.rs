//! Pipeline configuration from YAML

use crate::core::event::Action;
use crate::core::registry::{ConfigError, Registry};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration: an ordered list of pipeline declarations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub pipelines: Vec<PipelineConfig>,
}

/// One pipeline declaration as written in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name, unique across the file
    pub name: String,

    /// Ordered steps
    pub steps: Vec<StepConfig>,

    /// Trigger rules; a pipeline without any is only reachable as a dependency
    #[serde(default)]
    pub triggers: Vec<TriggerConfig>,

    /// Pipelines that must succeed before this one may start
    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// Step declaration: a name and an ordered list of command strings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    pub name: String,

    pub commands: Vec<String>,

    /// Timeout for the whole step, in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Trigger declaration: branch set and action set, both must contain the event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    #[serde(default)]
    pub branches: Vec<String>,

    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.as_ref().display()))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml).context("Failed to parse config")?;
        Ok(config)
    }

    /// Build the validated, frozen registry this configuration declares
    pub fn into_registry(self) -> Result<Registry, ConfigError> {
        Registry::from_config(self)
    }
}
