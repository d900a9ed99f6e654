//! Pipeline registry: the frozen, insertion-ordered catalog of definitions

use crate::core::config::Config;
use crate::core::pipeline::Pipeline;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Fatal configuration errors, detected before any command runs
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("duplicate pipeline name '{0}'")]
    DuplicateName(String),

    #[error("unknown pipeline '{0}'")]
    UnknownPipeline(String),

    #[error("pipeline '{pipeline}' depends on unknown pipeline '{dependency}'")]
    UnknownDependency { pipeline: String, dependency: String },

    #[error("cyclic dependency: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("step '{step}' in pipeline '{pipeline}' has no commands")]
    EmptyStep { pipeline: String, step: String },
}

/// Read-only catalog of pipeline definitions.
///
/// Insertion order is preserved: it is the deterministic tie-break whenever no
/// dependency constrains ordering. Built once per invocation; after
/// [`Registry::from_config`] returns the registry is never mutated.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    pipelines: Vec<Pipeline>,
    index: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and validate a registry from a parsed configuration.
    ///
    /// Fails with the first [`ConfigError`] encountered: duplicate names,
    /// empty steps, unknown dependencies, or a dependency cycle.
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let mut registry = Registry::new();
        for pipeline_config in &config.pipelines {
            registry.register(Pipeline::from_config(pipeline_config))?;
        }
        registry.validate()?;
        Ok(registry)
    }

    /// Add a pipeline; fails if the name is already taken
    pub fn register(&mut self, pipeline: Pipeline) -> Result<(), ConfigError> {
        if self.index.contains_key(&pipeline.name) {
            return Err(ConfigError::DuplicateName(pipeline.name));
        }
        self.index.insert(pipeline.name.clone(), self.pipelines.len());
        self.pipelines.push(pipeline);
        Ok(())
    }

    /// Look up a pipeline; fails if absent
    pub fn resolve(&self, name: &str) -> Result<&Pipeline, ConfigError> {
        self.get(name)
            .ok_or_else(|| ConfigError::UnknownPipeline(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&Pipeline> {
        self.index.get(name).map(|&i| &self.pipelines[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Insertion position of a pipeline, used for deterministic ordering
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Iterate pipelines in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Pipeline> {
        self.pipelines.iter()
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    /// Validate invariants: non-empty steps, resolvable dependencies, no cycles
    pub fn validate(&self) -> Result<(), ConfigError> {
        for pipeline in &self.pipelines {
            for step in &pipeline.steps {
                if step.commands.is_empty() {
                    return Err(ConfigError::EmptyStep {
                        pipeline: pipeline.name.clone(),
                        step: step.name.clone(),
                    });
                }
            }
            for dep in &pipeline.depends_on {
                if !self.contains(dep) {
                    return Err(ConfigError::UnknownDependency {
                        pipeline: pipeline.name.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }
        self.check_cycles()
    }

    /// Depth-first cycle detection over the dependency graph
    fn check_cycles(&self) -> Result<(), ConfigError> {
        let mut visited = HashSet::new();
        for pipeline in &self.pipelines {
            if !visited.contains(&pipeline.name) {
                self.dfs_check(&pipeline.name, &mut visited, &mut Vec::new())?;
            }
        }
        Ok(())
    }

    fn dfs_check(
        &self,
        name: &str,
        visited: &mut HashSet<String>,
        stack: &mut Vec<String>,
    ) -> Result<(), ConfigError> {
        if let Some(pos) = stack.iter().position(|n| n == name) {
            let mut cycle: Vec<String> = stack[pos..].to_vec();
            cycle.push(name.to_string());
            return Err(ConfigError::CyclicDependency { cycle });
        }
        if visited.contains(name) {
            return Ok(());
        }

        stack.push(name.to_string());
        if let Some(pipeline) = self.get(name) {
            for dep in &pipeline.depends_on {
                self.dfs_check(dep, visited, stack)?;
            }
        }
        stack.pop();
        visited.insert(name.to_string());
        Ok(())
    }
}
