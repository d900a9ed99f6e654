//! Trigger events and matching

use crate::core::registry::Registry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of event that can trigger a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// Explicit invocation from the command line
    Manual,
    /// Before a push reaches the remote
    PrePush,
    /// Before a commit is recorded
    PreCommit,
    /// After a commit is recorded
    PostCommit,
    /// After a merge completes
    PostMerge,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Manual => "manual",
            Action::PrePush => "pre-push",
            Action::PreCommit => "pre-commit",
            Action::PostCommit => "post-commit",
            Action::PostMerge => "post-merge",
        };
        write!(f, "{}", s)
    }
}

/// An incoming event from the trigger source (version-control hook or manual invocation)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub branch: String,
    pub action: Action,
}

impl Event {
    pub fn new(branch: impl Into<String>, action: Action) -> Self {
        Self {
            branch: branch.into(),
            action,
        }
    }
}

/// Select the pipelines eligible to run for an event.
///
/// Pure function over the event and the registry snapshot: the same inputs
/// always yield the same selection, in registry declaration order. Pipelines
/// without trigger entries are never selected here; they only run as
/// dependencies of a selected pipeline.
pub fn match_event(event: &Event, registry: &Registry) -> Vec<String> {
    registry
        .iter()
        .filter(|p| p.matches(&event.branch, event.action))
        .map(|p| p.name.clone())
        .collect()
}
