//! Execution planning - dependency expansion and topological layering

use crate::core::registry::Registry;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A topologically layered execution plan.
///
/// Pipelines within one layer have no dependency relation to each other and
/// may run concurrently; layers execute strictly in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    layers: Vec<Vec<String>>,
}

impl ExecutionPlan {
    pub fn layers(&self) -> &[Vec<String>] {
        &self.layers
    }

    /// All planned pipelines, layer by layer
    pub fn pipelines(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().flatten().map(String::as_str)
    }

    pub fn pipeline_count(&self) -> usize {
        self.layers.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Which layer a pipeline landed in
    pub fn layer_of(&self, name: &str) -> Option<usize> {
        self.layers
            .iter()
            .position(|layer| layer.iter().any(|n| n == name))
    }
}

/// Build the execution plan for a selected set of pipelines.
///
/// The selection is expanded transitively: a selected pipeline's dependencies
/// run even when they carry no matching trigger themselves. Layering is
/// Kahn's algorithm over the expanded set; within a layer, pipelines keep
/// registry declaration order so plans (and logs) are deterministic.
///
/// Assumes the registry has been validated: names resolve and the dependency
/// graph is acyclic.
pub fn plan(selected: &[String], registry: &Registry) -> ExecutionPlan {
    // Expand through dependency edges
    let mut included: HashSet<String> = HashSet::new();
    let mut worklist: Vec<String> = selected.to_vec();
    while let Some(name) = worklist.pop() {
        if !included.insert(name.clone()) {
            continue;
        }
        if let Some(pipeline) = registry.get(&name) {
            worklist.extend(pipeline.depends_on.iter().cloned());
        }
    }

    // Kahn layering: a pipeline joins the first layer where all of its
    // dependencies inside the plan are already placed
    let mut placed: HashSet<String> = HashSet::new();
    let mut remaining = included;
    let mut layers: Vec<Vec<String>> = Vec::new();

    while !remaining.is_empty() {
        let layer: Vec<String> = registry
            .iter()
            .filter(|p| remaining.contains(&p.name))
            .filter(|p| {
                p.depends_on
                    .iter()
                    .all(|dep| !remaining.contains(dep) || placed.contains(dep))
            })
            .map(|p| p.name.clone())
            .collect();

        if layer.is_empty() {
            // Unreachable for a validated (acyclic) registry
            break;
        }

        for name in &layer {
            remaining.remove(name);
            placed.insert(name.clone());
        }
        layers.push(layer);
    }

    ExecutionPlan { layers }
}
