//! Wait-for graph management using `petgraph`.
//!
//! Builds a directed graph from the scheduling identifiers of a plan and
//! the wait-conditions between them, and resolves a topological order
//! for downstream executors.

use std::collections::HashMap;

use imageplan_common::error::{ImagePlanError, Result};
use imageplan_common::types::StepId;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::plan::BuildStep;

/// A wait-for graph of scheduled steps.
#[derive(Debug, Default)]
pub struct WaitGraph {
    /// Internal petgraph representation.
    graph: DiGraph<StepId, ()>,
    /// Node lookup by scheduling identifier.
    nodes: HashMap<StepId, NodeIndex>,
}

impl WaitGraph {
    /// Creates an empty wait graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph of build and functional test steps.
    ///
    /// Each build step waits for its builder image step when that step is
    /// part of the same plan; each functional test waits for its image.
    #[must_use]
    pub fn from_steps(steps: &[BuildStep]) -> Self {
        let mut graph = Self::new();
        for step in steps {
            let _ = graph.add_step(step.id.clone());
        }
        for step in steps {
            if let Some(dep) = &step.depends_on {
                let _ = graph.add_wait(&step.id, dep);
            }
            for index in 0..step.functional_tests.len() {
                let test = StepId::test(&step.tag, index);
                let _ = graph.add_step(test.clone());
                let _ = graph.add_wait(&test, &step.id);
            }
        }
        graph
    }

    /// Adds a step node, returning the existing node if already present.
    pub fn add_step(&mut self, id: StepId) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(&id) {
            return idx;
        }
        let idx = self.graph.add_node(id.clone());
        let _ = self.nodes.insert(id, idx);
        idx
    }

    /// Adds a wait edge: `dependent` waits for `dependency`.
    ///
    /// The graph edge points from `dependency` to `dependent` so that
    /// topological sort yields dependencies first. Returns `false` when
    /// either step is unknown.
    pub fn add_wait(&mut self, dependent: &StepId, dependency: &StepId) -> bool {
        match (self.nodes.get(dependent), self.nodes.get(dependency)) {
            (Some(&to), Some(&from)) => {
                let _ = self.graph.add_edge(from, to, ());
                true
            }
            _ => false,
        }
    }

    /// Returns `true` if `id` is a step of this graph.
    #[must_use]
    pub fn contains(&self, id: &StepId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Returns the number of steps in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns `true` if the graph holds no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Returns the steps in an order where every step follows the steps
    /// it waits for.
    ///
    /// # Errors
    ///
    /// Returns an error if the wait-conditions form a cycle.
    pub fn resolve_order(&self) -> Result<Vec<StepId>> {
        match petgraph::algo::toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .iter()
                .filter_map(|&idx| self.graph.node_weight(idx).cloned())
                .collect()),
            Err(cycle) => {
                let at = self
                    .graph
                    .node_weight(cycle.node_id())
                    .map_or_else(String::new, ToString::to_string);
                Err(ImagePlanError::inconsistency(format!(
                    "cyclic builder dependency detected at {at}"
                )))
            }
        }
    }
}
