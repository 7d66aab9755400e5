//! Execution planner - orders resources for creation and teardown

use crate::error::{Error, Result};
use crate::graph::DependencyGraph;
use std::collections::BTreeSet;

/// An ordered list of resources where every producer precedes its consumers
///
/// Ordering is stable: among resources whose producers are all placed, the
/// earliest declared goes first. Re-running the planner on the same input
/// therefore never reorders independent resources.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionPlan {
    order: Vec<String>,
}

impl ExecutionPlan {
    /// Create an empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan creation of every resource in the graph
    pub fn from_graph(graph: &DependencyGraph) -> Self {
        let mut in_degree: Vec<usize> = (0..graph.len())
            .map(|i| graph.producer_indices(i).len())
            .collect();
        let mut ready: BTreeSet<usize> = (0..graph.len()).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(graph.len());

        while let Some(next) = ready.pop_first() {
            order.push(graph.descriptors()[next].id().to_string());
            for &consumer in graph.consumer_indices(next) {
                in_degree[consumer] -= 1;
                if in_degree[consumer] == 0 {
                    ready.insert(consumer);
                }
            }
        }

        // The graph is acyclic by construction, so every node is placed
        debug_assert_eq!(order.len(), graph.len());
        Self { order }
    }

    /// Plan only `targets` and everything they transitively depend on
    pub fn targeted<S: AsRef<str>>(graph: &DependencyGraph, targets: &[S]) -> Result<Self> {
        let mut keep = BTreeSet::new();
        let mut stack = Vec::new();

        for target in targets {
            let target = target.as_ref();
            let i = graph
                .position(target)
                .ok_or_else(|| Error::UnknownTarget(target.to_string()))?;
            stack.push(i);
        }

        while let Some(i) = stack.pop() {
            if keep.insert(i) {
                stack.extend(graph.producer_indices(i).iter().copied());
            }
        }

        let full = Self::from_graph(graph);
        let order = full
            .order
            .into_iter()
            .filter(|id| graph.position(id).is_some_and(|i| keep.contains(&i)))
            .collect();
        Ok(Self { order })
    }

    /// The same resources in reverse order, for teardown
    pub fn teardown(&self) -> Self {
        Self {
            order: self.order.iter().rev().cloned().collect(),
        }
    }

    /// Group the plan into waves of mutually independent resources
    ///
    /// Every resource lands one wave after the latest wave holding one of
    /// its producers. Within a wave, plan order is preserved.
    pub fn waves(&self, graph: &DependencyGraph) -> Vec<Vec<String>> {
        let mut level = vec![None::<usize>; graph.len()];
        let mut waves: Vec<Vec<String>> = Vec::new();

        for id in &self.order {
            let Some(i) = graph.position(id) else {
                continue;
            };
            let wave = graph
                .producer_indices(i)
                .iter()
                .filter_map(|&p| level[p])
                .map(|l| l + 1)
                .max()
                .unwrap_or(0);
            level[i] = Some(wave);
            if waves.len() <= wave {
                waves.resize_with(wave + 1, Vec::new);
            }
            waves[wave].push(id.clone());
        }

        waves
    }

    /// Resource ids in execution order
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Position of a resource in the plan
    pub fn position(&self, id: &str) -> Option<usize> {
        self.order.iter().position(|o| o == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Total number of resources in the plan
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if plan is empty
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
