//! Dependency graph builder
//!
//! Scans descriptors for references and records a "must exist before"
//! edge from every referenced producer to its consumer. Construction
//! fails on unknown or self references, duplicate names, and cycles, so a
//! graph value is always a valid DAG.

use crate::error::{Error, Result};
use crate::resource::ResourceDescriptor;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as _;

/// A validated, acyclic resource dependency graph
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Descriptors in declaration order
    nodes: Vec<ResourceDescriptor>,
    /// Logical name -> declaration index
    index: HashMap<String, usize>,
    /// Declaration index -> producer indices (sorted, deduplicated)
    producers: Vec<BTreeSet<usize>>,
    /// Declaration index -> consumer indices (sorted, deduplicated)
    consumers: Vec<BTreeSet<usize>>,
}

impl DependencyGraph {
    /// Build a graph from descriptors in declaration order
    pub fn build(descriptors: Vec<ResourceDescriptor>) -> Result<Self> {
        let mut index = HashMap::with_capacity(descriptors.len());
        for (i, descriptor) in descriptors.iter().enumerate() {
            if index.insert(descriptor.id().to_string(), i).is_some() {
                return Err(Error::DuplicateResource(descriptor.id().to_string()));
            }
        }

        let mut producers = vec![BTreeSet::new(); descriptors.len()];
        let mut consumers = vec![BTreeSet::new(); descriptors.len()];

        for (consumer, descriptor) in descriptors.iter().enumerate() {
            for (target, attribute) in descriptor.references() {
                if target == descriptor.id() {
                    return Err(Error::SelfReference {
                        resource: descriptor.id().to_string(),
                        attribute: attribute.to_string(),
                    });
                }
                let producer = *index.get(target).ok_or_else(|| Error::UnknownReference {
                    resource: descriptor.id().to_string(),
                    target: target.to_string(),
                    attribute: attribute.to_string(),
                })?;
                producers[consumer].insert(producer);
                consumers[producer].insert(consumer);
            }
        }

        let graph = Self {
            nodes: descriptors,
            index,
            producers,
            consumers,
        };

        if let Some(cycle) = graph.find_cycle() {
            return Err(Error::CycleDetected { cycle });
        }

        log::debug!(
            "Built dependency graph: {} resources, {} edges",
            graph.len(),
            graph.edge_count()
        );
        Ok(graph)
    }

    /// Depth-first search with an on-stack marker
    ///
    /// Returns the first cycle found, as a closed path of logical names.
    fn find_cycle(&self) -> Option<Vec<String>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            OnStack,
            Done,
        }

        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        let mut stack: Vec<usize> = Vec::new();

        for root in 0..self.nodes.len() {
            if marks[root] != Mark::Unvisited {
                continue;
            }

            // Explicit stack of (node, remaining consumers) keeps deep graphs off the call stack
            let mut frames: Vec<(usize, Vec<usize>)> = Vec::new();
            marks[root] = Mark::OnStack;
            stack.push(root);
            frames.push((root, self.consumers[root].iter().rev().copied().collect()));

            while let Some((node, pending)) = frames.last_mut() {
                match pending.pop() {
                    Some(next) => match marks[next] {
                        Mark::OnStack => {
                            let start = stack.iter().position(|&n| n == next).unwrap_or(0);
                            let mut cycle: Vec<String> = stack[start..]
                                .iter()
                                .map(|&n| self.nodes[n].id().to_string())
                                .collect();
                            cycle.push(self.nodes[next].id().to_string());
                            return Some(cycle);
                        }
                        Mark::Unvisited => {
                            marks[next] = Mark::OnStack;
                            stack.push(next);
                            frames.push((next, self.consumers[next].iter().rev().copied().collect()));
                        }
                        Mark::Done => {}
                    },
                    None => {
                        marks[*node] = Mark::Done;
                        stack.pop();
                        frames.pop();
                    }
                }
            }
        }

        None
    }

    /// Number of resources
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the graph has no resources
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of distinct producer -> consumer edges
    pub fn edge_count(&self) -> usize {
        self.producers.iter().map(BTreeSet::len).sum()
    }

    /// Check if a resource is part of the graph
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Descriptors in declaration order
    pub fn descriptors(&self) -> &[ResourceDescriptor] {
        &self.nodes
    }

    /// Look up a descriptor by logical name
    pub fn descriptor(&self, id: &str) -> Option<&ResourceDescriptor> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Declaration position of a resource
    pub(crate) fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub(crate) fn producer_indices(&self, i: usize) -> &BTreeSet<usize> {
        &self.producers[i]
    }

    pub(crate) fn consumer_indices(&self, i: usize) -> &BTreeSet<usize> {
        &self.consumers[i]
    }

    /// Resources that `id` references, in declaration order
    pub fn producers(&self, id: &str) -> Vec<&str> {
        self.position(id)
            .map(|i| self.ids(&self.producers[i]))
            .unwrap_or_default()
    }

    /// Resources that reference `id`, in declaration order
    pub fn consumers(&self, id: &str) -> Vec<&str> {
        self.position(id)
            .map(|i| self.ids(&self.consumers[i]))
            .unwrap_or_default()
    }

    fn ids(&self, set: &BTreeSet<usize>) -> Vec<&str> {
        set.iter().map(|&i| self.nodes[i].id()).collect()
    }

    /// All `(producer, consumer)` edges, ordered by consumer then producer
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.producers
            .iter()
            .enumerate()
            .flat_map(|(consumer, producers)| {
                producers
                    .iter()
                    .map(move |&producer| (self.nodes[producer].id(), self.nodes[consumer].id()))
            })
            .collect()
    }

    /// Render the graph in Graphviz DOT format
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph resources {\n    rankdir=LR;\n");
        for node in &self.nodes {
            let _ = writeln!(
                out,
                "    \"{}\" [label=\"{}\\n{}\"];",
                node.id(),
                node.id(),
                node.kind()
            );
        }
        for (producer, consumer) in self.edges() {
            let _ = writeln!(out, "    \"{producer}\" -> \"{consumer}\";");
        }
        out.push_str("}\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ArgValue;

    fn node(id: &str, refs: &[&str]) -> ResourceDescriptor {
        refs.iter().fold(ResourceDescriptor::new(id, "test"), |d, target| {
            d.with_arg(format!("from_{target}"), ArgValue::reference(*target, "id"))
        })
    }

    #[test]
    fn test_edges_follow_references() {
        let graph = DependencyGraph::build(vec![
            node("a", &[]),
            node("b", &["a"]),
            node("c", &["a", "b"]),
        ])
        .unwrap();

        assert_eq!(graph.edges(), vec![("a", "b"), ("a", "c"), ("b", "c")]);
        assert_eq!(graph.producers("c"), vec!["a", "b"]);
        assert_eq!(graph.consumers("a"), vec!["b", "c"]);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_repeated_reference_is_one_edge() {
        let descriptor = ResourceDescriptor::new("b", "test")
            .with_arg("x", ArgValue::reference("a", "id"))
            .with_arg("y", ArgValue::reference("a", "arn"));
        let graph = DependencyGraph::build(vec![node("a", &[]), descriptor]).unwrap();

        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_unknown_reference() {
        let err = DependencyGraph::build(vec![node("a", &["ghost"])]).unwrap_err();
        match err {
            Error::UnknownReference {
                resource, target, ..
            } => {
                assert_eq!(resource, "a");
                assert_eq!(target, "ghost");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_self_reference() {
        let err = DependencyGraph::build(vec![node("a", &["a"])]).unwrap_err();
        assert!(matches!(err, Error::SelfReference { .. }));
    }

    #[test]
    fn test_duplicate_resource() {
        let err = DependencyGraph::build(vec![node("a", &[]), node("a", &[])]).unwrap_err();
        assert!(matches!(err, Error::DuplicateResource(id) if id == "a"));
    }

    #[test]
    fn test_cycle_reports_closed_path() {
        let err = DependencyGraph::build(vec![
            node("root", &[]),
            node("a", &["root", "c"]),
            node("b", &["a"]),
            node("c", &["b"]),
        ])
        .unwrap_err();

        match err {
            Error::CycleDetected { cycle } => {
                assert_eq!(cycle, vec!["a", "b", "c", "a"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_two_node_cycle() {
        let err = DependencyGraph::build(vec![node("a", &["b"]), node("b", &["a"])]).unwrap_err();
        match err {
            Error::CycleDetected { cycle } => assert_eq!(cycle, vec!["a", "b", "a"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_to_dot() {
        let graph = DependencyGraph::build(vec![node("a", &[]), node("b", &["a"])]).unwrap();
        let dot = graph.to_dot();
        assert!(dot.starts_with("digraph resources {"));
        assert!(dot.contains("\"a\" -> \"b\";"));
    }
}
