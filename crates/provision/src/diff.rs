//! Change preview for a plan against recorded state

use crate::error::Error;
use crate::graph::DependencyGraph;
use crate::planner::ExecutionPlan;
use crate::types::{ResourceStatus, StateMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Predicted action for one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Resource does not exist yet
    Create,
    /// Resource exists but its resolved arguments differ
    Update,
    /// A producer will change, so the final arguments are not known yet
    Unknown,
    /// Resource exists with identical arguments
    NoChange,
    /// Resource will be deleted
    Delete,
}

impl ChangeKind {
    /// One-character marker used in plan listings
    pub fn symbol(&self) -> char {
        match self {
            Self::Create => '+',
            Self::Update => '~',
            Self::Unknown => '?',
            Self::NoChange => ' ',
            Self::Delete => '-',
        }
    }
}

/// A predicted change for one resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDiff {
    /// Logical name of the resource
    pub resource_id: String,
    /// Provider kind of the resource
    pub resource_type: String,
    /// Status recorded by the previous run
    pub status: ResourceStatus,
    pub change: ChangeKind,
    /// Top-level arguments whose resolved value differs (updates only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changed_args: Vec<String>,
}

impl ResourceDiff {
    /// Check if this diff represents an actual change
    pub fn is_change(&self) -> bool {
        self.change != ChangeKind::NoChange
    }
}

/// Predict what applying `plan` would do, given the recorded `states`
///
/// Arguments are resolved against the attributes recorded for producers.
/// Once a producer is going to change, its consumers' arguments cannot be
/// known ahead of time; existing consumers are then reported as
/// [`ChangeKind::Unknown`].
pub fn compute_diffs(
    graph: &DependencyGraph,
    plan: &ExecutionPlan,
    states: &StateMap,
) -> Vec<ResourceDiff> {
    let mut changing: HashSet<&str> = HashSet::new();
    let mut diffs = Vec::with_capacity(plan.len());

    for id in plan.iter() {
        let Some(descriptor) = graph.descriptor(id) else {
            continue;
        };
        let prior = states.get(id);
        let status = prior.map(|s| s.status).unwrap_or_default();
        let exists = prior.is_some_and(|s| s.exists());
        let producer_changing = graph.producers(id).iter().any(|p| changing.contains(p));

        let mut changed_args = Vec::new();
        let change = if !exists {
            ChangeKind::Create
        } else if producer_changing {
            ChangeKind::Unknown
        } else {
            let resolved = descriptor.resolve_args(|resource, attribute| {
                states
                    .get(resource)
                    .and_then(|s| s.attribute(attribute))
                    .cloned()
                    .ok_or_else(|| Error::MissingAttribute {
                        resource: resource.to_string(),
                        attribute: attribute.to_string(),
                    })
            });
            match (resolved, prior) {
                (Err(_), _) => ChangeKind::Unknown,
                (Ok(args), Some(prior))
                    if prior.status == ResourceStatus::Created
                        && prior.applied_args.as_ref().is_none_or(|a| *a == args) =>
                {
                    ChangeKind::NoChange
                }
                (Ok(args), prior) => {
                    changed_args = differing_keys(prior.and_then(|p| p.applied_args.as_ref()), &args);
                    ChangeKind::Update
                }
            }
        };

        if change != ChangeKind::NoChange {
            changing.insert(id);
        }

        diffs.push(ResourceDiff {
            resource_id: id.to_string(),
            resource_type: descriptor.kind().to_string(),
            status,
            change,
            changed_args,
        });
    }

    diffs
}

/// Predict teardown: every existing resource in reverse plan order
pub fn compute_removals(
    graph: &DependencyGraph,
    plan: &ExecutionPlan,
    states: &StateMap,
) -> Vec<ResourceDiff> {
    plan.teardown()
        .iter()
        .filter_map(|id| {
            let state = states.get(id).filter(|s| s.exists())?;
            let descriptor = graph.descriptor(id)?;
            Some(ResourceDiff {
                resource_id: id.to_string(),
                resource_type: descriptor.kind().to_string(),
                status: state.status,
                change: ChangeKind::Delete,
                changed_args: Vec::new(),
            })
        })
        .collect()
}

fn differing_keys(before: Option<&Value>, after: &Value) -> Vec<String> {
    let empty = serde_json::Map::new();
    let before = before.and_then(Value::as_object).unwrap_or(&empty);
    let after = after.as_object().unwrap_or(&empty);

    let mut keys: Vec<String> = before
        .keys()
        .chain(after.keys())
        .filter(|k| before.get(*k) != after.get(*k))
        .cloned()
        .collect();
    keys.sort();
    keys.dedup();
    keys
}

/// Diff summary statistics
#[derive(Debug, Clone, Default)]
pub struct DiffSummary {
    pub creates: usize,
    pub updates: usize,
    pub unknown: usize,
    pub deletes: usize,
    pub no_change: usize,
}

impl DiffSummary {
    /// Create a summary from a list of diffs
    pub fn from_diffs(diffs: &[ResourceDiff]) -> Self {
        let mut summary = Self::default();
        for diff in diffs {
            match diff.change {
                ChangeKind::Create => summary.creates += 1,
                ChangeKind::Update => summary.updates += 1,
                ChangeKind::Unknown => summary.unknown += 1,
                ChangeKind::Delete => summary.deletes += 1,
                ChangeKind::NoChange => summary.no_change += 1,
            }
        }
        summary
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.creates + self.updates + self.unknown + self.deletes
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

/// Group diffs by resource kind, kinds sorted
pub fn group_by_type(diffs: &[ResourceDiff]) -> BTreeMap<&str, Vec<&ResourceDiff>> {
    let mut groups: BTreeMap<&str, Vec<&ResourceDiff>> = BTreeMap::new();
    for diff in diffs {
        groups
            .entry(diff.resource_type.as_str())
            .or_default()
            .push(diff);
    }
    groups
}
