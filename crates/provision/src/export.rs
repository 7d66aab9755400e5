//! Output exporter - named values handed back to the caller of a run

use crate::error::{Error, Result};
use crate::graph::DependencyGraph;
use crate::types::StateMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Export one attribute of a created resource under `name`
///
/// Fails with [`Error::UnresolvedExport`] while the resource is not
/// `Created`, and with [`Error::MissingAttribute`] if it never reported
/// the attribute.
pub fn export(name: &str, resource: &str, attribute: &str, states: &StateMap) -> Result<Value> {
    let state = states
        .get(resource)
        .filter(|s| s.is_created())
        .ok_or_else(|| Error::UnresolvedExport {
            name: name.to_string(),
            resource: resource.to_string(),
        })?;

    state
        .attribute(attribute)
        .cloned()
        .ok_or_else(|| Error::MissingAttribute {
            resource: resource.to_string(),
            attribute: attribute.to_string(),
        })
}

/// Declaration of a named output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub name: String,
    pub resource: String,
    pub attribute: String,
}

impl OutputSpec {
    pub fn new(
        name: impl Into<String>,
        resource: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            resource: resource.into(),
            attribute: attribute.into(),
        }
    }

    /// Check that the output points into the graph
    pub fn validate(&self, graph: &DependencyGraph) -> Result<()> {
        if graph.contains(&self.resource) {
            Ok(())
        } else {
            Err(Error::UnknownReference {
                resource: format!("output '{}'", self.name),
                target: self.resource.clone(),
                attribute: self.attribute.clone(),
            })
        }
    }
}

/// Resolved outputs, name -> value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Outputs(BTreeMap<String, Value>);

impl Outputs {
    /// Resolve every output; the first unresolved one aborts
    pub fn collect(specs: &[OutputSpec], states: &StateMap) -> Result<Self> {
        specs
            .iter()
            .map(|spec| {
                export(&spec.name, &spec.resource, &spec.attribute, states)
                    .map(|value| (spec.name.clone(), value))
            })
            .collect::<Result<BTreeMap<_, _>>>()
            .map(Self)
    }

    /// Resolve what can be resolved, returning the failures separately
    pub fn collect_partial(specs: &[OutputSpec], states: &StateMap) -> (Self, Vec<Error>) {
        let mut outputs = BTreeMap::new();
        let mut errors = Vec::new();
        for spec in specs {
            match export(&spec.name, &spec.resource, &spec.attribute, states) {
                Ok(value) => {
                    outputs.insert(spec.name.clone(), value);
                }
                Err(err) => errors.push(err),
            }
        }
        (Self(outputs), errors)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
