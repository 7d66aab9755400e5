//! Stack file schema
//!
//! A stack file is TOML. Each `[[resources]]` entry becomes one resource
//! descriptor. Argument values are literals unless written as
//! `{ ref = "resource", attr = "attribute" }` (an internal dependency) or
//! `{ input = "name" }` (an externally supplied constant).

use anyhow::{Context, Result, bail};
use provision::{ArgValue, DependencyGraph, OutputSpec, ResourceDescriptor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::engine::EngineKind;

/// Prefix of environment variables that supply inputs
pub const ENV_INPUT_PREFIX: &str = "STACKGRAPH_INPUT_";

// ============================================================================
// Main Stack Schema
// ============================================================================

/// A declared stack of resources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackConfig {
    /// Stack name, also names the state file
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Provisioning engine to drive
    #[serde(default)]
    pub engine: EngineConfig,

    /// Externally supplied constants (VPC ids, usernames, policy ARNs)
    #[serde(default)]
    pub inputs: BTreeMap<String, Value>,

    /// Resources in declaration order
    #[serde(default)]
    pub resources: Vec<ResourceSpec>,

    /// Named outputs, exported after apply
    #[serde(default)]
    pub outputs: BTreeMap<String, RefSpec>,
}

/// Engine selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub kind: EngineKind,

    /// Program run by the command engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Extra arguments for the command engine
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

/// One declared resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub args: BTreeMap<String, ArgSpec>,
}

/// `{ ref = "resource", attr = "attribute" }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefSpec {
    #[serde(rename = "ref")]
    pub resource: String,
    pub attr: String,
}

/// `{ input = "name" }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputSpec {
    pub input: String,
}

/// An argument as written in the stack file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgSpec {
    // Before the structs, which serde would also fill from a short array
    List(Vec<ArgSpec>),
    Reference(RefSpec),
    Input(InputSpec),
    Map(BTreeMap<String, ArgSpec>),
    Literal(Value),
}

impl ArgSpec {
    /// Convert to a descriptor argument, substituting inputs
    pub fn to_arg(&self, inputs: &Inputs) -> Result<ArgValue> {
        Ok(match self {
            Self::Reference(r) => ArgValue::reference(&r.resource, &r.attr),
            Self::Input(i) => ArgValue::Literal(
                inputs
                    .get(&i.input)
                    .with_context(|| format!("Input '{}' is not set", i.input))?,
            ),
            Self::List(items) => ArgValue::List(
                items
                    .iter()
                    .map(|item| item.to_arg(inputs))
                    .collect::<Result<_>>()?,
            ),
            Self::Map(entries) => ArgValue::Map(
                entries
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), v.to_arg(inputs)?)))
                    .collect::<Result<_>>()?,
            ),
            Self::Literal(value) => ArgValue::Literal(value.clone()),
        })
    }

    fn collect_inputs<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Self::Input(i) => names.push(&i.input),
            Self::List(items) => items.iter().for_each(|item| item.collect_inputs(names)),
            Self::Map(entries) => entries.values().for_each(|v| v.collect_inputs(names)),
            Self::Reference(_) | Self::Literal(_) => {}
        }
    }
}

// ============================================================================
// Inputs
// ============================================================================

/// Input values, resolved by precedence: `--set`, environment, stack file
pub struct Inputs {
    overrides: BTreeMap<String, Value>,
    table: BTreeMap<String, Value>,
    env: Box<dyn Fn(&str) -> Option<String>>,
}

impl Inputs {
    /// Inputs backed by the process environment
    pub fn new(table: BTreeMap<String, Value>, overrides: BTreeMap<String, Value>) -> Self {
        Self::with_env(table, overrides, |key| std::env::var(key).ok())
    }

    /// Inputs with a custom environment lookup
    pub fn with_env(
        table: BTreeMap<String, Value>,
        overrides: BTreeMap<String, Value>,
        env: impl Fn(&str) -> Option<String> + 'static,
    ) -> Self {
        Self {
            overrides,
            table,
            env: Box::new(env),
        }
    }

    /// Environment variable consulted for an input
    pub fn env_key(name: &str) -> String {
        format!("{ENV_INPUT_PREFIX}{}", name.to_uppercase())
    }

    /// Look up an input
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.overrides.get(name) {
            return Some(value.clone());
        }
        if let Some(value) = (self.env)(&Self::env_key(name)) {
            log::debug!("Input '{name}' taken from environment");
            return Some(Value::String(value));
        }
        self.table.get(name).cloned()
    }
}

/// Parse a `--set name=value` flag; the value is JSON if it parses, else a string
pub fn parse_override(raw: &str) -> Result<(String, Value)> {
    let Some((name, value)) = raw.split_once('=') else {
        bail!("Expected NAME=VALUE, got '{raw}'");
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("Empty input name in '{raw}'");
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.to_string(), value))
}

// ============================================================================
// Loading and Conversion
// ============================================================================

impl StackConfig {
    /// Load a stack file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read stack file: {}", path.display()))?;
        let stack = Self::parse(&content)
            .with_context(|| format!("Invalid stack file: {}", path.display()))?;
        log::debug!(
            "Loaded stack '{}' with {} resources from {}",
            stack.name,
            stack.resources.len(),
            path.display()
        );
        Ok(stack)
    }

    /// Parse and validate stack TOML
    pub fn parse(content: &str) -> Result<Self> {
        let stack: Self = toml::from_str(content).context("Invalid TOML format")?;
        stack.validate()?;
        Ok(stack)
    }

    /// Validate fields that the graph builder does not check
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("Stack name must not be empty");
        }
        if self.name.contains(['/', '\\']) {
            bail!("Stack name '{}' must not contain path separators", self.name);
        }
        for resource in &self.resources {
            if resource.name.trim().is_empty() {
                bail!("Resource name must not be empty");
            }
            if resource.kind.trim().is_empty() {
                bail!("Resource '{}' has an empty kind", resource.name);
            }
        }
        if self.engine.kind == EngineKind::Command && self.engine.command.is_none() {
            bail!("Engine kind 'command' requires engine.command");
        }
        Ok(())
    }

    /// Names of all inputs the resources use, sorted and deduplicated
    pub fn input_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for resource in &self.resources {
            for arg in resource.args.values() {
                arg.collect_inputs(&mut names);
            }
        }
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Input resolver for this stack
    pub fn inputs(&self, overrides: BTreeMap<String, Value>) -> Inputs {
        Inputs::new(self.inputs.clone(), overrides)
    }

    /// Convert resources into descriptors, substituting inputs
    pub fn descriptors(&self, inputs: &Inputs) -> Result<Vec<ResourceDescriptor>> {
        self.resources
            .iter()
            .map(|resource| {
                resource.args.iter().try_fold(
                    ResourceDescriptor::new(&resource.name, resource.kind.as_str()),
                    |descriptor, (name, spec)| {
                        let arg = spec.to_arg(inputs).with_context(|| {
                            format!("Resource '{}' argument '{}'", resource.name, name)
                        })?;
                        Ok::<_, anyhow::Error>(descriptor.with_arg(name, arg))
                    },
                )
            })
            .collect()
    }

    /// Output declarations
    pub fn output_specs(&self) -> Vec<OutputSpec> {
        self.outputs
            .iter()
            .map(|(name, r)| OutputSpec::new(name, &r.resource, &r.attr))
            .collect()
    }

    /// Build and validate the dependency graph, outputs included
    pub fn build_graph(&self, inputs: &Inputs) -> Result<DependencyGraph> {
        let graph = DependencyGraph::build(self.descriptors(inputs)?)?;
        for spec in self.output_specs() {
            spec.validate(&graph)?;
        }
        Ok(graph)
    }
}

// ============================================================================
// Tests
// ============================================================================
