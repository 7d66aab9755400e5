//! Resource descriptors
//!
//! A descriptor is the immutable, desired-state record of one resource:
//! its logical name, its provider kind, and an argument tree whose leaves
//! are either literal values or references to attributes of other
//! descriptors that are only known once those are provisioned.

use crate::error::Result;
use crate::types::ResourceKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// An argument value, possibly containing references to other resources
///
/// # Example
///
/// ```
/// use provision::ArgValue;
///
/// let vpc_config = ArgValue::map([
///     ("subnetIds", ArgValue::literal(vec!["subnet-a", "subnet-b"])),
///     (
///         "securityGroupIds",
///         ArgValue::List(vec![ArgValue::reference("lambdaSecurityGroup", "id")]),
///     ),
/// ]);
///
/// assert_eq!(vpc_config.references(), vec![("lambdaSecurityGroup", "id")]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgValue {
    /// A fully known value (scalar, list or map)
    Literal(Value),
    /// An output attribute of another resource in the same graph
    Reference { resource: String, attribute: String },
    /// A list whose elements may contain references
    List(Vec<ArgValue>),
    /// A map whose values may contain references
    Map(BTreeMap<String, ArgValue>),
}

impl ArgValue {
    /// Create a literal argument
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Create a reference to `resource.attribute`
    pub fn reference(resource: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::Reference {
            resource: resource.into(),
            attribute: attribute.into(),
        }
    }

    /// Create a map argument from key/value pairs
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, ArgValue)>) -> Self {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// All `(resource, attribute)` references in this value, depth first
    pub fn references(&self) -> Vec<(&str, &str)> {
        let mut refs = Vec::new();
        self.collect_references(&mut refs);
        refs
    }

    fn collect_references<'a>(&'a self, refs: &mut Vec<(&'a str, &'a str)>) {
        match self {
            Self::Literal(_) => {}
            Self::Reference {
                resource,
                attribute,
            } => refs.push((resource.as_str(), attribute.as_str())),
            Self::List(items) => {
                for item in items {
                    item.collect_references(refs);
                }
            }
            Self::Map(entries) => {
                for value in entries.values() {
                    value.collect_references(refs);
                }
            }
        }
    }

    /// Whether the value contains no references
    pub fn is_literal(&self) -> bool {
        self.references().is_empty()
    }

    /// Substitute every reference using `lookup`, producing a plain value
    pub fn resolve<F>(&self, lookup: &mut F) -> Result<Value>
    where
        F: FnMut(&str, &str) -> Result<Value>,
    {
        match self {
            Self::Literal(value) => Ok(value.clone()),
            Self::Reference {
                resource,
                attribute,
            } => lookup(resource, attribute),
            Self::List(items) => items
                .iter()
                .map(|item| item.resolve(lookup))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            Self::Map(entries) => {
                let mut resolved = Map::new();
                for (key, value) in entries {
                    resolved.insert(key.clone(), value.resolve(lookup)?);
                }
                Ok(Value::Object(resolved))
            }
        }
    }
}

impl From<Value> for ArgValue {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

/// Desired state of one resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    id: String,
    kind: ResourceKind,
    args: BTreeMap<String, ArgValue>,
}

impl ResourceDescriptor {
    /// Create a descriptor with no arguments
    pub fn new(id: impl Into<String>, kind: impl Into<ResourceKind>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            args: BTreeMap::new(),
        }
    }

    /// Add an argument, replacing any previous value under the same name
    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }

    /// Logical name, unique within a graph
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &ResourceKind {
        &self.kind
    }

    pub fn args(&self) -> &BTreeMap<String, ArgValue> {
        &self.args
    }

    /// Every `(resource, attribute)` this descriptor consumes
    pub fn references(&self) -> Vec<(&str, &str)> {
        self.args
            .values()
            .flat_map(ArgValue::references)
            .collect()
    }

    /// Resolve all arguments into a JSON object
    pub fn resolve_args<F>(&self, mut lookup: F) -> Result<Value>
    where
        F: FnMut(&str, &str) -> Result<Value>,
    {
        let mut resolved = Map::new();
        for (name, value) in &self.args {
            resolved.insert(name.clone(), value.resolve(&mut lookup)?);
        }
        Ok(Value::Object(resolved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;

    fn function() -> ResourceDescriptor {
        ResourceDescriptor::new("fn", "aws:lambda/function:Function")
            .with_arg("runtime", ArgValue::literal("dotnet6"))
            .with_arg("role", ArgValue::reference("role", "arn"))
            .with_arg(
                "vpcConfig",
                ArgValue::map([(
                    "securityGroupIds",
                    ArgValue::List(vec![ArgValue::reference("lambdaSecurityGroup", "id")]),
                )]),
            )
    }

    #[test]
    fn test_references_are_found_in_nested_args() {
        let descriptor = function();
        let refs = descriptor.references();
        assert_eq!(refs, vec![("role", "arn"), ("lambdaSecurityGroup", "id")]);
    }

    #[test]
    fn test_resolve_substitutes_references() {
        let resolved = function()
            .resolve_args(|resource, attribute| Ok(json!(format!("{resource}:{attribute}"))))
            .unwrap();

        assert_eq!(
            resolved,
            json!({
                "role": "role:arn",
                "runtime": "dotnet6",
                "vpcConfig": { "securityGroupIds": ["lambdaSecurityGroup:id"] },
            })
        );
    }

    #[test]
    fn test_resolve_propagates_lookup_errors() {
        let err = function()
            .resolve_args(|resource, attribute| {
                Err(Error::MissingAttribute {
                    resource: resource.to_string(),
                    attribute: attribute.to_string(),
                })
            })
            .unwrap_err();

        assert!(matches!(err, Error::MissingAttribute { .. }));
    }

    #[test]
    fn test_literal_detection() {
        assert!(ArgValue::literal(json!({"a": [1, 2]})).is_literal());
        assert!(!ArgValue::List(vec![ArgValue::reference("x", "id")]).is_literal());
    }
}
