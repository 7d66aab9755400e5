//! Error types for the provision crate

use thiserror::Error;

/// Errors raised while building, planning or driving a resource graph.
///
/// Every variant names the resource it concerns so a failed run can be
/// traced back to one descriptor.
#[derive(Error, Debug)]
pub enum Error {
    /// Two descriptors share a logical name
    #[error("resource '{0}' is declared more than once")]
    DuplicateResource(String),

    /// A reference names a resource that is not part of the graph
    #[error("resource '{resource}' references unknown resource '{target}' (attribute '{attribute}')")]
    UnknownReference {
        resource: String,
        target: String,
        attribute: String,
    },

    /// A descriptor references one of its own attributes
    #[error("resource '{resource}' references its own attribute '{attribute}'")]
    SelfReference { resource: String, attribute: String },

    /// The references form a cycle
    #[error("dependency cycle detected: {}", .cycle.join(" -> "))]
    CycleDetected {
        /// Cycle path, first node repeated at the end
        cycle: Vec<String>,
    },

    /// A plan target is not part of the graph
    #[error("unknown target resource '{0}'")]
    UnknownTarget(String),

    /// A created resource did not report an attribute that is referenced
    #[error("resource '{resource}' has no attribute '{attribute}'")]
    MissingAttribute { resource: String, attribute: String },

    /// The provisioner failed to create or update a resource
    #[error("failed to provision '{resource}': {source:#}")]
    ProvisionFailure {
        resource: String,
        #[source]
        source: anyhow::Error,
    },

    /// The provisioner failed to delete a resource
    #[error("failed to tear down '{resource}': {source:#}")]
    TeardownFailure {
        resource: String,
        #[source]
        source: anyhow::Error,
    },

    /// An export was requested before its resource was created
    #[error("export '{name}' is unresolved: resource '{resource}' has not been created")]
    UnresolvedExport { name: String, resource: String },
}

impl Error {
    /// The resource this error is about, if any
    pub fn resource(&self) -> Option<&str> {
        match self {
            Self::DuplicateResource(id) | Self::UnknownTarget(id) => Some(id),
            Self::UnknownReference { resource, .. }
            | Self::SelfReference { resource, .. }
            | Self::MissingAttribute { resource, .. }
            | Self::ProvisionFailure { resource, .. }
            | Self::TeardownFailure { resource, .. }
            | Self::UnresolvedExport { resource, .. } => Some(resource),
            Self::CycleDetected { cycle } => cycle.first().map(String::as_str),
        }
    }

    /// Whether this error was raised before any provisioning call
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateResource(_)
                | Self::UnknownReference { .. }
                | Self::SelfReference { .. }
                | Self::CycleDetected { .. }
                | Self::UnknownTarget(_)
        )
    }
}

/// Result type for provision operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_display() {
        let err = Error::CycleDetected {
            cycle: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "dependency cycle detected: a -> b -> a");
        assert_eq!(err.resource(), Some("a"));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_provision_failure_names_resource() {
        let err = Error::ProvisionFailure {
            resource: "fn".into(),
            source: anyhow::anyhow!("quota exceeded"),
        };
        assert_eq!(err.to_string(), "failed to provision 'fn': quota exceeded");
        assert_eq!(err.resource(), Some("fn"));
        assert!(!err.is_configuration_error());
    }
}
