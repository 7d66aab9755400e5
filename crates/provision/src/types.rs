//! Core types for resource graph provisioning

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Attributes reported by the provisioner for a resource (ids, ARNs, URLs)
pub type Attributes = BTreeMap<String, Value>;

/// Per-run state of every resource, keyed by logical name
pub type StateMap = BTreeMap<String, ResourceState>;

/// Provider type token of a resource, e.g. `aws:iam/role:Role`
///
/// The core never interprets it; it is handed to the provisioner verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceKind(String);

impl ResourceKind {
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceKind {
    fn from(kind: &str) -> Self {
        Self::new(kind)
    }
}

impl From<String> for ResourceKind {
    fn from(kind: String) -> Self {
        Self(kind)
    }
}

/// Lifecycle status of a resource within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    /// Not started yet
    #[default]
    Pending,
    /// Provisioning call in flight
    Creating,
    /// Provisioning call succeeded
    Created,
    /// Provisioning call failed
    Failed,
}

impl ResourceStatus {
    /// Whether the status is final for the current run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Created | Self::Failed)
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Creating => "creating",
            Self::Created => "created",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Recorded state of one resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    pub status: ResourceStatus,

    /// Attributes returned by the last successful provisioning call
    #[serde(default)]
    pub attributes: Attributes,

    /// Resolved arguments of the last successful provisioning call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_args: Option<Value>,

    /// Error text of the last failed call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResourceState {
    /// Check if the resource reached `Created`
    pub fn is_created(&self) -> bool {
        self.status == ResourceStatus::Created
    }

    /// Whether the resource exists on the provider side
    ///
    /// A failed update leaves the earlier attributes in place, so the
    /// resource still exists even though its status is `Failed`.
    pub fn exists(&self) -> bool {
        self.is_created() || (self.status == ResourceStatus::Failed && !self.attributes.is_empty())
    }

    /// Look up a single attribute
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

/// Result of processing one resource in a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyResult {
    /// Resource already matched its resolved arguments
    Unchanged,
    /// Resource was created
    Created,
    /// Resource existed and was updated
    Updated,
    /// Resource was deleted during teardown
    Removed,
    /// Provisioning failed
    Failed { error: String },
    /// Resource was not started
    Skipped { reason: String },
}

impl ApplyResult {
    /// Check if the result represents success (no failure)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// Check if the result represents a change
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created | Self::Updated | Self::Removed)
    }
}

impl fmt::Display for ApplyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged => f.write_str("unchanged"),
            Self::Created => f.write_str("created"),
            Self::Updated => f.write_str("updated"),
            Self::Removed => f.write_str("removed"),
            Self::Failed { error } => write!(f, "failed: {error}"),
            Self::Skipped { reason } => write!(f, "skipped: {reason}"),
        }
    }
}

/// Summary of execution results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ExecuteSummary {
    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.created + self.updated + self.removed
    }

    /// Check if execution was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of resources processed
    pub fn total(&self) -> usize {
        self.created + self.updated + self.removed + self.unchanged + self.skipped + self.failed
    }

    /// Merge another summary into this one
    pub fn merge(&mut self, other: &ExecuteSummary) {
        self.created += other.created;
        self.updated += other.updated;
        self.removed += other.removed;
        self.unchanged += other.unchanged;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }

    /// Add a result to the summary
    pub fn add_result(&mut self, result: &ApplyResult) {
        match result {
            ApplyResult::Unchanged => self.unchanged += 1,
            ApplyResult::Created => self.created += 1,
            ApplyResult::Updated => self.updated += 1,
            ApplyResult::Removed => self.removed += 1,
            ApplyResult::Failed { .. } => self.failed += 1,
            ApplyResult::Skipped { .. } => self.skipped += 1,
        }
    }
}

/// Options for execution
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Don't call the provisioner, just report what would run
    pub dry_run: bool,
    /// Number of resources provisioned concurrently; 1 is strictly sequential
    pub jobs: usize,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            jobs: 1,
        }
    }
}
