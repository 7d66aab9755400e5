//! Provider traits
//!
//! These traits keep the crate free of any cloud SDK, terminal UI or
//! prompt library. The host supplies the provisioning engine, and
//! optionally progress reporting and confirmation.

use crate::types::{ApplyResult, Attributes, ResourceKind};
use anyhow::Result;
use serde_json::Value;

/// The external provisioning engine
///
/// Called once per resource with fully resolved arguments; returns the
/// attributes the resource exposes to its dependents. Implementations own
/// any retry, backoff or drift detection against the real provider.
pub trait Provisioner: Send + Sync {
    /// Create a resource
    fn create(&self, kind: &ResourceKind, id: &str, args: &Value) -> Result<Attributes>;

    /// Update an existing resource whose resolved arguments changed
    ///
    /// Defaults to `create`, for engines whose create call is an upsert.
    fn update(
        &self,
        kind: &ResourceKind,
        id: &str,
        args: &Value,
        current: &Attributes,
    ) -> Result<Attributes> {
        let _ = current;
        self.create(kind, id, args)
    }

    /// Delete a resource during teardown
    fn delete(&self, kind: &ResourceKind, id: &str, attributes: &Attributes) -> Result<()> {
        let _ = (kind, id, attributes);
        Ok(())
    }
}

impl<F> Provisioner for F
where
    F: Fn(&ResourceKind, &str, &Value) -> Result<Attributes> + Send + Sync,
{
    fn create(&self, kind: &ResourceKind, id: &str, args: &Value) -> Result<Attributes> {
        self(kind, id, args)
    }
}

/// Progress callback for execution operations
///
/// Implement this trait to receive progress updates during execution.
pub trait ProgressCallback: Send {
    /// Called once before the first resource is processed
    fn on_plan_start(&mut self, count: usize);

    /// Called when a provisioning call is about to be made
    fn on_resource_start(&mut self, id: &str, kind: &ResourceKind);

    /// Called when a resource has been processed
    fn on_resource_complete(&mut self, id: &str, result: &ApplyResult);

    /// Called after the last resource
    fn on_plan_complete(&mut self);
}

/// Confirmation callback for user interaction
pub trait ConfirmCallback: Send {
    /// Ask the user to confirm an action
    ///
    /// # Returns
    /// `true` if the user confirmed, `false` otherwise
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_plan_start(&mut self, _count: usize) {}
    fn on_resource_start(&mut self, _id: &str, _kind: &ResourceKind) {}
    fn on_resource_complete(&mut self, _id: &str, _result: &ApplyResult) {}
    fn on_plan_complete(&mut self) {}
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Auto-decline callback (always returns false)
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }
}
