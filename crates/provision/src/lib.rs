//! # Provision
//!
//! Resource dependency graphs for declarative provisioning.
//!
//! This crate turns a set of resource declarations into a validated
//! dependency graph, orders it for creation and teardown, and drives an
//! external provisioning engine through that order, feeding attributes
//! produced by one resource (ARNs, ids, names) into the arguments of the
//! resources that reference them.
//!
//! ## Core Concepts
//!
//! - **ResourceDescriptor**: desired state of one resource, with arguments
//!   that are literals or references to other resources' attributes
//! - **DependencyGraph**: must-exist-before edges derived from references;
//!   unknown references and cycles are rejected before any side effect
//! - **ExecutionPlan**: stable topological order (reverse for teardown)
//! - **Executor**: walks a plan, calling the [`Provisioner`] per resource
//! - **Outputs**: named attributes exported once their resource exists
//!
//! ## Example
//!
//! ```
//! use provision::{
//!     ArgValue, Attributes, DependencyGraph, ExecutionPlan, ResourceDescriptor,
//!     ResourceKind, StateMap, execute_simple, export,
//! };
//! use serde_json::{Value, json};
//!
//! let graph = DependencyGraph::build(vec![
//!     ResourceDescriptor::new("role", "aws:iam/role:Role"),
//!     ResourceDescriptor::new("fn", "aws:lambda/function:Function")
//!         .with_arg("role", ArgValue::reference("role", "arn")),
//! ])?;
//! let plan = ExecutionPlan::from_graph(&graph);
//!
//! let engine = |_kind: &ResourceKind, id: &str, _args: &Value| -> anyhow::Result<Attributes> {
//!     Ok(Attributes::from([("arn".to_string(), json!(format!("arn:aws:{id}")))]))
//! };
//!
//! let report = execute_simple(&graph, &plan, &engine, StateMap::new())?;
//! assert!(report.is_success());
//! assert_eq!(export("fn", "fn", "arn", &report.states)?, json!("arn:aws:fn"));
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Provider Traits
//!
//! The crate uses traits for dependency injection:
//!
//! - [`Provisioner`]: the external engine that creates, updates and
//!   deletes real resources
//! - [`ProgressCallback`]: Receives progress updates
//! - [`ConfirmCallback`]: Handles user confirmations
//!
//! This keeps the crate free of cloud SDKs and terminal UI libraries.

pub mod context;
pub mod diff;
pub mod error;
pub mod executor;
pub mod export;
pub mod graph;
pub mod planner;
pub mod resource;
pub mod types;

// Re-export main types at crate root
pub use context::{
    AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, ProgressCallback, Provisioner,
};
pub use diff::{
    ChangeKind, DiffSummary, ResourceDiff, compute_diffs, compute_removals, group_by_type,
};
pub use error::{Error, Result};
pub use executor::{RunReport, destroy, execute, execute_simple};
pub use export::{OutputSpec, Outputs, export};
pub use graph::DependencyGraph;
pub use planner::ExecutionPlan;
pub use resource::{ArgValue, ResourceDescriptor};
pub use types::{
    ApplyResult, Attributes, ExecuteOptions, ExecuteSummary, ResourceKind, ResourceState,
    ResourceStatus, StateMap,
};
