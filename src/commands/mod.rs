pub mod apply;
pub mod destroy;
pub mod inspect;
pub mod plan;

use anyhow::{Context as _, Result};
use provision::{DependencyGraph, ExecutionPlan};
use std::path::PathBuf;

use crate::Context;
use crate::paths;
use crate::stack::StackConfig;
use crate::state::StackState;
use crate::ui;

/// Everything a command needs: stack, graph and recorded state
pub struct Workspace {
    pub stack_path: PathBuf,
    pub stack: StackConfig,
    pub graph: DependencyGraph,
    pub state_dir: PathBuf,
    pub state: StackState,
}

impl Workspace {
    /// Load the stack, resolve inputs, build the graph and read state
    pub fn load(ctx: &Context) -> Result<Self> {
        let stack_path = paths::stack_file(ctx.file.as_deref());
        let stack = StackConfig::load(&stack_path)?;
        let inputs = stack.inputs(ctx.inputs.clone());
        let graph = stack
            .build_graph(&inputs)
            .with_context(|| format!("Invalid stack '{}'", stack.name))?;

        let state_dir = paths::state_dir(ctx.state_dir.as_deref())?;
        let mut state = StackState::load(&state_dir, &stack.name)?;
        let pruned = state.prune(|id| graph.contains(id));
        if !pruned.is_empty() {
            log::debug!("Dropped state of undeclared resources: {}", pruned.join(", "));
        }

        Ok(Self {
            stack_path,
            stack,
            graph,
            state_dir,
            state,
        })
    }

    /// Full plan, or the plan for `targets` and their producers
    pub fn plan(&self, targets: &[String]) -> Result<ExecutionPlan> {
        if targets.is_empty() {
            Ok(ExecutionPlan::from_graph(&self.graph))
        } else {
            Ok(ExecutionPlan::targeted(&self.graph, targets)?)
        }
    }

    /// Resources recorded as existing but no longer declared
    pub fn orphans(&self) -> Vec<&str> {
        self.state
            .resources
            .iter()
            .filter(|(id, state)| state.exists() && !self.graph.contains(id.as_str()))
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn warn_orphans(&self) {
        let orphans = self.orphans();
        if !orphans.is_empty() {
            ui::warn(&format!(
                "State records resources no longer in the stack: {}",
                orphans.join(", ")
            ));
        }
    }
}
