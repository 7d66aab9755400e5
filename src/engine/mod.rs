//! Provisioning engines - what actually creates resources

pub mod command;
pub mod simulate;

use anyhow::{Context, Result};
use clap::ValueEnum;
use provision::Provisioner;
use serde::{Deserialize, Serialize};

use crate::stack::EngineConfig;

/// Available engines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Deterministic in-process fake
    #[default]
    Simulate,
    /// External program speaking JSON on stdin/stdout
    Command,
}

/// Build the engine for a stack, optionally overriding its kind
pub fn build(config: &EngineConfig, kind: Option<EngineKind>) -> Result<Box<dyn Provisioner>> {
    let kind = kind.unwrap_or(config.kind);
    log::debug!("Using {kind:?} engine");

    Ok(match kind {
        EngineKind::Simulate => Box::new(simulate::SimulateEngine::new()),
        EngineKind::Command => {
            let program = config
                .command
                .as_deref()
                .context("The command engine needs engine.command in the stack file")?;
            Box::new(command::CommandEngine::new(program, config.args.clone()))
        }
    })
}
