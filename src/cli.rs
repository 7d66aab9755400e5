use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::engine::EngineKind;
use crate::paths::{ENV_STACK_FILE, ENV_STATE_DIR};

#[derive(Parser)]
#[command(name = "stackgraph")]
#[command(version)]
#[command(about = "Provision a stack of dependent cloud resources in order", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Stack file (default: ./stack.toml)
    #[arg(short = 'f', long = "file", global = true, env = ENV_STACK_FILE)]
    pub file: Option<PathBuf>,

    /// Directory holding state files
    #[arg(long, global = true, env = ENV_STATE_DIR)]
    pub state_dir: Option<PathBuf>,

    /// Set an input value (NAME=VALUE, repeatable)
    #[arg(long = "set", value_name = "NAME=VALUE", global = true)]
    pub set: Vec<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check the stack file, references and dependency cycles
    Validate,

    /// Print the dependency graph
    Graph {
        /// Emit Graphviz DOT instead of a listing
        #[arg(long)]
        dot: bool,
    },

    /// Show the execution order and predicted changes
    Plan(PlanArgs),

    /// Create or update resources in dependency order
    Apply(ApplyArgs),

    /// Delete resources in reverse dependency order
    Destroy(DestroyArgs),

    /// Show recorded state for each resource
    State,

    /// Print exported outputs
    Outputs {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Plan / Apply / Destroy
// ============================================================================

#[derive(Parser)]
pub struct PlanArgs {
    /// Only plan these resources and what they depend on
    #[arg(short, long, value_delimiter = ',')]
    pub target: Vec<String>,

    /// Show the teardown order instead
    #[arg(long)]
    pub destroy: bool,
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Only apply these resources and what they depend on
    #[arg(short, long, value_delimiter = ',')]
    pub target: Vec<String>,

    /// Number of resources provisioned concurrently
    #[arg(short, long, default_value = "1")]
    pub jobs: u8,

    /// Show what would be done without provisioning
    #[arg(long)]
    pub dry_run: bool,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Override the engine declared in the stack file
    #[arg(long, value_enum)]
    pub engine: Option<EngineKind>,
}

#[derive(Parser)]
pub struct DestroyArgs {
    /// Show what would be deleted without deleting
    #[arg(long)]
    pub dry_run: bool,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Override the engine declared in the stack file
    #[arg(long, value_enum)]
    pub engine: Option<EngineKind>,
}
