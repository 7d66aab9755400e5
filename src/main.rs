mod cli;
mod commands;
mod engine;
mod paths;
mod progress;
mod stack;
mod state;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    /// Stack file from `-f` or `STACKGRAPH_STACK`
    pub file: Option<PathBuf>,
    /// State directory from `--state-dir` or `STACKGRAPH_STATE_DIR`
    pub state_dir: Option<PathBuf>,
    /// Inputs given with `--set`
    pub inputs: BTreeMap<String, Value>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            ui::error(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let inputs = cli
        .set
        .iter()
        .map(|raw| stack::parse_override(raw))
        .collect::<Result<BTreeMap<_, _>>>()?;

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        file: cli.file,
        state_dir: cli.state_dir,
        inputs,
    };

    match cli.command {
        Command::Validate => commands::inspect::validate(&ctx),
        Command::Graph { dot } => commands::inspect::graph(&ctx, dot),
        Command::Plan(args) => commands::plan::run(&ctx, args),
        Command::Apply(args) => commands::apply::run(&ctx, args),
        Command::Destroy(args) => commands::destroy::run(&ctx, args),
        Command::State => commands::inspect::state(&ctx),
        Command::Outputs { json } => commands::inspect::outputs(&ctx, json),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "stackgraph", &mut io::stdout());
            Ok(())
        }
    }
}
