use anyhow::Result;
use colored::Colorize;
use provision::{ExecuteOptions, ExecutionPlan, Outputs, RunReport, compute_removals, destroy};

use super::Workspace;
use super::apply::print_summary;
use super::plan::display_diff;
use crate::Context;
use crate::cli::DestroyArgs;
use crate::engine;
use crate::progress::{BarProgress, PromptConfirm};

pub fn run(ctx: &Context, args: DestroyArgs) -> Result<()> {
    let mut ws = Workspace::load(ctx)?;
    let plan = ExecutionPlan::from_graph(&ws.graph);

    let removals = compute_removals(&ws.graph, &plan, &ws.state.resources);
    display_diff(&removals);
    ws.warn_orphans();
    if removals.is_empty() {
        return Ok(());
    }

    let provisioner = engine::build(&ws.stack.engine, args.engine)?;
    let opts = ExecuteOptions {
        dry_run: args.dry_run,
        ..ExecuteOptions::default()
    };

    let report = destroy(
        &ws.graph,
        &plan,
        provisioner.as_ref(),
        ws.state.resources.clone(),
        &opts,
        &mut BarProgress::new(ctx.quiet),
        &mut PromptConfirm::new(args.yes, false),
    )?;

    if opts.dry_run {
        println!();
        println!("  {} Dry run - nothing deleted", "ℹ".blue());
        return Ok(());
    }
    if report.summary.removed == 0 && report.error.is_none() {
        println!();
        println!("  {} Aborted", "✗".red());
        return Ok(());
    }

    let (outputs, _) = Outputs::collect_partial(&ws.stack.output_specs(), &report.states);
    let RunReport {
        states,
        summary,
        error,
        ..
    } = report;
    ws.state.update(&ws.state_dir, states, outputs)?;

    print_summary(&summary);
    error.map_or(Ok(()), |err| Err(err.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ApplyArgs;
    use crate::commands::apply;
    use crate::state::StackState;
    use provision::ResourceStatus;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    const STACK: &str = r#"
name = "demo"

[[resources]]
name = "role"
kind = "aws:iam/role:Role"

[[resources]]
name = "fn"
kind = "aws:lambda/function:Function"
[resources.args]
role = { ref = "role", attr = "arn" }

[outputs]
fnArn = { ref = "fn", attr = "arn" }
"#;

    #[test]
    fn test_destroy_after_apply() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("stack.toml");
        std::fs::write(&file, STACK).unwrap();
        let ctx = Context {
            verbose: 0,
            quiet: true,
            file: Some(file),
            state_dir: Some(dir.path().join("state")),
            inputs: BTreeMap::new(),
        };

        apply::run(
            &ctx,
            ApplyArgs {
                target: Vec::new(),
                jobs: 1,
                dry_run: false,
                yes: true,
                engine: None,
            },
        )
        .unwrap();
        let applied = StackState::load(&dir.path().join("state"), "demo").unwrap();
        assert!(applied.outputs.get("fnArn").is_some());

        run(
            &ctx,
            DestroyArgs {
                dry_run: false,
                yes: true,
                engine: None,
            },
        )
        .unwrap();

        let state = StackState::load(&dir.path().join("state"), "demo").unwrap();
        assert!(
            state
                .resources
                .values()
                .all(|s| s.status == ResourceStatus::Pending && s.attributes.is_empty())
        );
        assert!(state.outputs.is_empty());
    }
}
