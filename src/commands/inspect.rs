//! Read-only commands: validate, graph, state, outputs

use anyhow::{Context as _, Result};
use colored::Colorize;
use provision::{ExecutionPlan, ResourceStatus};

use super::Workspace;
use crate::Context;
use crate::ui;

pub fn validate(ctx: &Context) -> Result<()> {
    let ws = Workspace::load(ctx)?;

    ui::success(&format!(
        "Stack '{}' is valid: {} resources, {} dependencies, {} outputs",
        ws.stack.name,
        ws.graph.len(),
        ws.graph.edge_count(),
        ws.stack.outputs.len()
    ));
    if ctx.verbose > 0 {
        ui::kv("file", &ws.stack_path.display().to_string());
        ui::kv("engine", &format!("{:?}", ws.stack.engine.kind).to_lowercase());
        let inputs = ws.stack.input_names();
        if !inputs.is_empty() {
            ui::kv("inputs", &inputs.join(", "));
        }
    }
    Ok(())
}

pub fn graph(ctx: &Context, dot: bool) -> Result<()> {
    let ws = Workspace::load(ctx)?;

    if dot {
        print!("{}", ws.graph.to_dot());
        return Ok(());
    }

    ui::header(&format!("Stack {}", ws.stack.name));
    let plan = ExecutionPlan::from_graph(&ws.graph);
    for id in plan.iter() {
        let kind = ws
            .graph
            .descriptor(id)
            .map(|d| d.kind().to_string())
            .unwrap_or_default();
        println!("  {} {}", id.bold(), kind.dimmed());
        for producer in ws.graph.producers(id) {
            println!("    {} {}", "←".cyan(), producer);
        }
    }
    Ok(())
}

pub fn state(ctx: &Context) -> Result<()> {
    let ws = Workspace::load(ctx)?;
    let path = crate::state::StackState::path(&ws.state_dir, &ws.stack.name);

    ui::header(&format!("State of {}", ws.stack.name));
    ui::kv("file", &path.display().to_string());
    ui::kv(
        "updated",
        &ws.state.last_updated.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );
    println!();

    let plan = ExecutionPlan::from_graph(&ws.graph);
    for id in plan.iter() {
        let state = ws.state.resources.get(id).cloned().unwrap_or_default();
        let status = match state.status {
            ResourceStatus::Created => "created".green(),
            ResourceStatus::Failed => "failed".red(),
            ResourceStatus::Creating => "creating".yellow(),
            ResourceStatus::Pending => "pending".dimmed(),
        };
        let detail = state
            .attribute("arn")
            .or_else(|| state.attribute("id"))
            .map(ui::format_value)
            .unwrap_or_default();
        println!("  {:<10} {:<30} {}", status, id, ui::truncate(&detail, 60).dimmed());
        if let Some(err) = &state.error {
            ui::dim(&format!("           {err}"));
        }
    }
    ws.warn_orphans();
    Ok(())
}

pub fn outputs(ctx: &Context, json: bool) -> Result<()> {
    let ws = Workspace::load(ctx)?;

    if json {
        let text = serde_json::to_string_pretty(&ws.state.outputs)
            .context("Failed to serialize outputs")?;
        println!("{text}");
        return Ok(());
    }

    if ws.state.outputs.is_empty() {
        ui::info("No outputs recorded; run apply first");
        return Ok(());
    }
    for (name, value) in ws.state.outputs.iter() {
        ui::kv(name, &ui::format_value(value));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn test_validate_reports_cycle() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("stack.toml");
        std::fs::write(
            &file,
            r#"
name = "loop"

[[resources]]
name = "a"
kind = "t"
args = { x = { ref = "b", attr = "id" } }

[[resources]]
name = "b"
kind = "t"
args = { x = { ref = "a", attr = "id" } }
"#,
        )
        .unwrap();
        let ctx = Context {
            verbose: 0,
            quiet: true,
            file: Some(file),
            state_dir: Some(dir.path().join("state")),
            inputs: BTreeMap::new(),
        };

        let err = validate(&ctx).unwrap_err();
        assert!(format!("{err:#}").contains("a -> b -> a"));
    }
}
