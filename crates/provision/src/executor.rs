//! Execution driver - walks a plan and drives the provisioner
//!
//! Resources are processed in plan order. Before each provisioning call
//! the driver substitutes producer attributes into the resource's
//! arguments, so every call receives concrete values. The first failure
//! stops any further resource from starting; the returned state map keeps
//! everything created so far so a later run can resume from it.

use crate::context::{ConfirmCallback, ProgressCallback, Provisioner};
use crate::diff::{DiffSummary, compute_diffs, compute_removals};
use crate::error::Error;
use crate::graph::DependencyGraph;
use crate::planner::ExecutionPlan;
use crate::types::{
    ApplyResult, Attributes, ExecuteOptions, ExecuteSummary, ResourceKind, ResourceState,
    ResourceStatus, StateMap,
};
use anyhow::Result;
use rayon::prelude::*;
use serde_json::Value;

/// Outcome of one run over a plan
#[derive(Debug)]
pub struct RunReport {
    /// State of every resource after the run
    pub states: StateMap,
    /// Per-resource result, in the order resources were processed
    pub results: Vec<(String, ApplyResult)>,
    pub summary: ExecuteSummary,
    /// The failure that stopped the run, if any
    pub error: Option<Error>,
}

impl RunReport {
    fn new(states: StateMap) -> Self {
        Self {
            states,
            results: Vec::new(),
            summary: ExecuteSummary::default(),
            error: None,
        }
    }

    /// Check if the run completed without failure
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Result recorded for a resource
    pub fn result(&self, id: &str) -> Option<&ApplyResult> {
        self.results.iter().find(|(r, _)| r == id).map(|(_, res)| res)
    }

    /// Status of a resource after the run
    pub fn status(&self, id: &str) -> ResourceStatus {
        self.states.get(id).map(|s| s.status).unwrap_or_default()
    }

    fn record(&mut self, id: &str, result: ApplyResult) {
        self.summary.add_result(&result);
        self.results.push((id.to_string(), result));
    }
}

/// What the driver decided to do with one resource
enum Step {
    Ready(Call),
    Settled(Settled),
}

/// A decision that needs no provisioning call
enum Settled {
    Skip(String),
    /// Carries the arguments to record when the state had none
    Unchanged(Option<Value>),
    Fail(Error),
}

/// A provisioning call ready to be made
struct Call {
    id: String,
    kind: ResourceKind,
    args: Value,
    /// Attributes of the existing resource when this is an update
    current: Option<Attributes>,
}

impl Call {
    fn run(&self, provisioner: &dyn Provisioner) -> Result<Attributes> {
        match &self.current {
            Some(current) => provisioner.update(&self.kind, &self.id, &self.args, current),
            None => provisioner.create(&self.kind, &self.id, &self.args),
        }
    }
}

/// Execute a plan with the given options and callbacks
///
/// # Arguments
/// * `graph` - The validated dependency graph
/// * `plan` - Creation order (full or targeted)
/// * `provisioner` - External engine invoked once per resource that needs it
/// * `states` - State recorded by a previous run (empty for a fresh run)
/// * `opts` - Execution options (dry_run, jobs)
/// * `progress` - Progress callback
/// * `confirm` - Confirmation callback, asked only when changes are predicted
///
/// # Returns
/// A report holding the final state map. A provisioning failure is not an
/// `Err`: it is carried in [`RunReport::error`] next to the partial state.
pub fn execute<P, C>(
    graph: &DependencyGraph,
    plan: &ExecutionPlan,
    provisioner: &dyn Provisioner,
    states: StateMap,
    opts: &ExecuteOptions,
    progress: &mut P,
    confirm: &mut C,
) -> Result<RunReport>
where
    P: ProgressCallback,
    C: ConfirmCallback,
{
    let mut states = states;
    for id in plan.iter() {
        let state = states.entry(id.to_string()).or_default();
        // A call that never completed leaves no provider-side record we know of
        if state.status == ResourceStatus::Creating {
            state.status = if state.attributes.is_empty() {
                ResourceStatus::Pending
            } else {
                ResourceStatus::Failed
            };
        }
    }

    let diffs = compute_diffs(graph, plan, &states);
    let has_changes = DiffSummary::from_diffs(&diffs).has_changes();
    let mut report = RunReport::new(states);

    if opts.dry_run {
        for diff in &diffs {
            let result = if diff.is_change() {
                ApplyResult::Skipped {
                    reason: "dry run".into(),
                }
            } else {
                ApplyResult::Unchanged
            };
            report.record(&diff.resource_id, result);
        }
        return Ok(report);
    }

    if has_changes && !confirm.confirm("Apply changes?")? {
        for id in plan.iter() {
            report.record(
                id,
                ApplyResult::Skipped {
                    reason: "declined".into(),
                },
            );
        }
        return Ok(report);
    }

    progress.on_plan_start(plan.len());
    if opts.jobs <= 1 {
        run_sequential(graph, plan, provisioner, &mut report, progress);
    } else {
        run_waves(graph, plan, provisioner, opts.jobs, &mut report, progress)?;
    }
    progress.on_plan_complete();

    if let Some(err) = &report.error {
        log::warn!("Run stopped: {err}");
    }
    Ok(report)
}

/// Simple execution without callbacks: sequential, auto-confirmed
pub fn execute_simple(
    graph: &DependencyGraph,
    plan: &ExecutionPlan,
    provisioner: &dyn Provisioner,
    states: StateMap,
) -> Result<RunReport> {
    use crate::context::{AutoConfirm, NoProgress};

    execute(
        graph,
        plan,
        provisioner,
        states,
        &ExecuteOptions::default(),
        &mut NoProgress,
        &mut AutoConfirm,
    )
}

fn run_sequential<P: ProgressCallback>(
    graph: &DependencyGraph,
    plan: &ExecutionPlan,
    provisioner: &dyn Provisioner,
    report: &mut RunReport,
    progress: &mut P,
) {
    for id in plan.iter() {
        if let Some(reason) = halted(report) {
            report.record(id, ApplyResult::Skipped { reason });
            continue;
        }

        match prepare(graph, id, &report.states) {
            Step::Ready(call) => {
                begin(&call, report, progress);
                let outcome = call.run(provisioner);
                commit(call, outcome, report, progress);
            }
            Step::Settled(settled) => settle(id, settled, report, progress),
        }
    }
}

/// Run each wave of independent resources on a thread pool
///
/// In-flight calls of a wave always run to completion; no later wave is
/// started once any resource has failed.
fn run_waves<P: ProgressCallback>(
    graph: &DependencyGraph,
    plan: &ExecutionPlan,
    provisioner: &dyn Provisioner,
    jobs: usize,
    report: &mut RunReport,
    progress: &mut P,
) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create provisioning thread pool: {}", e))?;

    for wave in plan.waves(graph) {
        let mut calls = Vec::new();
        for id in &wave {
            if let Some(reason) = halted(report) {
                report.record(id, ApplyResult::Skipped { reason });
                continue;
            }
            match prepare(graph, id, &report.states) {
                Step::Ready(call) => {
                    begin(&call, report, progress);
                    calls.push(call);
                }
                Step::Settled(settled) => settle(id, settled, report, progress),
            }
        }

        if calls.is_empty() {
            continue;
        }
        log::debug!("Provisioning wave of {} resources", calls.len());

        let outcomes: Vec<Result<Attributes>> = pool.install(|| {
            calls
                .par_iter()
                .map(|call| call.run(provisioner))
                .collect()
        });

        for (call, outcome) in calls.into_iter().zip(outcomes) {
            commit(call, outcome, report, progress);
        }
    }

    Ok(())
}

fn halted(report: &RunReport) -> Option<String> {
    report.error.as_ref().map(|err| match err.resource() {
        Some(resource) => format!("halted after failure of '{resource}'"),
        None => "halted after failure".to_string(),
    })
}

/// Decide what to do with a resource, resolving its arguments
fn prepare(graph: &DependencyGraph, id: &str, states: &StateMap) -> Step {
    let Some(descriptor) = graph.descriptor(id) else {
        return Step::Settled(Settled::Skip(format!("'{id}' is not part of the graph")));
    };

    if let Some(waiting) = graph
        .producers(id)
        .into_iter()
        .find(|p| !states.get(*p).is_some_and(ResourceState::is_created))
    {
        return Step::Settled(Settled::Skip(format!(
            "producer '{waiting}' is not created"
        )));
    }

    let args = match descriptor.resolve_args(|resource, attribute| {
        states
            .get(resource)
            .and_then(|s| s.attribute(attribute))
            .cloned()
            .ok_or_else(|| Error::MissingAttribute {
                resource: resource.to_string(),
                attribute: attribute.to_string(),
            })
    }) {
        Ok(args) => args,
        Err(err) => return Step::Settled(Settled::Fail(err)),
    };

    let state = states.get(id).cloned().unwrap_or_default();
    if state.is_created() {
        match &state.applied_args {
            Some(applied) if *applied == args => {
                return Step::Settled(Settled::Unchanged(None));
            }
            // Created outside this tool's record keeping: adopt the current arguments
            None => return Step::Settled(Settled::Unchanged(Some(args))),
            Some(_) => {}
        }
    }

    Step::Ready(Call {
        id: id.to_string(),
        kind: descriptor.kind().clone(),
        args,
        current: state.exists().then_some(state.attributes),
    })
}

/// Record a step that needs no provisioning call
fn settle<P: ProgressCallback>(
    id: &str,
    settled: Settled,
    report: &mut RunReport,
    progress: &mut P,
) {
    let result = match settled {
        Settled::Skip(reason) => ApplyResult::Skipped { reason },
        Settled::Unchanged(baseline) => {
            log::debug!("{id}: unchanged");
            if let Some(args) = baseline {
                report.states.entry(id.to_string()).or_default().applied_args = Some(args);
            }
            ApplyResult::Unchanged
        }
        Settled::Fail(err) => {
            let state = report.states.entry(id.to_string()).or_default();
            state.status = ResourceStatus::Failed;
            state.error = Some(err.to_string());
            let result = ApplyResult::Failed {
                error: err.to_string(),
            };
            report.error = Some(err);
            result
        }
    };
    progress.on_resource_complete(id, &result);
    report.record(id, result);
}

fn begin<P: ProgressCallback>(call: &Call, report: &mut RunReport, progress: &mut P) {
    let action = if call.current.is_some() {
        "Updating"
    } else {
        "Creating"
    };
    log::info!("{action} {} ({})", call.id, call.kind);
    report.states.entry(call.id.clone()).or_default().status = ResourceStatus::Creating;
    progress.on_resource_start(&call.id, &call.kind);
}

fn commit<P: ProgressCallback>(
    call: Call,
    outcome: Result<Attributes>,
    report: &mut RunReport,
    progress: &mut P,
) {
    let state = report.states.entry(call.id.clone()).or_default();
    let result = match outcome {
        Ok(attributes) => {
            state.status = ResourceStatus::Created;
            state.attributes = attributes;
            state.applied_args = Some(call.args);
            state.error = None;
            if call.current.is_some() {
                ApplyResult::Updated
            } else {
                ApplyResult::Created
            }
        }
        Err(source) => {
            let message = format!("{source:#}");
            log::warn!("{} failed: {message}", call.id);
            state.status = ResourceStatus::Failed;
            state.error = Some(message.clone());
            if report.error.is_none() {
                report.error = Some(Error::ProvisionFailure {
                    resource: call.id.clone(),
                    source,
                });
            }
            ApplyResult::Failed { error: message }
        }
    };
    progress.on_resource_complete(&call.id, &result);
    report.record(&call.id, result);
}

/// Tear down every existing resource of a plan, in reverse order
///
/// Deleted resources are reset to a fresh `Pending` state. The first
/// failed deletion stops the teardown; producers of a resource that could
/// not be deleted are left in place.
pub fn destroy<P, C>(
    graph: &DependencyGraph,
    plan: &ExecutionPlan,
    provisioner: &dyn Provisioner,
    states: StateMap,
    opts: &ExecuteOptions,
    progress: &mut P,
    confirm: &mut C,
) -> Result<RunReport>
where
    P: ProgressCallback,
    C: ConfirmCallback,
{
    let removals = compute_removals(graph, plan, &states);
    let mut report = RunReport::new(states);

    if removals.is_empty() {
        return Ok(report);
    }

    if opts.dry_run || !confirm.confirm("Destroy resources?")? {
        let reason = if opts.dry_run { "dry run" } else { "declined" };
        for diff in &removals {
            report.record(
                &diff.resource_id,
                ApplyResult::Skipped {
                    reason: reason.into(),
                },
            );
        }
        return Ok(report);
    }

    progress.on_plan_start(removals.len());
    for diff in &removals {
        let id = diff.resource_id.as_str();
        if let Some(reason) = halted(&report) {
            report.record(id, ApplyResult::Skipped { reason });
            continue;
        }
        let Some(descriptor) = graph.descriptor(id) else {
            continue;
        };

        log::info!("Deleting {id} ({})", descriptor.kind());
        progress.on_resource_start(id, descriptor.kind());

        let attributes = report
            .states
            .get(id)
            .map(|s| s.attributes.clone())
            .unwrap_or_default();

        let result = match provisioner.delete(descriptor.kind(), id, &attributes) {
            Ok(()) => {
                report.states.insert(id.to_string(), ResourceState::default());
                ApplyResult::Removed
            }
            Err(source) => {
                let message = format!("{source:#}");
                log::warn!("{id} could not be deleted: {message}");
                if let Some(state) = report.states.get_mut(id) {
                    state.error = Some(message.clone());
                }
                report.error = Some(Error::TeardownFailure {
                    resource: id.to_string(),
                    source,
                });
                ApplyResult::Failed { error: message }
            }
        };
        progress.on_resource_complete(id, &result);
        report.record(id, result);
    }
    progress.on_plan_complete();

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{AutoConfirm, AutoDecline, NoProgress};
    use crate::resource::{ArgValue, ResourceDescriptor};
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every call and fails on the configured resources
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
        args: Mutex<Vec<(String, Value)>>,
        fail_on: Vec<String>,
    }

    impl Recorder {
        fn failing(ids: &[&str]) -> Self {
            Self {
                fail_on: ids.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn args_of(&self, id: &str) -> Value {
            self.args
                .lock()
                .unwrap()
                .iter()
                .find(|(i, _)| i == id)
                .map(|(_, a)| a.clone())
                .unwrap()
        }

        fn attributes(id: &str) -> Attributes {
            Attributes::from([
                ("id".to_string(), json!(format!("{id}-0001"))),
                ("arn".to_string(), json!(format!("arn:test:{id}"))),
            ])
        }
    }

    impl Provisioner for Recorder {
        fn create(&self, _kind: &ResourceKind, id: &str, args: &Value) -> Result<Attributes> {
            self.calls.lock().unwrap().push(format!("create:{id}"));
            self.args.lock().unwrap().push((id.to_string(), args.clone()));
            if self.fail_on.iter().any(|f| f == id) {
                anyhow::bail!("provider rejected {id}");
            }
            Ok(Self::attributes(id))
        }

        fn update(
            &self,
            _kind: &ResourceKind,
            id: &str,
            args: &Value,
            _current: &Attributes,
        ) -> Result<Attributes> {
            self.calls.lock().unwrap().push(format!("update:{id}"));
            self.args.lock().unwrap().push((id.to_string(), args.clone()));
            Ok(Self::attributes(id))
        }

        fn delete(&self, _kind: &ResourceKind, id: &str, _attributes: &Attributes) -> Result<()> {
            self.calls.lock().unwrap().push(format!("delete:{id}"));
            if self.fail_on.iter().any(|f| f == id) {
                anyhow::bail!("resource {id} is still in use");
            }
            Ok(())
        }
    }

    /// A (no deps) <- B (A.arn) <- C (B.id)
    fn chain() -> DependencyGraph {
        DependencyGraph::build(vec![
            ResourceDescriptor::new("A", "test:a").with_arg("size", ArgValue::literal(1)),
            ResourceDescriptor::new("B", "test:b").with_arg("parent", ArgValue::reference("A", "arn")),
            ResourceDescriptor::new("C", "test:c").with_arg("parent", ArgValue::reference("B", "id")),
        ])
        .unwrap()
    }

    fn run(graph: &DependencyGraph, recorder: &Recorder, states: StateMap) -> RunReport {
        let plan = ExecutionPlan::from_graph(graph);
        execute_simple(graph, &plan, recorder, states).unwrap()
    }

    #[test]
    fn test_calls_follow_plan_and_pass_attributes() {
        let graph = chain();
        let recorder = Recorder::default();
        let report = run(&graph, &recorder, StateMap::new());

        assert!(report.is_success());
        assert_eq!(recorder.calls(), vec!["create:A", "create:B", "create:C"]);
        assert_eq!(recorder.args_of("B"), json!({"parent": "arn:test:A"}));
        assert_eq!(recorder.args_of("C"), json!({"parent": "B-0001"}));
        assert_eq!(report.summary.created, 3);
        assert!(report.states.values().all(ResourceState::is_created));
    }

    #[test]
    fn test_failure_halts_dependents() {
        let graph = chain();
        let recorder = Recorder::failing(&["B"]);
        let report = run(&graph, &recorder, StateMap::new());

        assert_eq!(recorder.calls(), vec!["create:A", "create:B"]);
        assert_eq!(report.status("A"), ResourceStatus::Created);
        assert_eq!(report.status("B"), ResourceStatus::Failed);
        assert_eq!(report.status("C"), ResourceStatus::Pending);
        assert!(matches!(
            report.error,
            Some(Error::ProvisionFailure { ref resource, .. }) if resource == "B"
        ));
        assert!(matches!(report.result("C"), Some(ApplyResult::Skipped { .. })));
        assert_eq!(
            report.states["B"].error.as_deref(),
            Some("provider rejected B")
        );
    }

    #[test]
    fn test_failure_halts_independent_resources_too() {
        let graph = DependencyGraph::build(vec![
            ResourceDescriptor::new("first", "t"),
            ResourceDescriptor::new("second", "t"),
        ])
        .unwrap();
        let recorder = Recorder::failing(&["first"]);
        let report = run(&graph, &recorder, StateMap::new());

        assert_eq!(recorder.calls(), vec!["create:first"]);
        assert_eq!(report.status("second"), ResourceStatus::Pending);
    }

    #[test]
    fn test_resume_only_provisions_remaining() {
        let graph = chain();
        let first = run(&graph, &Recorder::failing(&["C"]), StateMap::new());
        assert_eq!(first.status("C"), ResourceStatus::Failed);

        let recorder = Recorder::default();
        let second = run(&graph, &recorder, first.states);

        assert!(second.is_success());
        assert_eq!(recorder.calls(), vec!["create:C"]);
        assert_eq!(second.result("A"), Some(&ApplyResult::Unchanged));
        assert_eq!(second.result("B"), Some(&ApplyResult::Unchanged));
        assert_eq!(second.result("C"), Some(&ApplyResult::Created));
    }

    #[test]
    fn test_resume_from_state_without_recorded_args() {
        let graph = chain();
        let mut states = StateMap::new();
        for id in ["A", "B"] {
            states.insert(
                id.to_string(),
                ResourceState {
                    status: ResourceStatus::Created,
                    attributes: Recorder::attributes(id),
                    ..ResourceState::default()
                },
            );
        }

        let recorder = Recorder::default();
        let report = run(&graph, &recorder, states);

        assert_eq!(recorder.calls(), vec!["create:C"]);
        assert_eq!(report.result("A"), Some(&ApplyResult::Unchanged));
        assert_eq!(report.result("B"), Some(&ApplyResult::Unchanged));
        assert_eq!(report.result("C"), Some(&ApplyResult::Created));
        assert_eq!(recorder.args_of("C"), json!({"parent": "B-0001"}));
        // The arguments seen now become the baseline for later runs
        assert_eq!(report.states["A"].applied_args, Some(json!({"size": 1})));
        assert_eq!(
            report.states["B"].applied_args,
            Some(json!({"parent": "arn:test:A"}))
        );
    }

    #[test]
    fn test_resume_after_failed_middle() {
        let graph = chain();
        let first = run(&graph, &Recorder::failing(&["B"]), StateMap::new());

        let recorder = Recorder::default();
        let second = run(&graph, &recorder, first.states);
        assert_eq!(recorder.calls(), vec!["create:B", "create:C"]);
        assert_eq!(second.summary.unchanged, 1);
    }

    #[test]
    fn test_changed_args_update_existing_resource() {
        let graph = chain();
        let first = run(&graph, &Recorder::default(), StateMap::new());

        let changed = DependencyGraph::build(vec![
            ResourceDescriptor::new("A", "test:a").with_arg("size", ArgValue::literal(2)),
            ResourceDescriptor::new("B", "test:b").with_arg("parent", ArgValue::reference("A", "arn")),
            ResourceDescriptor::new("C", "test:c").with_arg("parent", ArgValue::reference("B", "id")),
        ])
        .unwrap();

        let recorder = Recorder::default();
        let second = run(&changed, &recorder, first.states);

        // A's attributes come back identical, so B and C keep their args
        assert_eq!(recorder.calls(), vec!["update:A"]);
        assert_eq!(second.result("A"), Some(&ApplyResult::Updated));
        assert_eq!(second.summary.unchanged, 2);
    }

    #[test]
    fn test_missing_attribute_fails_consumer() {
        let graph = DependencyGraph::build(vec![
            ResourceDescriptor::new("A", "t"),
            ResourceDescriptor::new("B", "t").with_arg("x", ArgValue::reference("A", "url")),
        ])
        .unwrap();
        let recorder = Recorder::default();
        let report = run(&graph, &recorder, StateMap::new());

        assert_eq!(recorder.calls(), vec!["create:A"]);
        assert_eq!(report.status("B"), ResourceStatus::Failed);
        assert!(matches!(report.error, Some(Error::MissingAttribute { .. })));
    }

    #[test]
    fn test_parallel_waves_respect_dependencies() {
        let graph = DependencyGraph::build(vec![
            ResourceDescriptor::new("role", "t"),
            ResourceDescriptor::new("sg", "t"),
            ResourceDescriptor::new("fn", "t")
                .with_arg("role", ArgValue::reference("role", "arn"))
                .with_arg("sg", ArgValue::reference("sg", "id")),
            ResourceDescriptor::new("api", "t"),
        ])
        .unwrap();
        let plan = ExecutionPlan::from_graph(&graph);
        let recorder = Recorder::default();
        let opts = ExecuteOptions {
            jobs: 4,
            ..Default::default()
        };

        let report = execute(
            &graph,
            &plan,
            &recorder,
            StateMap::new(),
            &opts,
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap();

        assert!(report.is_success());
        let calls = recorder.calls();
        let pos = |id: &str| calls.iter().position(|c| c == &format!("create:{id}")).unwrap();
        assert!(pos("role") < pos("fn"));
        assert!(pos("sg") < pos("fn"));
        assert_eq!(report.summary.created, 4);
        assert_eq!(
            recorder.args_of("fn"),
            json!({"role": "arn:test:role", "sg": "sg-0001"})
        );
    }

    #[test]
    fn test_parallel_failure_stops_later_waves() {
        let graph = chain();
        let plan = ExecutionPlan::from_graph(&graph);
        let recorder = Recorder::failing(&["A"]);
        let opts = ExecuteOptions {
            jobs: 2,
            ..Default::default()
        };

        let report = execute(
            &graph,
            &plan,
            &recorder,
            StateMap::new(),
            &opts,
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap();

        assert_eq!(recorder.calls(), vec!["create:A"]);
        assert_eq!(report.status("B"), ResourceStatus::Pending);
        assert_eq!(report.status("C"), ResourceStatus::Pending);
    }

    #[test]
    fn test_dry_run_and_decline_make_no_calls() {
        let graph = chain();
        let plan = ExecutionPlan::from_graph(&graph);
        let recorder = Recorder::default();

        let dry = ExecuteOptions {
            dry_run: true,
            ..Default::default()
        };
        let report = execute(
            &graph,
            &plan,
            &recorder,
            StateMap::new(),
            &dry,
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap();
        assert_eq!(report.summary.skipped, 3);

        let report = execute(
            &graph,
            &plan,
            &recorder,
            StateMap::new(),
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut AutoDecline,
        )
        .unwrap();
        assert_eq!(report.summary.skipped, 3);
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn test_destroy_in_reverse_order() {
        let graph = chain();
        let plan = ExecutionPlan::from_graph(&graph);
        let created = run(&graph, &Recorder::default(), StateMap::new());

        let recorder = Recorder::default();
        let report = destroy(
            &graph,
            &plan,
            &recorder,
            created.states,
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap();

        assert_eq!(recorder.calls(), vec!["delete:C", "delete:B", "delete:A"]);
        assert_eq!(report.summary.removed, 3);
        assert!(report.states.values().all(|s| s.status == ResourceStatus::Pending));
    }

    #[test]
    fn test_destroy_stops_on_failure() {
        let graph = chain();
        let plan = ExecutionPlan::from_graph(&graph);
        let created = run(&graph, &Recorder::default(), StateMap::new());

        let recorder = Recorder::failing(&["B"]);
        let report = destroy(
            &graph,
            &plan,
            &recorder,
            created.states,
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap();

        assert_eq!(recorder.calls(), vec!["delete:C", "delete:B"]);
        assert_eq!(report.status("A"), ResourceStatus::Created);
        assert_eq!(report.status("B"), ResourceStatus::Created);
        assert!(matches!(report.error, Some(Error::TeardownFailure { .. })));
    }
}
