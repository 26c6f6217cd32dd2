use std::time::Duration;

use kirin_callgraph::Callable;
use kirin_fixpoint::lattice::WideningStrategy;
use kirin_fixpoint::{
    Analysis, AnalysisError, AnalysisKind, AnalyzeContext, Epoch, Fixpoint, FixpointConfig,
    FixpointError, FixpointState, Interrupt, Model, Reanalysis, Scheduler, SchedulerPolicy,
    WideningCheck,
};
use kirin_test_utils::{
    Height, HeightAnalysis, Reach, ReachAnalysis, ToyBody, ToyProgram, chain, cycle,
};

type Toy = (HeightAnalysis, ReachAnalysis);
type ToyModel = Model<(Option<Height>, Option<Reach>)>;

fn toy() -> Toy {
    (HeightAnalysis::default(), ReachAnalysis)
}

fn strict() -> FixpointConfig {
    FixpointConfig::default().with_widening_check(WideningCheck::Fail)
}

fn model(fixpoint: &Fixpoint<'_, ToyProgram, Toy>, callable: Callable) -> ToyModel {
    let stored = fixpoint
        .store()
        .get_model(callable)
        .unwrap_or_else(|| panic!("no model for {callable:?}"));
    Model::clone(&stored)
}

fn height(fixpoint: &Fixpoint<'_, ToyProgram, Toy>, callable: Callable) -> Height {
    model(fixpoint, callable).fragments.0.expect("height fragment")
}

// ---------------------------------------------------------------------------
// Termination and re-analysis
// ---------------------------------------------------------------------------

#[test]
fn test_cycle_of_n_terminates_within_n_plus_one_iterations() {
    for n in [1, 2, 3, 5, 8] {
        let (graph, members) = cycle(n, |index| {
            if index == n - 1 {
                ToyBody::new().with_source()
            } else {
                ToyBody::new()
            }
        });
        let dependencies = graph.dependency_graph();
        let analyses = (ReachAnalysis,);
        let mut fixpoint = Fixpoint::new(&graph, &dependencies, &analyses).with_config(strict());
        let report = fixpoint.compute(graph.analysis_order(), []).unwrap();

        assert!(
            report.iterations <= n + 1,
            "cycle of {n} took {} iterations",
            report.iterations
        );
        for member in members {
            let stored = fixpoint.store().get_model(member).unwrap();
            assert_eq!(stored.fragments, (Some(Reach(true)),));
            assert!(!stored.is_obscure);
        }
    }
}

fn frontier_after_first_batch(reanalysis: Reanalysis) -> (Vec<Callable>, [Callable; 3]) {
    let (graph, members) = chain();
    let dependencies = graph.dependency_graph();
    let analyses = toy();
    let mut fixpoint = Fixpoint::new(&graph, &dependencies, &analyses)
        .with_config(strict().with_reanalysis(reanalysis));

    let state = fixpoint.seed(graph.analysis_order(), []);
    let (state, summary) = fixpoint.iterate(state).unwrap();
    assert_eq!(summary.processed, 3);
    match state {
        FixpointState::Running {
            iteration: 1,
            frontier,
        } => (frontier, members),
        other => panic!("unexpected state {other:?}"),
    }
}

#[test]
fn test_reanalysis_schedules_direct_dependents() {
    let (frontier, [_, b, c]) = frontier_after_first_batch(Reanalysis::Dependents);
    assert_eq!(frontier, vec![c, b]);
}

#[test]
fn test_reanalysis_schedules_transitive_dependents() {
    let (frontier, [a, b, c]) = frontier_after_first_batch(Reanalysis::TransitiveDependents);
    assert_eq!(frontier, vec![c, b, a]);
}

#[test]
fn test_chain_propagates_to_every_caller() {
    for reanalysis in [Reanalysis::Dependents, Reanalysis::TransitiveDependents] {
        let (graph, [a, b, c]) = chain();
        let dependencies = graph.dependency_graph();
        let analyses = toy();
        let mut fixpoint = Fixpoint::new(&graph, &dependencies, &analyses)
            .with_config(strict().with_reanalysis(reanalysis));
        fixpoint.compute(graph.analysis_order(), []).unwrap();

        for callable in [a, b, c] {
            assert_eq!(height(&fixpoint, callable), Height(5));
        }
    }
}

#[test]
fn test_delayed_widening_stabilizes_growing_cycle() {
    let (graph, members) = cycle(2, |_| ToyBody::value(0).with_increment(1));
    let dependencies = graph.dependency_graph();
    let analyses = toy();
    let mut fixpoint = Fixpoint::new(&graph, &dependencies, &analyses).with_config(strict());
    let report = fixpoint.compute(graph.analysis_order(), []).unwrap();

    assert_eq!(report.iterations, 5);
    for member in members {
        assert_eq!(height(&fixpoint, member), Height(i64::MAX));
        assert!(!fixpoint.store().get_is_partial(member));
    }
}

#[test]
fn test_iteration_limit_reports_a_sample() {
    let (graph, _) = cycle(2, |_| ToyBody::value(0).with_increment(1));
    let dependencies = graph.dependency_graph();
    let analyses = (HeightAnalysis::new(WideningStrategy::Never),);
    let config = strict().with_max_iterations(5);

    let mut fixpoint = Fixpoint::new(&graph, &dependencies, &analyses).with_config(config.clone());
    let error = fixpoint.compute(graph.analysis_order(), []).unwrap_err();
    insta::assert_snapshot!(error, @"failed to reach a fixpoint after 5 iterations (2 callables left, including f0, f1)");

    let mut fixpoint = Fixpoint::new(&graph, &dependencies, &analyses)
        .with_config(config.with_divergence_sample(1));
    let error = fixpoint.compute(graph.analysis_order(), []).unwrap_err();
    assert!(matches!(
        &error,
        FixpointError::IterationLimit { iterations: 5, remaining: 2, sample } if sample == &["f0"]
    ));
}

// ---------------------------------------------------------------------------
// Overrides and callables without a body
// ---------------------------------------------------------------------------

#[test]
fn test_override_joins_available_implementations() {
    let mut graph = ToyProgram::new();
    let base = graph.function().name("Base.run").definition(ToyBody::value(3)).new();
    let child = graph.function().name("Child.run").definition(ToyBody::value(7)).new();
    let orphan = graph
        .function()
        .name("Orphan.run")
        .definition(ToyBody::value(100))
        .new();
    let dispatch = graph.override_of().implementation(base).name("run").new();
    graph.add_overriding(dispatch, child);
    graph.add_overriding(dispatch, orphan);
    let main = graph.function().name("main").definition(ToyBody::new()).new();
    graph.add_call(main, dispatch);

    // `Orphan.run` is not analyzed and has no summary: the override skips it.
    let callables: Vec<Callable> = graph
        .analysis_order()
        .into_iter()
        .filter(|callable| *callable != orphan)
        .collect();
    let dependencies = graph.dependency_graph();
    let analyses = toy();
    let mut fixpoint = Fixpoint::new(&graph, &dependencies, &analyses).with_config(strict());
    fixpoint.compute(callables, []).unwrap();

    assert_eq!(height(&fixpoint, dispatch), Height(7));
    assert_eq!(height(&fixpoint, main), Height(7));
    assert!(!fixpoint.store().has_model(orphan));
}

/// Call sites only ever see a summary clamped to `CAP`.
#[derive(Debug, Default)]
struct Capped;

impl Capped {
    const CAP: i64 = 10;
}

impl Analysis<ToyProgram> for Capped {
    type Model = i64;
    type Result = ();

    fn kind(&self) -> AnalysisKind {
        AnalysisKind::new("capped")
    }

    fn empty_model(&self) -> i64 {
        0
    }

    fn obscure_model(&self) -> i64 {
        i64::MAX
    }

    fn empty_result(&self) {}

    fn join(&self, _: usize, left: &i64, right: &i64) -> i64 {
        *left.max(right)
    }

    fn widen(&self, _: usize, previous: &i64, next: &i64) -> i64 {
        *previous.max(next)
    }

    fn reached_fixpoint(&self, _: usize, previous: &i64, next: &i64) -> bool {
        next <= previous
    }

    fn strip_for_callsite(&self, model: i64) -> i64 {
        model.min(Self::CAP)
    }

    fn analyze(
        &self,
        context: &AnalyzeContext<'_, ToyProgram, i64>,
        _: &i64,
    ) -> Result<((), i64), AnalysisError> {
        Ok(((), context.definition().value.unwrap_or(0)))
    }
}

#[test]
fn test_override_joins_stripped_implementations() {
    let mut graph = ToyProgram::new();
    let wide = graph.function().name("Wide.run").definition(ToyBody::value(30)).new();
    let small = graph.function().name("Small.run").definition(ToyBody::value(4)).new();
    let other = graph.function().name("Other.run").definition(ToyBody::value(6)).new();
    let tiny = graph.function().name("Tiny.run").definition(ToyBody::value(2)).new();
    let large = graph.function().name("Large.run").definition(ToyBody::value(25)).new();

    // The widest contribution is the direct implementation in one override
    // and an overriding implementation in the other.
    let by_base = graph.override_of().implementation(wide).name("by_base").new();
    graph.add_overriding(by_base, small);
    graph.add_overriding(by_base, other);
    let by_child = graph.override_of().implementation(tiny).name("by_child").new();
    graph.add_overriding(by_child, large);

    let dependencies = graph.dependency_graph();
    let analyses = (Capped,);
    let mut fixpoint = Fixpoint::new(&graph, &dependencies, &analyses).with_config(strict());
    fixpoint.compute(graph.analysis_order(), []).unwrap();

    let fragment = |callable| {
        let stored = fixpoint.store().get_model(callable).unwrap();
        stored.fragments.clone()
    };
    assert_eq!(fragment(wide), (Some(30),));
    assert_eq!(fragment(large), (Some(25),));
    assert_eq!(fragment(by_base), (Some(Capped::CAP),));
    assert_eq!(fragment(by_child), (Some(Capped::CAP),));
}

#[test]
fn test_override_without_implementations_is_empty() {
    let mut graph = ToyProgram::new();
    let base = graph.stub().name("Base.run").new();
    let dispatch = graph.override_of().implementation(base).new();
    let dependencies = graph.dependency_graph();
    let analyses = toy();
    let mut fixpoint = Fixpoint::new(&graph, &dependencies, &analyses).with_config(strict());

    // Only the override is analyzed; its implementation has no summary.
    fixpoint.compute(vec![dispatch], []).unwrap();
    assert_eq!(model(&fixpoint, dispatch), Model::empty());
}

#[test]
fn test_stubs_default_to_the_obscure_model() {
    let mut graph = ToyProgram::new();
    let external = graph.stub().name("extern").new();
    let f = graph.function().name("f").definition(ToyBody::value(1)).new();
    graph.add_call(f, external);
    let dependencies = graph.dependency_graph();
    let analyses = toy();
    let mut fixpoint = Fixpoint::new(&graph, &dependencies, &analyses).with_config(strict());
    fixpoint.compute(graph.analysis_order(), []).unwrap();

    let stub = model(&fixpoint, external);
    assert!(stub.is_obscure);
    assert_eq!(stub.fragments, (Some(Height(i64::MAX)), Some(Reach(true))));

    let caller = model(&fixpoint, f);
    assert!(!caller.is_obscure);
    assert_eq!(caller.fragments, (Some(Height(i64::MAX)), Some(Reach(true))));
    assert_eq!(
        fixpoint.store().get_result(f),
        Some((Some(Height(i64::MAX)), Some(vec![external])))
    );
}

#[test]
fn test_supplied_stub_model_is_kept() {
    let mut graph = ToyProgram::new();
    let external = graph.stub().name("extern").new();
    let f = graph.function().name("f").definition(ToyBody::value(1)).new();
    graph.add_call(f, external);
    let dependencies = graph.dependency_graph();
    let analyses = toy();
    let mut fixpoint = Fixpoint::new(&graph, &dependencies, &analyses).with_config(strict());

    let known: ToyModel = Model::new((Some(Height(4)), Some(Reach(false))));
    fixpoint
        .compute(graph.analysis_order(), [(external, known.clone())])
        .unwrap();

    assert_eq!(model(&fixpoint, external), known);
    assert_eq!(
        model(&fixpoint, f).fragments,
        (Some(Height(4)), Some(Reach(false)))
    );
}

#[test]
fn test_stub_depending_on_a_partial_callee_keeps_its_model() {
    let mut graph = ToyProgram::new();
    let c = graph.function().name("c").definition(ToyBody::value(5)).new();
    let shim = graph.stub().name("shim").new();
    graph.add_call(shim, c);
    let dependencies = graph.dependency_graph();
    let analyses = toy();
    let mut fixpoint = Fixpoint::new(&graph, &dependencies, &analyses).with_config(strict());

    let report = fixpoint.compute(vec![c, shim], []).unwrap();
    assert_eq!(report.iterations, 2);
    assert_eq!(report.processed, 4);
    let stub = model(&fixpoint, shim);
    assert!(stub.is_obscure);
    assert_eq!(stub.fragments, (Some(Height(i64::MAX)), Some(Reach(true))));
    assert!(!fixpoint.store().get_is_partial(shim));
    assert_eq!(height(&fixpoint, c), Height(5));
}

#[test]
fn test_rerun_starts_from_the_supplied_models() {
    let mut graph = ToyProgram::new();
    let f = graph.function().name("f").definition(ToyBody::value(2)).new();
    let dependencies = graph.dependency_graph();
    let analyses = toy();
    let mut fixpoint = Fixpoint::new(&graph, &dependencies, &analyses).with_config(strict());

    fixpoint.compute(vec![f], []).unwrap();
    assert_eq!(
        model(&fixpoint, f),
        Model::new((Some(Height(2)), Some(Reach(false))))
    );

    let seeded: ToyModel = Model::obscure((Some(Height(50)), None));
    fixpoint.compute(vec![f], [(f, seeded.clone())]).unwrap();
    assert_eq!(model(&fixpoint, f), seeded);
    assert_eq!(fixpoint.store().len(), 1);
}

#[test]
fn test_obscure_models_stay_obscure() {
    let mut graph = ToyProgram::new();
    let f = graph.function().name("f").definition(ToyBody::value(2)).new();
    let dependencies = graph.dependency_graph();
    let analyses = toy();
    let mut fixpoint = Fixpoint::new(&graph, &dependencies, &analyses).with_config(strict());

    let seeded: ToyModel = Model::obscure((Some(Height(0)), None));
    fixpoint.compute(vec![f], [(f, seeded)]).unwrap();
    let result = model(&fixpoint, f);
    assert!(result.is_obscure);
    assert_eq!(result.fragments, (Some(Height(2)), Some(Reach(false))));
}

#[test]
fn test_predefined_models_outside_the_run_are_visible() {
    let mut graph = ToyProgram::new();
    let library = graph.function().name("lib").definition(ToyBody::value(40)).new();
    let f = graph.function().name("f").definition(ToyBody::value(1)).new();
    graph.add_call(f, library);
    let dependencies = graph.dependency_graph();
    let analyses = toy();
    let mut fixpoint = Fixpoint::new(&graph, &dependencies, &analyses).with_config(strict());

    let summary: ToyModel = Model::new((Some(Height(9)), None));
    fixpoint.compute(vec![f], [(library, summary)]).unwrap();

    assert_eq!(height(&fixpoint, f), Height(9));
    let meta = fixpoint.store().get_meta_data(library).unwrap();
    assert_eq!(meta.step.epoch, Epoch::PREDEFINED);
}

// ---------------------------------------------------------------------------
// Plugin outcomes
// ---------------------------------------------------------------------------

#[test]
fn test_untracked_body_leaves_the_slot_empty() {
    let mut graph = ToyProgram::new();
    let f = graph
        .function()
        .name("f")
        .definition(ToyBody::value(3).with_untracked().with_source())
        .new();
    let dependencies = graph.dependency_graph();
    let analyses = toy();
    let mut fixpoint = Fixpoint::new(&graph, &dependencies, &analyses).with_config(strict());
    fixpoint.compute(graph.analysis_order(), []).unwrap();

    assert_eq!(model(&fixpoint, f).fragments, (None, Some(Reach(true))));
    assert_eq!(
        fixpoint.store().get_result(f),
        Some((None, Some(Vec::new())))
    );
}

#[test]
fn test_plugin_failure_aborts_the_run() {
    let mut graph = ToyProgram::new();
    let f = graph.function().name("f").definition(ToyBody::value(1)).new();
    let g = graph
        .function()
        .name("g")
        .definition(ToyBody::value(1).with_failure())
        .new();
    graph.add_call(f, g);
    let dependencies = graph.dependency_graph();
    let analyses = toy();
    let mut fixpoint = Fixpoint::new(&graph, &dependencies, &analyses).with_config(strict());
    let error = fixpoint.compute(graph.analysis_order(), []).unwrap_err();

    insta::assert_snapshot!(error, @"analysis `height` failed on `g`: toy failure in `g`");
    match &error {
        FixpointError::Analysis { callable, kind, .. } => {
            assert_eq!(*callable, g);
            assert_eq!(*kind, HeightAnalysis::KIND);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(std::error::Error::source(&error).is_some());
}

#[test]
fn test_interrupt_aborts_before_the_next_callable() {
    let (graph, [_, _, c]) = chain();
    let dependencies = graph.dependency_graph();
    let analyses = toy();
    let interrupt = Interrupt::new();
    let mut fixpoint = Fixpoint::new(&graph, &dependencies, &analyses)
        .with_config(strict())
        .with_interrupt(interrupt.clone());

    interrupt.trigger();
    let error = fixpoint.compute(graph.analysis_order(), []).unwrap_err();
    insta::assert_snapshot!(error, @"interrupted while analyzing `c`");
    assert!(matches!(error, FixpointError::Interrupted { callable, .. } if callable == c));

    interrupt.reset();
    assert!(fixpoint.compute(graph.analysis_order(), []).is_ok());
}

/// Widening that forgets the newer operand.
#[derive(Debug, Default)]
struct Stubborn;

impl Analysis<ToyProgram> for Stubborn {
    type Model = i64;
    type Result = ();

    fn kind(&self) -> AnalysisKind {
        AnalysisKind::new("stubborn")
    }

    fn empty_model(&self) -> i64 {
        0
    }

    fn obscure_model(&self) -> i64 {
        i64::MAX
    }

    fn empty_result(&self) {}

    fn join(&self, _: usize, left: &i64, right: &i64) -> i64 {
        *left.max(right)
    }

    fn widen(&self, _: usize, previous: &i64, _: &i64) -> i64 {
        *previous
    }

    fn reached_fixpoint(&self, _: usize, previous: &i64, next: &i64) -> bool {
        next <= previous
    }

    fn analyze(
        &self,
        context: &AnalyzeContext<'_, ToyProgram, i64>,
        _: &i64,
    ) -> Result<((), i64), AnalysisError> {
        Ok(((), context.definition().value.unwrap_or(0)))
    }
}

#[test]
fn test_non_monotonic_widening_is_fatal_when_checked() {
    let mut graph = ToyProgram::new();
    let f = graph.function().name("f").definition(ToyBody::value(3)).new();
    let dependencies = graph.dependency_graph();
    let analyses = (Stubborn,);
    let mut fixpoint = Fixpoint::new(&graph, &dependencies, &analyses).with_config(strict());

    let error = fixpoint
        .compute(vec![f], [(f, Model::new((Some(0),)))])
        .unwrap_err();
    insta::assert_snapshot!(error, @"widening of `f` does not dominate its operands for stubborn");
}

// ---------------------------------------------------------------------------
// Bookkeeping faults
// ---------------------------------------------------------------------------

#[test]
fn test_objects_are_dropped_and_never_analyzed() {
    let mut graph = ToyProgram::new();
    let global = graph.object().name("CONFIG").new();
    let f = graph.function().name("f").definition(ToyBody::value(1)).new();
    let dependencies = graph.dependency_graph();
    let analyses = toy();
    let mut fixpoint = Fixpoint::new(&graph, &dependencies, &analyses).with_config(strict());

    fixpoint.seed(vec![global, f], []);
    assert_eq!(fixpoint.callables(), &[f]);
    assert!(!fixpoint.store().has_model(global));

    let error = fixpoint
        .iterate(FixpointState::Running {
            iteration: 0,
            frontier: vec![global],
        })
        .unwrap_err();
    insta::assert_snapshot!(error, @"`CONFIG` is an object and cannot be analyzed");
}

#[test]
fn test_epoch_mismatch_is_fatal() {
    let (graph, [_, _, c]) = chain();
    let dependencies = graph.dependency_graph();
    let analyses = toy();
    let mut fixpoint = Fixpoint::new(&graph, &dependencies, &analyses).with_config(strict());

    let state = fixpoint.seed(graph.analysis_order(), []);
    fixpoint.store().add_predefined(Epoch::new(7), c, Model::empty());
    let error = fixpoint.iterate(state).unwrap_err();
    insta::assert_snapshot!(error, @"fixpoint inconsistency: `c` was written at epoch 7, iteration 0 but is analyzed at initial, iteration 0");
}

#[test]
fn test_missing_initial_model_is_fatal() {
    let (graph, [_, _, c]) = chain();
    let dependencies = graph.dependency_graph();
    let analyses = toy();
    let fixpoint = Fixpoint::new(&graph, &dependencies, &analyses);

    let error = fixpoint
        .iterate(FixpointState::Running {
            iteration: 0,
            frontier: vec![c],
        })
        .unwrap_err();
    assert!(matches!(error, FixpointError::MissingInitialModel { callable, .. } if callable == c));
}

#[test]
fn test_unseeded_callable_without_body_is_fatal_after_the_first_iteration() {
    let mut graph = ToyProgram::new();
    let external = graph.stub().name("extern").new();
    let dependencies = graph.dependency_graph();
    let analyses = toy();
    let mut fixpoint = Fixpoint::new(&graph, &dependencies, &analyses).with_config(strict());

    fixpoint.seed(vec![], []);
    let error = fixpoint
        .iterate(FixpointState::Running {
            iteration: 1,
            frontier: vec![external],
        })
        .unwrap_err();
    insta::assert_snapshot!(error, @"`extern` lost its definition in iteration 1");
}

#[test]
fn test_rescheduling_outside_the_run() {
    let mut graph = ToyProgram::new();
    let f = graph.function().name("f").definition(ToyBody::value(1)).new();
    let g = graph.function().name("g").definition(ToyBody::new()).new();
    graph.add_call(g, f);

    // A dependent outside the run is fine as long as it is predefined.
    let dependencies = graph.dependency_graph();
    let analyses = toy();
    let mut fixpoint = Fixpoint::new(&graph, &dependencies, &analyses).with_config(strict());
    let state = fixpoint.seed(vec![f], [(g, Model::empty())]);
    let (state, _) = fixpoint.iterate(state).unwrap();
    assert_eq!(
        state,
        FixpointState::Running {
            iteration: 1,
            frontier: vec![f],
        }
    );

    // One written in the run's epoch means the callable list is inconsistent.
    let mut fixpoint = Fixpoint::new(&graph, &dependencies, &analyses).with_config(strict());
    let state = fixpoint.seed(vec![f], []);
    fixpoint.store().add_predefined(Epoch::INITIAL, g, Model::empty());
    let error = fixpoint.iterate(state).unwrap_err();
    insta::assert_snapshot!(error, @"re-analysis in iteration 0 scheduled `g`, which is not part of the analyzed callables");
}

// ---------------------------------------------------------------------------
// Scheduling and reporting
// ---------------------------------------------------------------------------

fn mesh() -> ToyProgram {
    let mut graph = ToyProgram::new();
    let members: Vec<Callable> = (0..40)
        .map(|index| {
            let mut body = ToyBody::value(index % 7).with_increment(index % 3);
            if index % 11 == 0 {
                body = body.with_source();
            }
            graph.function().name(format!("m{index}")).definition(body).new()
        })
        .collect();
    let external = graph.stub().name("extern").new();
    for (index, caller) in members.iter().enumerate() {
        graph.add_call(*caller, members[(index * 5 + 3) % 40]);
        graph.add_call(*caller, members[(index + 1) % 40]);
        if index % 13 == 0 {
            graph.add_call(*caller, external);
        }
    }
    graph
}

#[test]
fn test_parallel_run_matches_sequential_run() {
    let graph = mesh();
    let dependencies = graph.dependency_graph();
    let analyses = toy();
    let run = |scheduler: Scheduler| {
        let config = strict().with_policy(SchedulerPolicy::FixedChunkSize(3));
        let mut fixpoint = Fixpoint::new(&graph, &dependencies, &analyses)
            .with_config(config)
            .with_scheduler(scheduler);
        let report = fixpoint.compute(graph.analysis_order(), []).unwrap();
        let models: Vec<(Callable, ToyModel)> = fixpoint
            .store()
            .snapshot()
            .into_iter()
            .map(|(callable, model)| (callable, Model::clone(&model)))
            .collect();
        (report.iterations, report.processed, models)
    };

    let sequential = run(Scheduler::sequential());
    let parallel = run(Scheduler::parallel(4).unwrap());
    assert_eq!(sequential, parallel);
    assert_eq!(sequential.2.len(), graph.len());
}

#[test]
fn test_report_lists_dumps_and_expensive_callables() {
    let mut graph = ToyProgram::new();
    let tall = graph.function().name("tall").definition(ToyBody::value(12)).new();
    let short = graph.function().name("short").definition(ToyBody::value(3)).new();
    let slow = graph
        .function()
        .name("slow")
        .definition(ToyBody::value(1).with_delay(Duration::from_millis(30)))
        .new();
    let dependencies = graph.dependency_graph();
    let analyses = (
        HeightAnalysis::default().with_dump_threshold(10),
        ReachAnalysis,
    );
    let config = strict().with_expensive_threshold(Duration::from_millis(15));
    let mut fixpoint = Fixpoint::new(&graph, &dependencies, &analyses).with_config(config);
    let report = fixpoint.compute(graph.analysis_order(), []).unwrap();

    assert_eq!(report.dumps.len(), 1);
    assert_eq!(report.dumps[0].0, tall);
    assert_eq!(report.dumps[0].1.fragments.0, Some(Height(12)));

    assert!(!report.expensive.is_empty());
    assert!(report.expensive.iter().all(|entry| entry.callable == slow));
    assert_eq!(report.expensive[0].name, "slow");
    assert_eq!(report.expensive[0].iteration, 0);
    assert!(report.expensive[0].duration >= Duration::from_millis(15));

    // Every callable is analyzed once to grow and once to confirm.
    assert_eq!(report.processed, 6);
    assert_eq!(report.iterations, 2);
    assert!(report.dumps.iter().all(|(callable, _)| *callable != short));
}
