//! Runs two small analyses over a hand-built call graph.
//!
//! ```text
//! RUST_LOG=kirin_fixpoint=debug cargo run --example taint
//! ```

use kirin_interproc::prelude::*;

/// What a function body does, as far as these analyses care.
#[derive(Debug, Default)]
struct Body {
    reads_input: bool,
    sanitizes: bool,
}

type Demo = CallGraph<Body>;

/// Whether a callable may return data read from the outside.
#[derive(Debug)]
struct Taint;

impl Analysis<Demo> for Taint {
    type Model = bool;
    /// Callees the taint flows in from.
    type Result = Vec<String>;

    fn kind(&self) -> AnalysisKind {
        AnalysisKind::new("taint")
    }

    fn empty_model(&self) -> bool {
        false
    }

    fn obscure_model(&self) -> bool {
        true
    }

    fn empty_result(&self) -> Vec<String> {
        Vec::new()
    }

    fn join(&self, _: usize, left: &bool, right: &bool) -> bool {
        *left || *right
    }

    fn widen(&self, _: usize, previous: &bool, next: &bool) -> bool {
        *previous || *next
    }

    fn reached_fixpoint(&self, _: usize, previous: &bool, next: &bool) -> bool {
        !*next || *previous
    }

    fn should_dump(&self, model: &bool) -> bool {
        *model
    }

    fn analyze(
        &self,
        context: &AnalyzeContext<'_, Demo, bool>,
        _: &bool,
    ) -> Result<(Vec<String>, bool), AnalysisError> {
        let body = context.definition();
        let program = context.program();
        let flows: Vec<String> = program
            .callees(context.callable())
            .iter()
            .filter(|callee| {
                context
                    .callee_model(**callee)
                    .is_some_and(|summary| summary.is_obscure || summary.model)
            })
            .map(|callee| program.name(*callee).to_string())
            .collect();
        let tainted = !body.sanitizes && (body.reads_input || !flows.is_empty());
        Ok((flows, tainted))
    }
}

/// Longest call chain below a callable, widened to "unbounded" on recursion.
#[derive(Debug, Default)]
struct Depth {
    strategy: WideningStrategy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Chain(u32);

impl Lattice for Chain {
    fn join(&self, other: &Self) -> Self {
        Chain(self.0.max(other.0))
    }

    fn is_subseteq(&self, other: &Self) -> bool {
        self.0 <= other.0
    }
}

impl Widen for Chain {
    fn widen(&self, next: &Self) -> Self {
        if next.0 > self.0 { Chain(u32::MAX) } else { *self }
    }
}

impl Analysis<Demo> for Depth {
    type Model = Chain;
    type Result = ();

    fn kind(&self) -> AnalysisKind {
        AnalysisKind::new("depth")
    }

    fn empty_model(&self) -> Chain {
        Chain(0)
    }

    fn obscure_model(&self) -> Chain {
        Chain(u32::MAX)
    }

    fn empty_result(&self) {}

    fn join(&self, _: usize, left: &Chain, right: &Chain) -> Chain {
        left.join(right)
    }

    fn widen(&self, iteration: usize, previous: &Chain, next: &Chain) -> Chain {
        self.strategy.merge(previous, next, iteration)
    }

    fn reached_fixpoint(&self, _: usize, previous: &Chain, next: &Chain) -> bool {
        next.is_subseteq(previous)
    }

    fn analyze(
        &self,
        context: &AnalyzeContext<'_, Demo, Chain>,
        _: &Chain,
    ) -> Result<((), Chain), AnalysisError> {
        let deepest = context
            .program()
            .callees(context.callable())
            .iter()
            .filter_map(|callee| context.callee_model(*callee))
            .map(|summary| summary.model.0.saturating_add(1))
            .max()
            .unwrap_or(1);
        Ok(((), Chain(deepest)))
    }
}

fn build() -> (Demo, Vec<Callable>) {
    let mut graph = Demo::new();
    let read = graph.stub().name("read_line").new();
    let parse = graph.function().name("parse").definition(Body::default()).new();
    let escape = graph
        .function()
        .name("escape")
        .definition(Body {
            sanitizes: true,
            ..Body::default()
        })
        .new();
    let render = graph.function().name("render").definition(Body::default()).new();
    let handler = graph
        .function()
        .name("Handler.handle")
        .definition(Body {
            reads_input: true,
            ..Body::default()
        })
        .new();
    let dispatch = graph.override_of().implementation(render).new();
    graph.add_overriding(dispatch, handler);
    let main = graph.function().name("main").definition(Body::default()).new();

    graph.add_call(parse, read);
    graph.add_call(escape, parse);
    graph.add_call(render, escape);
    graph.add_call(render, render);
    graph.add_call(main, dispatch);
    graph.add_call(main, parse);

    let order = graph.analysis_order();
    (graph, order)
}

fn main() -> Result<(), FixpointError> {
    pretty_env_logger::init();

    let (graph, order) = build();
    let dependencies = graph.dependency_graph();
    let analyses = (Taint, Depth::default());
    let mut fixpoint = Fixpoint::new(&graph, &dependencies, &analyses)
        .with_config(FixpointConfig::default().with_widening_check(WideningCheck::Fail))
        .with_scheduler(Scheduler::parallel(2)?);
    let report = fixpoint.compute(order.clone(), [])?;

    println!(
        "converged after {} iterations ({} analyses)",
        report.iterations, report.processed
    );
    for callable in order {
        let Some(model) = fixpoint.store().get_model(callable) else {
            continue;
        };
        let (taint, depth) = &model.fragments;
        println!(
            "{:>16}: tainted={:?} depth={:?} obscure={}",
            graph.name(callable),
            taint,
            depth.map(|chain| chain.0),
            model.is_obscure
        );
    }
    for (callable, _) in &report.dumps {
        println!("tainted: {}", graph.name(*callable));
    }
    Ok(())
}
