use std::time::Duration;

use kirin_callgraph::{CallGraph, Callable};

/// Call graph whose function bodies are [`ToyBody`]s.
pub type ToyProgram = CallGraph<ToyBody>;

/// A function body the toy analyses understand.
///
/// [`HeightAnalysis`](crate::HeightAnalysis) reads `value`, `increment`,
/// `untracked` and `fails`; [`ReachAnalysis`](crate::ReachAnalysis) reads
/// `source`. Both honor `delay`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToyBody {
    /// Height contributed by the body itself; `None` contributes bottom.
    pub value: Option<i64>,
    /// Added to every non-bottom callee height.
    pub increment: i64,
    /// The body produces tainted data.
    pub source: bool,
    /// The height analysis reports the body as untracked.
    pub untracked: bool,
    /// The height analysis fails on the body.
    pub fails: bool,
    /// Sleep this long before analyzing.
    pub delay: Option<Duration>,
}

impl ToyBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(value: i64) -> Self {
        ToyBody {
            value: Some(value),
            ..Self::default()
        }
    }

    pub fn with_increment(mut self, increment: i64) -> Self {
        self.increment = increment;
        self
    }

    pub fn with_source(mut self) -> Self {
        self.source = true;
        self
    }

    pub fn with_untracked(mut self) -> Self {
        self.untracked = true;
        self
    }

    pub fn with_failure(mut self) -> Self {
        self.fails = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// `a → b → c` where only `c` has a height.
pub fn chain() -> (ToyProgram, [Callable; 3]) {
    let mut graph = ToyProgram::new();
    let a = graph.function().name("a").definition(ToyBody::new()).new();
    let b = graph.function().name("b").definition(ToyBody::new()).new();
    let c = graph.function().name("c").definition(ToyBody::value(5)).new();
    graph.add_call(a, b);
    graph.add_call(b, c);
    (graph, [a, b, c])
}

/// `f0 → f1 → … → f(n-1) → f0`, every body built by `body(index)`.
pub fn cycle(n: usize, body: impl Fn(usize) -> ToyBody) -> (ToyProgram, Vec<Callable>) {
    let mut graph = ToyProgram::new();
    let members: Vec<Callable> = (0..n)
        .map(|index| {
            graph
                .function()
                .name(format!("f{index}"))
                .definition(body(index))
                .new()
        })
        .collect();
    for (index, caller) in members.iter().enumerate() {
        graph.add_call(*caller, members[(index + 1) % n]);
    }
    (graph, members)
}
