use kirin_callgraph::Program;
use kirin_fixpoint::lattice::{HasBottom, HasTop, Lattice, Widen, WideningStrategy};
use kirin_fixpoint::{Analysis, AnalysisError, AnalysisKind, AnalyzeContext};

use crate::toy::{ToyBody, ToyProgram};

/// Integer lattice ordered by `<=`, `i64::MIN` is bottom and `i64::MAX` top.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Height(pub i64);

impl Height {
    pub fn new(value: i64) -> Self {
        Height(value)
    }

    pub fn is_bottom(&self) -> bool {
        *self == Height::bottom()
    }
}

impl Lattice for Height {
    fn join(&self, other: &Self) -> Self {
        Height(self.0.max(other.0))
    }

    fn is_subseteq(&self, other: &Self) -> bool {
        self.0 <= other.0
    }
}

impl HasBottom for Height {
    fn bottom() -> Self {
        Height(i64::MIN)
    }
}

impl HasTop for Height {
    fn top() -> Self {
        Height(i64::MAX)
    }
}

impl Widen for Height {
    fn widen(&self, next: &Self) -> Self {
        if next.0 > self.0 { Height::top() } else { *self }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("toy failure in `{name}`")]
pub struct ToyFailure {
    pub name: String,
}

/// Height of a function: the maximum of its own value and of every callee's
/// height plus the body's increment. Obscure callees make the caller top.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeightAnalysis {
    pub strategy: WideningStrategy,
    /// Dump every model at least this high.
    pub dump_threshold: Option<i64>,
}

impl HeightAnalysis {
    pub const KIND: AnalysisKind = AnalysisKind::new("height");

    pub fn new(strategy: WideningStrategy) -> Self {
        HeightAnalysis {
            strategy,
            dump_threshold: None,
        }
    }

    pub fn with_dump_threshold(mut self, threshold: i64) -> Self {
        self.dump_threshold = Some(threshold);
        self
    }
}

impl Analysis<ToyProgram> for HeightAnalysis {
    type Model = Height;
    /// The height computed in the last iteration, before widening.
    type Result = Height;

    fn kind(&self) -> AnalysisKind {
        Self::KIND
    }

    fn empty_model(&self) -> Height {
        Height::bottom()
    }

    fn obscure_model(&self) -> Height {
        Height::top()
    }

    fn empty_result(&self) -> Height {
        Height::bottom()
    }

    fn join(&self, _iteration: usize, left: &Height, right: &Height) -> Height {
        left.join(right)
    }

    fn widen(&self, iteration: usize, previous: &Height, next: &Height) -> Height {
        self.strategy.merge(previous, next, iteration)
    }

    fn reached_fixpoint(&self, _iteration: usize, previous: &Height, next: &Height) -> bool {
        next.is_subseteq(previous)
    }

    fn should_dump(&self, model: &Height) -> bool {
        self.dump_threshold
            .is_some_and(|threshold| model.0 >= threshold)
    }

    fn analyze(
        &self,
        context: &AnalyzeContext<'_, ToyProgram, Height>,
        _existing: &Height,
    ) -> Result<(Height, Height), AnalysisError> {
        let body: &ToyBody = context.definition();
        let name = context.program().name(context.callable());
        if let Some(delay) = body.delay {
            std::thread::sleep(delay);
        }
        if context.is_interrupted() {
            return Err(AnalysisError::Interrupted);
        }
        if body.untracked {
            return Err(AnalysisError::untracked(format!("unresolved call in `{name}`")));
        }
        if body.fails {
            return Err(AnalysisError::custom(ToyFailure {
                name: name.to_string(),
            }));
        }

        let mut height = body.value.map_or(Height::bottom(), Height);
        for callee in context.program().callees(context.callable()) {
            let Some(summary) = context.callee_model(*callee) else {
                continue;
            };
            let contribution = if summary.is_obscure {
                Height::top()
            } else if summary.model.is_bottom() {
                continue;
            } else {
                Height(summary.model.0.saturating_add(body.increment))
            };
            height = height.join(&contribution);
        }
        Ok((height, height))
    }
}
