use kirin_callgraph::{Callable, Program};
use kirin_fixpoint::lattice::{HasBottom, HasTop, Lattice, Widen};
use kirin_fixpoint::{Analysis, AnalysisError, AnalysisKind, AnalyzeContext};

use crate::toy::ToyProgram;

/// Whether a callable may return tainted data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Reach(pub bool);

impl Lattice for Reach {
    fn join(&self, other: &Self) -> Self {
        Reach(self.0 || other.0)
    }

    fn is_subseteq(&self, other: &Self) -> bool {
        !self.0 || other.0
    }
}

impl HasBottom for Reach {
    fn bottom() -> Self {
        Reach(false)
    }
}

impl HasTop for Reach {
    fn top() -> Self {
        Reach(true)
    }
}

impl Widen for Reach {
    fn widen(&self, next: &Self) -> Self {
        self.join(next)
    }
}

/// Boolean taint reachability. The result lists the callees taint flows in
/// from.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReachAnalysis;

impl ReachAnalysis {
    pub const KIND: AnalysisKind = AnalysisKind::new("reach");
}

impl Analysis<ToyProgram> for ReachAnalysis {
    type Model = Reach;
    type Result = Vec<Callable>;

    fn kind(&self) -> AnalysisKind {
        Self::KIND
    }

    fn empty_model(&self) -> Reach {
        Reach::bottom()
    }

    fn obscure_model(&self) -> Reach {
        Reach::top()
    }

    fn empty_result(&self) -> Vec<Callable> {
        Vec::new()
    }

    fn join(&self, _iteration: usize, left: &Reach, right: &Reach) -> Reach {
        left.join(right)
    }

    fn widen(&self, _iteration: usize, previous: &Reach, next: &Reach) -> Reach {
        previous.widen(next)
    }

    fn reached_fixpoint(&self, _iteration: usize, previous: &Reach, next: &Reach) -> bool {
        next.is_subseteq(previous)
    }

    fn analyze(
        &self,
        context: &AnalyzeContext<'_, ToyProgram, Reach>,
        _existing: &Reach,
    ) -> Result<(Vec<Callable>, Reach), AnalysisError> {
        let body = context.definition();
        if let Some(delay) = body.delay {
            std::thread::sleep(delay);
        }
        if context.is_interrupted() {
            return Err(AnalysisError::Interrupted);
        }

        let flows: Vec<Callable> = context
            .program()
            .callees(context.callable())
            .iter()
            .copied()
            .filter(|callee| {
                context
                    .callee_model(*callee)
                    .is_some_and(|summary| summary.is_obscure || summary.model.0)
            })
            .collect();
        let reach = Reach(body.source || !flows.is_empty());
        Ok((flows, reach))
    }
}
