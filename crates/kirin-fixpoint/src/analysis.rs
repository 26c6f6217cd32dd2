use std::fmt::{self, Debug};

use kirin_callgraph::{Callable, Program};

use crate::error::AnalysisError;
use crate::interrupt::Interrupt;
use crate::model::Step;

/// Name of a registered analysis. Distinct analyses must use distinct kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnalysisKind(&'static str);

impl AnalysisKind {
    pub const fn new(name: &'static str) -> Self {
        AnalysisKind(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// An interprocedural analysis the fixpoint engine can drive.
///
/// ## Algebraic contracts
///
/// `reached_fixpoint(i, previous, next)` answers `next ⊑ previous` and must be
/// reflexive. `join` is an upper bound of both operands. `widen` is an upper
/// bound of both operands and any chain `x₀, widen(x₀, x₁), …` stabilizes in
/// finitely many steps, so that a run terminates on infinite-height domains.
pub trait Analysis<P: Program>: Send + Sync {
    /// Feedback into the lattice: what callers learn about a callable.
    type Model: Clone + Debug + Send + Sync;
    /// Findings. Never joined or widened; only the latest value is kept.
    type Result: Clone + Debug + Send + Sync;

    fn kind(&self) -> AnalysisKind;

    /// Summary of a callable nothing is known about yet.
    fn empty_model(&self) -> Self::Model;

    /// Maximally conservative summary for callables without a body.
    fn obscure_model(&self) -> Self::Model;

    fn empty_result(&self) -> Self::Result;

    fn join(&self, iteration: usize, left: &Self::Model, right: &Self::Model) -> Self::Model;

    fn widen(&self, iteration: usize, previous: &Self::Model, next: &Self::Model) -> Self::Model;

    fn reached_fixpoint(&self, iteration: usize, previous: &Self::Model, next: &Self::Model)
    -> bool;

    /// Drop the parts of a model that are meaningless to a caller, e.g.
    /// provenance tied to call sites inside the callee.
    fn strip_for_callsite(&self, model: Self::Model) -> Self::Model {
        model
    }

    /// Whether the final model of this callable should be reported at the
    /// end of the run.
    fn should_dump(&self, _model: &Self::Model) -> bool {
        false
    }

    /// Analyze one definition against `existing`, its previously accepted
    /// model, using callee summaries from `context`.
    fn analyze(
        &self,
        context: &AnalyzeContext<'_, P, Self::Model>,
        existing: &Self::Model,
    ) -> Result<(Self::Result, Self::Model), AnalysisError>;
}

/// A callee summary as seen by one analysis.
#[derive(Clone, Debug, PartialEq)]
pub struct CalleeModel<M> {
    pub model: M,
    pub is_obscure: bool,
}

/// Read access to promoted callee summaries, projected onto one analysis.
pub trait CalleeModels<M> {
    fn callee_model(&self, callee: Callable) -> Option<CalleeModel<M>>;
}

/// Everything an [`Analysis`] may look at while analyzing one definition.
pub struct AnalyzeContext<'a, P: Program, M> {
    pub(crate) program: &'a P,
    pub(crate) callable: Callable,
    pub(crate) definition: &'a P::Definition,
    pub(crate) step: Step,
    pub(crate) interrupt: &'a Interrupt,
    pub(crate) callees: &'a dyn CalleeModels<M>,
}

impl<'a, P: Program, M> AnalyzeContext<'a, P, M> {
    pub fn new(
        program: &'a P,
        callable: Callable,
        definition: &'a P::Definition,
        step: Step,
        interrupt: &'a Interrupt,
        callees: &'a dyn CalleeModels<M>,
    ) -> Self {
        Self {
            program,
            callable,
            definition,
            step,
            interrupt,
            callees,
        }
    }

    pub fn program(&self) -> &'a P {
        self.program
    }

    pub fn callable(&self) -> Callable {
        self.callable
    }

    pub fn definition(&self) -> &'a P::Definition {
        self.definition
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn iteration(&self) -> usize {
        self.step.iteration
    }

    /// Long-running analyses should poll this and return
    /// [`AnalysisError::Interrupted`] once it is set.
    pub fn is_interrupted(&self) -> bool {
        self.interrupt.is_triggered()
    }

    /// The promoted summary of `callee`, or `None` if it has none yet.
    ///
    /// Only summaries that were stable before the current batch are visible,
    /// so the answer does not depend on how the batch is scheduled.
    pub fn callee_model(&self, callee: Callable) -> Option<CalleeModel<M>> {
        self.callees.callee_model(callee)
    }
}
