use std::marker::PhantomData;

use kirin_callgraph::Program;

use crate::analysis::AnalysisKind;
use crate::config::WideningCheck;
use crate::model::Model;
use crate::set::AnalysisSet;

/// Widening produced a model that is not above both of its operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonMonotonicWidening {
    pub kinds: Vec<AnalysisKind>,
}

/// Model-level lattice operations, lifted from the registered analyses.
pub struct Convergence<'a, P, S> {
    analyses: &'a S,
    check: WideningCheck,
    program: PhantomData<fn(&P)>,
}

impl<'a, P: Program, S: AnalysisSet<P>> Convergence<'a, P, S> {
    pub fn new(analyses: &'a S, check: WideningCheck) -> Self {
        Convergence {
            analyses,
            check,
            program: PhantomData,
        }
    }

    /// Whether `next` adds nothing to `previous`.
    ///
    /// A callable turning obscure is always progress; one that stops being
    /// obscure is not, since obscurity is never reset.
    pub fn reached_fixpoint(
        &self,
        iteration: usize,
        previous: &Model<S::Fragments>,
        next: &Model<S::Fragments>,
    ) -> bool {
        if next.is_obscure && !previous.is_obscure {
            return false;
        }
        self.analyses
            .reached_fixpoint(iteration, &previous.fragments, &next.fragments)
    }

    pub fn non_converged_kinds(
        &self,
        iteration: usize,
        previous: &Model<S::Fragments>,
        next: &Model<S::Fragments>,
    ) -> Vec<AnalysisKind> {
        self.analyses
            .non_converged_kinds(iteration, &previous.fragments, &next.fragments)
    }

    pub fn join(
        &self,
        iteration: usize,
        left: &Model<S::Fragments>,
        right: &Model<S::Fragments>,
    ) -> Model<S::Fragments> {
        if std::ptr::eq(left, right) {
            return left.clone();
        }
        Model {
            fragments: self
                .analyses
                .join(iteration, &left.fragments, &right.fragments),
            is_obscure: left.is_obscure || right.is_obscure,
        }
    }

    /// Widen `previous` with `next`.
    ///
    /// Unless the check is [`WideningCheck::Off`], the widened model is
    /// compared against both operands. A violation is logged with both
    /// operands and, under [`WideningCheck::Fail`], returned as an error.
    pub fn widen(
        &self,
        iteration: usize,
        previous: &Model<S::Fragments>,
        next: &Model<S::Fragments>,
    ) -> Result<Model<S::Fragments>, NonMonotonicWidening> {
        let widened = Model {
            fragments: self
                .analyses
                .widen(iteration, &previous.fragments, &next.fragments),
            is_obscure: previous.is_obscure || next.is_obscure,
        };
        if self.check == WideningCheck::Off {
            return Ok(widened);
        }

        let mut kinds = self.non_converged_kinds(iteration, &widened, previous);
        for kind in self.non_converged_kinds(iteration, &widened, next) {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        if kinds.is_empty() {
            return Ok(widened);
        }

        log::error!(
            "Widening in iteration {iteration} is not monotonic for {kinds:?}\n  previous: {previous:?}\n  next: {next:?}\n  widened: {widened:?}"
        );
        match self.check {
            WideningCheck::Fail => Err(NonMonotonicWidening { kinds }),
            WideningCheck::Log | WideningCheck::Off => Ok(widened),
        }
    }
}
