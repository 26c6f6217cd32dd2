use std::fmt::Debug;
use std::marker::PhantomData;

use kirin_callgraph::{Callable, Program};

use crate::analysis::{Analysis, AnalysisKind, AnalyzeContext, CalleeModel, CalleeModels};
use crate::error::{AnalysisError, FixpointError};
use crate::interrupt::Interrupt;
use crate::model::Step;
use crate::store::ModelStore;

/// The analyses registered for one run, lifted to fragment tuples.
///
/// Implemented for tuples `(A,)` through `(A, B, C, D, E, F)` of [`Analysis`]
/// types. Each analysis owns one `Option` slot of [`Fragments`](Self::Fragments)
/// and [`Results`](Self::Results), so fragments of different analyses can never
/// be combined with each other.
pub trait AnalysisSet<P: Program>: Send + Sync {
    type Fragments: Clone + Debug + Default + Send + Sync;
    type Results: Clone + Debug + Default + Send + Sync;

    fn kinds(&self) -> Vec<AnalysisKind>;

    /// Every slot filled with its analysis' obscure model.
    fn obscure_fragments(&self) -> Self::Fragments;

    /// Every slot filled with its analysis' empty result.
    fn empty_results(&self) -> Self::Results;

    /// Slot-wise join. A slot present on one side only is kept as is.
    fn join(
        &self,
        iteration: usize,
        left: &Self::Fragments,
        right: &Self::Fragments,
    ) -> Self::Fragments;

    /// Slot-wise widening. A slot present on one side only is kept as is.
    fn widen(
        &self,
        iteration: usize,
        previous: &Self::Fragments,
        next: &Self::Fragments,
    ) -> Self::Fragments;

    /// Whether every slot reached its fixpoint. Missing slots are compared as
    /// the analysis' empty model; slots missing on both sides are skipped.
    fn reached_fixpoint(
        &self,
        iteration: usize,
        previous: &Self::Fragments,
        next: &Self::Fragments,
    ) -> bool;

    /// The kinds whose slot did not reach its fixpoint.
    fn non_converged_kinds(
        &self,
        iteration: usize,
        previous: &Self::Fragments,
        next: &Self::Fragments,
    ) -> Vec<AnalysisKind>;

    fn strip_for_callsite(&self, fragments: Self::Fragments) -> Self::Fragments;

    fn should_dump(&self, fragments: &Self::Fragments) -> bool;

    /// Run every analysis on one definition.
    ///
    /// An [`AnalysisError::Untracked`] leaves the slot empty in both outputs.
    fn analyze(
        &self,
        context: &CallableContext<'_, P, Self::Fragments, Self::Results>,
        existing: &Self::Fragments,
    ) -> Result<(Self::Results, Self::Fragments), FixpointError>;
}

/// The inputs shared by every analysis of one callable.
pub struct CallableContext<'a, P: Program, F, R> {
    pub program: &'a P,
    pub callable: Callable,
    pub definition: &'a P::Definition,
    pub step: Step,
    pub interrupt: &'a Interrupt,
    pub store: &'a ModelStore<F, R>,
}

/// Callee lookups for one slot of the fragment tuple.
struct SlotView<'a, P: Program, A: Analysis<P>, F, R> {
    analysis: &'a A,
    store: &'a ModelStore<F, R>,
    project: fn(&F) -> Option<&A::Model>,
    program: PhantomData<fn(&P)>,
}

impl<P: Program, A: Analysis<P>, F, R> CalleeModels<A::Model> for SlotView<'_, P, A, F, R> {
    fn callee_model(&self, callee: Callable) -> Option<CalleeModel<A::Model>> {
        let model = self.store.callee_model(callee)?;
        Some(CalleeModel {
            model: (self.project)(&model.fragments)
                .cloned()
                .unwrap_or_else(|| self.analysis.empty_model()),
            is_obscure: model.is_obscure,
        })
    }
}

fn merge_slot<M: Clone>(
    left: Option<&M>,
    right: Option<&M>,
    merge: impl FnOnce(&M, &M) -> M,
) -> Option<M> {
    match (left, right) {
        (Some(left), Some(right)) => Some(merge(left, right)),
        (Some(model), None) | (None, Some(model)) => Some(model.clone()),
        (None, None) => None,
    }
}

fn slot_reached_fixpoint<P: Program, A: Analysis<P>>(
    analysis: &A,
    iteration: usize,
    previous: Option<&A::Model>,
    next: Option<&A::Model>,
) -> bool {
    match (previous, next) {
        (Some(previous), Some(next)) => analysis.reached_fixpoint(iteration, previous, next),
        (Some(previous), None) => {
            analysis.reached_fixpoint(iteration, previous, &analysis.empty_model())
        }
        (None, Some(next)) => analysis.reached_fixpoint(iteration, &analysis.empty_model(), next),
        (None, None) => true,
    }
}

fn analyze_slot<P: Program, A: Analysis<P>, F, R>(
    analysis: &A,
    context: &CallableContext<'_, P, F, R>,
    existing: Option<&A::Model>,
    project: fn(&F) -> Option<&A::Model>,
) -> Result<(Option<A::Result>, Option<A::Model>), FixpointError> {
    let view = SlotView {
        analysis,
        store: context.store,
        project,
        program: PhantomData,
    };
    let analyze_context = AnalyzeContext::new(
        context.program,
        context.callable,
        context.definition,
        context.step,
        context.interrupt,
        &view,
    );
    let empty;
    let existing = match existing {
        Some(existing) => existing,
        None => {
            empty = analysis.empty_model();
            &empty
        }
    };
    match analysis.analyze(&analyze_context, existing) {
        Ok((result, model)) => Ok((Some(result), Some(model))),
        Err(AnalysisError::Untracked { reason }) => {
            log::info!(
                "Skipping `{}` for `{}` in iteration {}: {reason}",
                analysis.kind(),
                context.program.name(context.callable),
                context.step.iteration
            );
            Ok((None, None))
        }
        Err(AnalysisError::Interrupted) => Err(FixpointError::Interrupted {
            callable: context.callable,
            name: context.program.name(context.callable).to_string(),
        }),
        Err(source) => Err(FixpointError::Analysis {
            callable: context.callable,
            name: context.program.name(context.callable).to_string(),
            kind: analysis.kind(),
            source,
        }),
    }
}

macro_rules! analysis_set {
    ($(($analysis:ident, $slot:ident, $index:tt)),+ $(,)?) => {
        impl<P: Program, $($analysis: Analysis<P>),+> AnalysisSet<P> for ($($analysis,)+) {
            type Fragments = ($(Option<<$analysis as Analysis<P>>::Model>,)+);
            type Results = ($(Option<<$analysis as Analysis<P>>::Result>,)+);

            fn kinds(&self) -> Vec<AnalysisKind> {
                vec![$(self.$index.kind()),+]
            }

            fn obscure_fragments(&self) -> Self::Fragments {
                ($(Some(self.$index.obscure_model()),)+)
            }

            fn empty_results(&self) -> Self::Results {
                ($(Some(self.$index.empty_result()),)+)
            }

            fn join(
                &self,
                iteration: usize,
                left: &Self::Fragments,
                right: &Self::Fragments,
            ) -> Self::Fragments {
                ($(
                    merge_slot(left.$index.as_ref(), right.$index.as_ref(), |left, right| {
                        self.$index.join(iteration, left, right)
                    }),
                )+)
            }

            fn widen(
                &self,
                iteration: usize,
                previous: &Self::Fragments,
                next: &Self::Fragments,
            ) -> Self::Fragments {
                ($(
                    merge_slot(previous.$index.as_ref(), next.$index.as_ref(), |previous, next| {
                        self.$index.widen(iteration, previous, next)
                    }),
                )+)
            }

            fn reached_fixpoint(
                &self,
                iteration: usize,
                previous: &Self::Fragments,
                next: &Self::Fragments,
            ) -> bool {
                $(
                    slot_reached_fixpoint::<P, _>(
                        &self.$index,
                        iteration,
                        previous.$index.as_ref(),
                        next.$index.as_ref(),
                    )
                )&&+
            }

            fn non_converged_kinds(
                &self,
                iteration: usize,
                previous: &Self::Fragments,
                next: &Self::Fragments,
            ) -> Vec<AnalysisKind> {
                let mut kinds = Vec::new();
                $(
                    if !slot_reached_fixpoint::<P, _>(
                        &self.$index,
                        iteration,
                        previous.$index.as_ref(),
                        next.$index.as_ref(),
                    ) {
                        kinds.push(self.$index.kind());
                    }
                )+
                kinds
            }

            fn strip_for_callsite(&self, fragments: Self::Fragments) -> Self::Fragments {
                ($(
                    fragments.$index.map(|model| self.$index.strip_for_callsite(model)),
                )+)
            }

            fn should_dump(&self, fragments: &Self::Fragments) -> bool {
                $(
                    fragments.$index.as_ref().is_some_and(|model| self.$index.should_dump(model))
                )||+
            }

            fn analyze(
                &self,
                context: &CallableContext<'_, P, Self::Fragments, Self::Results>,
                existing: &Self::Fragments,
            ) -> Result<(Self::Results, Self::Fragments), FixpointError> {
                $(
                    let $slot = analyze_slot(
                        &self.$index,
                        context,
                        existing.$index.as_ref(),
                        |fragments| fragments.$index.as_ref(),
                    )?;
                )+
                Ok((($($slot.0,)+), ($($slot.1,)+)))
            }
        }
    };
}

analysis_set!((A, a, 0));
analysis_set!((A, a, 0), (B, b, 1));
analysis_set!((A, a, 0), (B, b, 1), (C, c, 2));
analysis_set!((A, a, 0), (B, b, 1), (C, c, 2), (D, d, 3));
analysis_set!((A, a, 0), (B, b, 1), (C, c, 2), (D, d, 3), (E, e, 4));
analysis_set!((A, a, 0), (B, b, 1), (C, c, 2), (D, d, 3), (E, e, 4), (F, f, 5));
