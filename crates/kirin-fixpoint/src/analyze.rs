use std::backtrace::Backtrace;
use std::time::Instant;

use kirin_callgraph::{Callable, CallableKind, Program};

use crate::convergence::Convergence;
use crate::error::FixpointError;
use crate::fixpoint::{BatchSummary, ExpensiveCallable, Fixpoint};
use crate::model::{AnalyzedCallable, Model, Step};
use crate::set::{AnalysisSet, CallableContext};

type Analyzed<P, S> =
    AnalyzedCallable<<S as AnalysisSet<P>>::Fragments, <S as AnalysisSet<P>>::Results>;

impl<P: Program, S: AnalysisSet<P>> Fixpoint<'_, P, S> {
    /// Analyze `callable`, store the outcome, and account for it in `summary`.
    pub(crate) fn process_callable(
        &self,
        step: Step,
        callable: Callable,
        summary: &mut BatchSummary,
    ) -> Result<(), FixpointError> {
        if self.interrupt.is_triggered() {
            log::error!(
                "Interrupted before analyzing `{}` in iteration {}",
                self.program.name(callable),
                step.iteration
            );
            return Err(FixpointError::Interrupted {
                callable,
                name: self.name(callable),
            });
        }

        let start = Instant::now();
        let analyzed = match self.analyze_callable(step, callable) {
            Ok(analyzed) => analyzed,
            Err(error @ FixpointError::Interrupted { .. }) => {
                log::error!("{error}");
                return Err(error);
            }
            Err(error @ FixpointError::Analysis { .. }) => {
                log::error!("{error}\n{}", Backtrace::capture());
                return Err(error);
            }
            Err(error) => return Err(error),
        };
        let duration = start.elapsed();

        if duration > self.config.expensive_threshold {
            log::info!(
                "Analyzing `{}` took {duration:?} in iteration {}",
                self.program.name(callable),
                step.iteration
            );
            summary.expensive.push(ExpensiveCallable {
                callable,
                name: self.name(callable),
                duration,
                iteration: step.iteration,
            });
        }
        if self.analyses.should_dump(&analyzed.model.fragments) {
            summary.dump.push(callable);
        }
        summary.processed += 1;
        self.store.add(step, callable, analyzed);
        Ok(())
    }

    /// Compute the next accepted model of `callable` without storing it.
    pub(crate) fn analyze_callable(
        &self,
        step: Step,
        callable: Callable,
    ) -> Result<Analyzed<P, S>, FixpointError> {
        if let Some(meta) = self.store.get_meta_data(callable) {
            if meta.step.epoch != step.epoch {
                return Err(FixpointError::EpochMismatch {
                    callable,
                    name: self.name(callable),
                    stored: meta.step,
                    requested: step,
                });
            }
        }

        let kind = self.program.kind(callable);
        let definition = self.program.definition(callable);
        match (kind, definition) {
            (CallableKind::Object, _) => Err(FixpointError::ObjectAnalyzed {
                callable,
                name: self.name(callable),
            }),
            (CallableKind::Stub, _) | (CallableKind::Function, None) => {
                self.analyze_without_body(step, callable)
            }
            (CallableKind::Function, Some(definition)) => {
                let previous = self.previous_model(callable)?;
                let context = CallableContext {
                    program: self.program,
                    callable,
                    definition,
                    step,
                    interrupt: &self.interrupt,
                    store: &self.store,
                };
                let (result, fragments) = self.analyses.analyze(&context, &previous.fragments)?;
                self.accept(step, callable, &previous, Model::new(fragments), result)
            }
            (CallableKind::Override, _) => {
                let previous = self.previous_model(callable)?;
                let fresh = self.join_overrides(step, callable);
                self.accept(step, callable, &previous, fresh, self.analyses.empty_results())
            }
        }
    }

    fn convergence(&self) -> Convergence<'_, P, S> {
        Convergence::new(self.analyses, self.config.widening_check)
    }

    fn previous_model(&self, callable: Callable) -> Result<Model<S::Fragments>, FixpointError> {
        self.store
            .get_old_model(callable)
            .map(|model| Model::clone(&model))
            .ok_or_else(|| FixpointError::MissingInitialModel {
                callable,
                name: self.name(callable),
            })
    }

    /// Callables without a body keep their seeded summary, obscure unless the
    /// host supplied one. A callable that had a body when the run was seeded
    /// and lost it since is a fault.
    fn analyze_without_body(
        &self,
        step: Step,
        callable: Callable,
    ) -> Result<Analyzed<P, S>, FixpointError> {
        if step.iteration > 0 && !self.bodiless.contains(&callable) {
            return Err(FixpointError::DefinitionDisappeared {
                callable,
                name: self.name(callable),
                iteration: step.iteration,
            });
        }
        let model = match self.store.get_old_model(callable) {
            Some(model) => Model::clone(&model),
            None => self.obscure_model(),
        };
        Ok(AnalyzedCallable {
            is_partial: false,
            model,
            result: self.analyses.empty_results(),
        })
    }

    /// Join of the summaries of the direct implementation and every
    /// overriding implementation, each stripped for use at a call site.
    fn join_overrides(&self, step: Step, callable: Callable) -> Model<S::Fragments> {
        let convergence = self.convergence();
        let targets = self
            .program
            .direct_implementation(callable)
            .into_iter()
            .chain(self.program.overriding(callable).iter().copied());

        let mut joined: Option<Model<S::Fragments>> = None;
        for target in targets {
            let Some(model) = self.store.callee_model(target) else {
                log::debug!(
                    "Override `{}` has no summary for `{}` yet, skipping it",
                    self.program.name(callable),
                    self.program.name(target)
                );
                continue;
            };
            let stripped = Model {
                fragments: self.analyses.strip_for_callsite(model.fragments.clone()),
                is_obscure: model.is_obscure,
            };
            joined = Some(match joined {
                Some(joined) => convergence.join(step.iteration, &joined, &stripped),
                None => stripped,
            });
        }
        joined.unwrap_or_else(Model::empty)
    }

    /// Keep `previous` if `fresh` adds nothing to it; otherwise widen and mark
    /// the callable partial.
    fn accept(
        &self,
        step: Step,
        callable: Callable,
        previous: &Model<S::Fragments>,
        fresh: Model<S::Fragments>,
        result: S::Results,
    ) -> Result<Analyzed<P, S>, FixpointError> {
        let convergence = self.convergence();
        if convergence.reached_fixpoint(step.iteration, previous, &fresh) {
            return Ok(AnalyzedCallable {
                is_partial: false,
                model: previous.clone(),
                result,
            });
        }

        if log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "`{}` has not converged in iteration {} (kinds: {:?}, obscure: {} -> {})",
                self.program.name(callable),
                step.iteration,
                convergence.non_converged_kinds(step.iteration, previous, &fresh),
                previous.is_obscure,
                fresh.is_obscure
            );
        }
        let model = convergence
            .widen(step.iteration, previous, &fresh)
            .map_err(|violation| FixpointError::NonMonotonicWidening {
                callable,
                name: self.name(callable),
                kinds: violation.kinds,
            })?;
        Ok(AnalyzedCallable {
            is_partial: true,
            model,
            result,
        })
    }
}
