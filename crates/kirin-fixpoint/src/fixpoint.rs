use std::sync::Arc;
use std::time::Duration;

use kirin_callgraph::{Callable, CallableKind, DependencyGraph, Program};
use rustc_hash::FxHashSet;

use crate::config::{FixpointConfig, Reanalysis};
use crate::error::FixpointError;
use crate::interrupt::Interrupt;
use crate::model::{Epoch, Model, Step};
use crate::scheduler::Scheduler;
use crate::set::AnalysisSet;
use crate::store::ModelStore;

/// Where a run currently stands. Aborting is the `Err` side of
/// [`Fixpoint::iterate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixpointState {
    /// `frontier` is analyzed in `iteration`, in analysis order.
    Running {
        iteration: usize,
        frontier: Vec<Callable>,
    },
    Converged { iterations: usize },
}

impl FixpointState {
    pub fn is_converged(&self) -> bool {
        matches!(self, FixpointState::Converged { .. })
    }
}

/// A callable whose analysis took longer than the configured threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpensiveCallable {
    pub callable: Callable,
    pub name: String,
    pub duration: Duration,
    pub iteration: usize,
}

/// Per-batch accumulator, merged associatively across workers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub expensive: Vec<ExpensiveCallable>,
    /// Callables whose accepted model asked to be dumped.
    pub dump: Vec<Callable>,
}

impl BatchSummary {
    pub fn merge(mut self, other: BatchSummary) -> BatchSummary {
        self.processed += other.processed;
        self.expensive.extend(other.expensive);
        self.dump.extend(other.dump);
        self
    }
}

/// Outcome of a converged run.
#[derive(Debug, Clone)]
pub struct FixpointReport<F> {
    pub iterations: usize,
    /// Total number of callable analyses over all iterations.
    pub processed: usize,
    pub expensive: Vec<ExpensiveCallable>,
    /// Final models of the callables flagged for dumping, in callable order.
    pub dumps: Vec<(Callable, Arc<Model<F>>)>,
}

/// The interprocedural fixpoint over one [`Program`].
///
/// Callables are analyzed in batches. Every batch sees only the summaries
/// promoted before it started, so a batch may run in parallel without the
/// outcome depending on the schedule. Callables whose summary was widened are
/// re-analyzed together with their dependents until nothing changes.
///
/// ```ignore
/// let mut fixpoint = Fixpoint::new(&graph, &dependencies, &(Height::default(),))
///     .with_config(FixpointConfig::default().with_max_iterations(20));
/// let report = fixpoint.compute(graph.analysis_order(), [])?;
/// ```
pub struct Fixpoint<'a, P: Program, S: AnalysisSet<P>> {
    pub(crate) program: &'a P,
    pub(crate) dependencies: &'a DependencyGraph,
    pub(crate) analyses: &'a S,
    pub(crate) store: ModelStore<S::Fragments, S::Results>,
    pub(crate) config: FixpointConfig,
    pub(crate) scheduler: Scheduler,
    pub(crate) interrupt: Interrupt,
    callables: Vec<Callable>,
    /// Callables of the current run that were seeded without a body.
    pub(crate) bodiless: FxHashSet<Callable>,
}

impl<'a, P: Program, S: AnalysisSet<P>> Fixpoint<'a, P, S> {
    pub fn new(program: &'a P, dependencies: &'a DependencyGraph, analyses: &'a S) -> Self {
        Fixpoint {
            program,
            dependencies,
            analyses,
            store: ModelStore::new(),
            config: FixpointConfig::default(),
            scheduler: Scheduler::sequential(),
            interrupt: Interrupt::new(),
            callables: Vec::new(),
            bodiless: FxHashSet::default(),
        }
    }

    pub fn with_config(mut self, config: FixpointConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Share `interrupt` with the run; triggering it aborts the current batch.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn config(&self) -> &FixpointConfig {
        &self.config
    }

    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    pub fn store(&self) -> &ModelStore<S::Fragments, S::Results> {
        &self.store
    }

    pub fn into_store(self) -> ModelStore<S::Fragments, S::Results> {
        self.store
    }

    /// The callables of the current run, objects removed.
    pub fn callables(&self) -> &[Callable] {
        &self.callables
    }

    pub(crate) fn name(&self, callable: Callable) -> String {
        self.program.name(callable).to_string()
    }

    /// Install the initial models and return the first state of the run.
    ///
    /// Everything a previous run left in the store is forgotten first.
    /// `callables` must be in analysis order (callees first). Models for
    /// callables outside that list are installed as predefined. Every listed
    /// callable without an initial model starts from the obscure model if it
    /// has no body, and from the empty model otherwise.
    pub fn seed(
        &mut self,
        callables: Vec<Callable>,
        initial_models: impl IntoIterator<Item = (Callable, Model<S::Fragments>)>,
    ) -> FixpointState {
        self.store.clear();
        self.callables = callables
            .into_iter()
            .filter(|callable| {
                let is_object = self.program.kind(*callable) == CallableKind::Object;
                if is_object {
                    log::warn!(
                        "Dropping object `{}` from the analyzed callables",
                        self.program.name(*callable)
                    );
                }
                !is_object
            })
            .collect();

        self.bodiless = self
            .callables
            .iter()
            .copied()
            .filter(|callable| self.program.definition(*callable).is_none())
            .filter(|callable| self.program.kind(*callable).is_real())
            .collect();

        let analyzed: FxHashSet<Callable> = self.callables.iter().copied().collect();
        for (callable, model) in initial_models {
            let epoch = if analyzed.contains(&callable) {
                self.config.epoch
            } else {
                Epoch::PREDEFINED
            };
            self.store.add_predefined(epoch, callable, model);
        }

        for &callable in &self.callables {
            if self.store.has_model(callable) {
                continue;
            }
            let has_body = self.program.definition(callable).is_some();
            let model = match self.program.kind(callable) {
                CallableKind::Stub => self.obscure_model(),
                CallableKind::Function if !has_body => self.obscure_model(),
                _ => Model::empty(),
            };
            self.store.add_predefined(self.config.epoch, callable, model);
        }

        log::info!(
            "Seeded {} callables in {}",
            self.callables.len(),
            self.config.epoch
        );
        FixpointState::Running {
            iteration: 0,
            frontier: self.callables.clone(),
        }
    }

    pub(crate) fn obscure_model(&self) -> Model<S::Fragments> {
        Model::obscure(self.analyses.obscure_fragments())
    }

    /// Run one batch and compute the state that follows it.
    pub fn iterate(
        &self,
        state: FixpointState,
    ) -> Result<(FixpointState, BatchSummary), FixpointError> {
        let (iteration, frontier) = match state {
            FixpointState::Running {
                iteration,
                frontier,
            } => (iteration, frontier),
            converged @ FixpointState::Converged { .. } => {
                return Ok((converged, BatchSummary::default()));
            }
        };

        if frontier.is_empty() {
            log::info!("Reached a fixpoint after {iteration} iterations");
            return Ok((
                FixpointState::Converged {
                    iterations: iteration,
                },
                BatchSummary::default(),
            ));
        }

        if iteration >= self.config.max_iterations {
            return Err(self.divergence(iteration, &frontier));
        }

        log::info!(
            "Iteration {iteration}: analyzing {} callables",
            frontier.len()
        );
        let step = Step::new(self.config.epoch, iteration);
        self.store.oldify(&frontier);
        let summary = self.scheduler.map_reduce(
            self.config.policy,
            &frontier,
            BatchSummary::default,
            |mut summary, chunk| {
                for &callable in chunk {
                    self.process_callable(step, callable, &mut summary)?;
                }
                Ok::<_, FixpointError>(summary)
            },
            BatchSummary::merge,
        )?;
        self.store.remove_old(&frontier);

        let next = self.next_frontier(iteration, &frontier)?;
        log::info!(
            "Iteration {iteration}: {} callables processed, {} scheduled for re-analysis",
            summary.processed,
            next.len()
        );
        Ok((
            FixpointState::Running {
                iteration: iteration + 1,
                frontier: next,
            },
            summary,
        ))
    }

    /// Partial callables of `frontier` plus their dependents, restricted to
    /// the analyzed callables and kept in analysis order.
    fn next_frontier(
        &self,
        iteration: usize,
        frontier: &[Callable],
    ) -> Result<Vec<Callable>, FixpointError> {
        let partial = frontier
            .iter()
            .copied()
            .filter(|callable| self.store.get_is_partial(*callable));
        let scheduled: FxHashSet<Callable> = match self.config.reanalysis {
            Reanalysis::Dependents => partial
                .flat_map(|callable| {
                    std::iter::once(callable)
                        .chain(self.dependencies.dependents(callable).iter().copied())
                })
                .collect(),
            Reanalysis::TransitiveDependents => self.dependencies.transitive_dependents(partial),
        };

        let next: Vec<Callable> = self
            .callables
            .iter()
            .copied()
            .filter(|callable| scheduled.contains(callable))
            .collect();
        if next.len() == scheduled.len() {
            return Ok(next);
        }

        let kept: FxHashSet<Callable> = next.iter().copied().collect();
        let mut missing: Vec<Callable> = scheduled
            .into_iter()
            .filter(|callable| !kept.contains(callable))
            .collect();
        missing.sort();
        for callable in missing {
            let tolerated = self.program.kind(callable) == CallableKind::Override
                || self
                    .store
                    .get_meta_data(callable)
                    .is_none_or(|meta| meta.step.epoch == Epoch::PREDEFINED);
            if !tolerated {
                return Err(FixpointError::RescheduleMismatch {
                    callable,
                    name: self.name(callable),
                    iteration,
                });
            }
        }
        Ok(next)
    }

    fn divergence(&self, iterations: usize, frontier: &[Callable]) -> FixpointError {
        let mut sample: Vec<String> = frontier
            .iter()
            .map(|callable| self.name(*callable))
            .collect();
        sample.sort();
        sample.truncate(self.config.divergence_sample);
        log::error!(
            "Failed to reach a fixpoint after {iterations} iterations; {} callables remain, including: {}",
            frontier.len(),
            sample.join(", ")
        );
        FixpointError::IterationLimit {
            iterations,
            remaining: frontier.len(),
            sample,
        }
    }

    /// Seed the run and iterate until it converges.
    pub fn compute(
        &mut self,
        callables: Vec<Callable>,
        initial_models: impl IntoIterator<Item = (Callable, Model<S::Fragments>)>,
    ) -> Result<FixpointReport<S::Fragments>, FixpointError> {
        let mut state = self.seed(callables, initial_models);
        let mut total = BatchSummary::default();
        let iterations = loop {
            if let FixpointState::Converged { iterations } = state {
                break iterations;
            }
            let (next, summary) = self.iterate(state)?;
            total = total.merge(summary);
            state = next;
        };
        Ok(self.report(iterations, total))
    }

    fn report(&self, iterations: usize, summary: BatchSummary) -> FixpointReport<S::Fragments> {
        let mut flagged = summary.dump;
        flagged.sort();
        flagged.dedup();
        let dumps = flagged
            .into_iter()
            .filter_map(|callable| {
                let model = self.store.get_model(callable)?;
                log::info!("Model for `{}`: {model:?}", self.program.name(callable));
                Some((callable, model))
            })
            .collect();
        FixpointReport {
            iterations,
            processed: summary.processed,
            expensive: summary.expensive,
            dumps,
        }
    }
}
