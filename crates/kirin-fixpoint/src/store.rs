use std::sync::Arc;

use kirin_callgraph::Callable;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::model::{AnalyzedCallable, Epoch, MetaData, Model, Step};

#[derive(Debug)]
struct Generations<F> {
    new: Option<Arc<Model<F>>>,
    old: Option<Arc<Model<F>>>,
}

impl<F> Default for Generations<F> {
    fn default() -> Self {
        Generations {
            new: None,
            old: None,
        }
    }
}

/// Shared summary table with two generations per callable.
///
/// Writers only ever touch the *new* generation of the callable they analyze;
/// callers read the *old* generation, which is only replaced between batches
/// by [`oldify`](Self::oldify). The table is safe for concurrent readers and
/// writers; each operation takes its lock for the duration of one lookup.
#[derive(Debug)]
pub struct ModelStore<F, R> {
    generations: RwLock<FxHashMap<Callable, Generations<F>>>,
    results: RwLock<FxHashMap<Callable, R>>,
    meta: RwLock<FxHashMap<Callable, MetaData>>,
}

impl<F, R> Default for ModelStore<F, R> {
    fn default() -> Self {
        ModelStore {
            generations: RwLock::new(FxHashMap::default()),
            results: RwLock::new(FxHashMap::default()),
            meta: RwLock::new(FxHashMap::default()),
        }
    }
}

impl<F, R> ModelStore<F, R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_old_model(&self, callable: Callable) -> Option<Arc<Model<F>>> {
        self.generations
            .read()
            .get(&callable)
            .and_then(|generations| generations.old.clone())
    }

    pub fn get_new_model(&self, callable: Callable) -> Option<Arc<Model<F>>> {
        self.generations
            .read()
            .get(&callable)
            .and_then(|generations| generations.new.clone())
    }

    /// The newest model of `callable`: the new generation if present, else the
    /// old one.
    pub fn get_model(&self, callable: Callable) -> Option<Arc<Model<F>>> {
        self.generations
            .read()
            .get(&callable)
            .and_then(|generations| generations.new.clone().or_else(|| generations.old.clone()))
    }

    /// The model callers of `callable` should see: the promoted generation,
    /// falling back to a new one only while nothing was promoted yet.
    pub fn callee_model(&self, callable: Callable) -> Option<Arc<Model<F>>> {
        self.generations
            .read()
            .get(&callable)
            .and_then(|generations| generations.old.clone().or_else(|| generations.new.clone()))
    }

    pub fn has_model(&self, callable: Callable) -> bool {
        self.generations
            .read()
            .get(&callable)
            .is_some_and(|generations| generations.new.is_some() || generations.old.is_some())
    }

    pub fn get_meta_data(&self, callable: Callable) -> Option<MetaData> {
        self.meta.read().get(&callable).copied()
    }

    /// Whether the last write for `callable` was a widening. Callables
    /// without metadata are not partial.
    pub fn get_is_partial(&self, callable: Callable) -> bool {
        self.get_meta_data(callable).is_some_and(|meta| meta.is_partial)
    }

    /// Write the outcome of analyzing `callable` at `step` into the new
    /// generation and record its result and metadata.
    pub fn add(&self, step: Step, callable: Callable, analyzed: AnalyzedCallable<F, R>) {
        self.generations
            .write()
            .entry(callable)
            .or_default()
            .new = Some(Arc::new(analyzed.model));
        self.results.write().insert(callable, analyzed.result);
        self.meta.write().insert(
            callable,
            MetaData {
                is_partial: analyzed.is_partial,
                step,
            },
        );
    }

    /// Install a model computed outside of this run directly into the old
    /// generation, tagged with `epoch` and iteration 0.
    pub fn add_predefined(&self, epoch: Epoch, callable: Callable, model: Model<F>) {
        self.generations
            .write()
            .entry(callable)
            .or_default()
            .old = Some(Arc::new(model));
        self.meta.write().insert(
            callable,
            MetaData {
                is_partial: false,
                step: Step::new(epoch, 0),
            },
        );
    }

    /// Promote the new generation of every callable in `callables` to old.
    /// Callables without a new generation keep their old one.
    pub fn oldify(&self, callables: &[Callable]) {
        let mut generations = self.generations.write();
        for callable in callables {
            if let Some(entry) = generations.get_mut(callable) {
                if let Some(new) = entry.new.take() {
                    entry.old = Some(new);
                }
            }
        }
    }

    /// Drop the new generation of every callable in `callables`.
    pub fn remove_new(&self, callables: &[Callable]) {
        let mut generations = self.generations.write();
        for callable in callables {
            if let Some(entry) = generations.get_mut(callable) {
                entry.new = None;
                if entry.old.is_none() {
                    generations.remove(callable);
                }
            }
        }
    }

    /// Drop the old generation of every callable in `callables`.
    pub fn remove_old(&self, callables: &[Callable]) {
        let mut generations = self.generations.write();
        for callable in callables {
            if let Some(entry) = generations.get_mut(callable) {
                entry.old = None;
                if entry.new.is_none() {
                    generations.remove(callable);
                }
            }
        }
    }

    /// Forget everything stored about `callable`.
    pub fn cleanup(&self, callable: Callable) {
        self.generations.write().remove(&callable);
        self.results.write().remove(&callable);
        self.meta.write().remove(&callable);
    }

    /// Forget everything stored about every callable.
    pub fn clear(&self) {
        self.generations.write().clear();
        self.results.write().clear();
        self.meta.write().clear();
    }

    /// Number of callables with at least one generation.
    pub fn len(&self) -> usize {
        self.generations.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.generations.read().is_empty()
    }
}

impl<F, R: Clone> ModelStore<F, R> {
    /// The latest result of `callable`, if any analysis produced one.
    pub fn get_result(&self, callable: Callable) -> Option<R> {
        self.results.read().get(&callable).cloned()
    }

    /// The latest result of `callable`, or `R::default()` when none exists.
    pub fn get_result_or_default(&self, callable: Callable) -> R
    where
        R: Default,
    {
        self.get_result(callable).unwrap_or_default()
    }

    /// Every callable with a model, in ascending order, with its newest model.
    pub fn snapshot(&self) -> Vec<(Callable, Arc<Model<F>>)> {
        let generations = self.generations.read();
        let mut snapshot: Vec<_> = generations
            .iter()
            .filter_map(|(callable, generations)| {
                generations
                    .new
                    .clone()
                    .or_else(|| generations.old.clone())
                    .map(|model| (*callable, model))
            })
            .collect();
        snapshot.sort_by_key(|(callable, _)| *callable);
        snapshot
    }
}
