use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::id::Callable;

/// Static callee → dependents relation, immutable for the duration of a run.
///
/// A dependent of `c` is any unit whose summary may change when the summary of
/// `c` changes: its callers, and the override units `c` implements.
#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    edges: FxHashMap<Callable, SmallVec<[Callable; 4]>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(callee, dependent)` pairs.
    pub fn from_edges(edges: impl IntoIterator<Item = (Callable, Callable)>) -> Self {
        let mut graph = Self::default();
        for (callee, dependent) in edges {
            graph.add_edge(callee, dependent);
        }
        graph
    }

    /// Record that `dependent` must be reconsidered whenever `callee` changes.
    /// Duplicate edges are ignored.
    pub fn add_edge(&mut self, callee: Callable, dependent: Callable) {
        let dependents = self.edges.entry(callee).or_default();
        if !dependents.contains(&dependent) {
            dependents.push(dependent);
        }
    }

    /// Direct dependents of `callable`, in insertion order.
    pub fn dependents(&self, callable: Callable) -> &[Callable] {
        self.edges
            .get(&callable)
            .map(|dependents| dependents.as_slice())
            .unwrap_or(&[])
    }

    /// `seeds` plus everything reachable from them along dependent edges.
    pub fn transitive_dependents(
        &self,
        seeds: impl IntoIterator<Item = Callable>,
    ) -> FxHashSet<Callable> {
        let mut visited = FxHashSet::default();
        let mut worklist: Vec<Callable> = seeds.into_iter().collect();
        while let Some(callable) = worklist.pop() {
            if visited.insert(callable) {
                worklist.extend(
                    self.dependents(callable)
                        .iter()
                        .filter(|dependent| !visited.contains(*dependent)),
                );
            }
        }
        visited
    }

    /// Number of callables with at least one dependent.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}
