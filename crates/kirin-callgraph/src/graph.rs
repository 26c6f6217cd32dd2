use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use smallvec::SmallVec;

use crate::dependency::DependencyGraph;
use crate::id::{Callable, Id, Identifier, Symbol};
use crate::intern::SymbolTable;
use crate::program::{CallableKind, Program};

/// Everything the call graph knows about one callable.
#[derive(Clone, Debug)]
pub struct CallableInfo<D> {
    id: Callable,
    name: Symbol,
    kind: CallableKind,
    definition: Option<D>,
    callees: SmallVec<[Callable; 4]>,
    /// Overriding implementations (override units only).
    overriding: SmallVec<[Callable; 4]>,
    /// Direct implementation (override units only).
    implementation: Option<Callable>,
}

impl<D> CallableInfo<D> {
    pub fn id(&self) -> Callable {
        self.id
    }

    pub fn kind(&self) -> CallableKind {
        self.kind
    }

    pub fn definition(&self) -> Option<&D> {
        self.definition.as_ref()
    }

    pub fn callees(&self) -> &[Callable] {
        &self.callees
    }
}

/// An in-memory unit catalog: callables, call edges, and override relations.
///
/// `D` is the body type handed to the analyses.
#[derive(Clone, Debug)]
pub struct CallGraph<D> {
    callables: Vec<CallableInfo<D>>,
    symbols: SymbolTable,
}

impl<D> Default for CallGraph<D> {
    fn default() -> Self {
        Self {
            callables: Vec::new(),
            symbols: SymbolTable::default(),
        }
    }
}

#[bon::bon]
impl<D> CallGraph<D> {
    /// Allocate a function with a body.
    ///
    /// ```ignore
    /// let f = graph.function().name("f").definition(body).new();
    /// ```
    #[builder(finish_fn = new)]
    pub fn function(&mut self, #[builder(into)] name: String, definition: D) -> Callable {
        self.alloc(name, CallableKind::Function, Some(definition), None)
    }

    /// Allocate a function without a body.
    #[builder(finish_fn = new)]
    pub fn stub(&mut self, #[builder(into)] name: String) -> Callable {
        self.alloc(name, CallableKind::Stub, None, None)
    }

    /// Allocate a global value.
    #[builder(finish_fn = new)]
    pub fn object(&mut self, #[builder(into)] name: String) -> Callable {
        self.alloc(name, CallableKind::Object, None, None)
    }

    /// Allocate the virtual dispatch point of `implementation`.
    ///
    /// Without an explicit name the override is called `<implementation>@override`.
    ///
    /// # Panics
    ///
    /// Panics if `implementation` was not allocated by this graph.
    #[builder(finish_fn = new)]
    pub fn override_of(
        &mut self,
        implementation: Callable,
        #[builder(into)] name: Option<String>,
    ) -> Callable {
        let name =
            name.unwrap_or_else(|| format!("{}@override", self.callable_name(implementation)));
        self.alloc(name, CallableKind::Override, None, Some(implementation))
    }
}

impl<D> CallGraph<D> {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(
        &mut self,
        name: String,
        kind: CallableKind,
        definition: Option<D>,
        implementation: Option<Callable>,
    ) -> Callable {
        let id = Callable::from(Id(self.callables.len()));
        let name = self.symbols.intern(name);
        self.callables.push(CallableInfo {
            id,
            name,
            kind,
            definition,
            callees: SmallVec::new(),
            overriding: SmallVec::new(),
            implementation,
        });
        id
    }

    /// Record that `caller` calls `callee`. Duplicate edges are ignored.
    pub fn add_call(&mut self, caller: Callable, callee: Callable) {
        self.expect_info(callee);
        let callees = &mut self.expect_info_mut(caller).callees;
        if !callees.contains(&callee) {
            callees.push(callee);
        }
    }

    /// Record that `method` overrides the dispatch point `target`.
    ///
    /// # Panics
    ///
    /// Panics if `target` is not an override unit.
    pub fn add_overriding(&mut self, target: Callable, method: Callable) {
        self.expect_info(method);
        let info = self.expect_info_mut(target);
        assert_eq!(
            info.kind,
            CallableKind::Override,
            "overriding implementations can only be attached to override units"
        );
        if !info.overriding.contains(&method) {
            info.overriding.push(method);
        }
    }

    pub fn get_info(&self, callable: Callable) -> Option<&CallableInfo<D>> {
        self.callables.get(callable.raw())
    }

    pub fn expect_info(&self, callable: Callable) -> &CallableInfo<D> {
        self.get_info(callable).unwrap_or_else(|| {
            panic!("Expected to find info for {callable:?} in call graph, but none was found.")
        })
    }

    fn expect_info_mut(&mut self, callable: Callable) -> &mut CallableInfo<D> {
        self.callables.get_mut(callable.raw()).unwrap_or_else(|| {
            panic!("Expected to find info for {callable:?} in call graph, but none was found.")
        })
    }

    /// Resolved name of `callable`.
    pub fn callable_name(&self, callable: Callable) -> &str {
        self.symbols
            .resolve(self.expect_info(callable).name)
            .unwrap_or("<unnamed>")
    }

    pub fn len(&self) -> usize {
        self.callables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callables.is_empty()
    }

    /// Every allocated callable, in allocation order.
    pub fn callables(&self) -> impl Iterator<Item = Callable> + '_ {
        self.callables.iter().map(|info| info.id)
    }

    /// Every callable the fixpoint should analyze, callees before callers.
    ///
    /// Strongly connected components are emitted in reverse topological order
    /// of the call relation; members of one component keep allocation order.
    /// Override units come after their implementations. Objects are skipped.
    pub fn analysis_order(&self) -> Vec<Callable> {
        let mut graph = DiGraph::<Callable, ()>::with_capacity(self.callables.len(), 0);
        let nodes: Vec<NodeIndex> = self
            .callables
            .iter()
            .map(|info| graph.add_node(info.id))
            .collect();
        for info in &self.callables {
            let from = nodes[info.id.raw()];
            let targets = info
                .callees
                .iter()
                .chain(info.overriding.iter())
                .chain(info.implementation.iter());
            for target in targets {
                graph.add_edge(from, nodes[target.raw()], ());
            }
        }

        tarjan_scc(&graph)
            .into_iter()
            .flat_map(|mut component| {
                component.sort();
                component
            })
            .map(|node| graph[node])
            .filter(|callable| self.expect_info(*callable).kind != CallableKind::Object)
            .collect()
    }

    /// Callee → dependents edges: reversed calls plus, for each override unit,
    /// its direct implementation and every overriding implementation.
    pub fn dependency_graph(&self) -> DependencyGraph {
        let mut dependencies = DependencyGraph::default();
        for info in &self.callables {
            let sources = info
                .callees
                .iter()
                .chain(info.overriding.iter())
                .chain(info.implementation.iter());
            for source in sources {
                dependencies.add_edge(*source, info.id);
            }
        }
        dependencies
    }
}

impl<D: Sync> Program for CallGraph<D> {
    type Definition = D;

    fn kind(&self, callable: Callable) -> CallableKind {
        self.expect_info(callable).kind
    }

    fn name(&self, callable: Callable) -> &str {
        self.callable_name(callable)
    }

    fn definition(&self, callable: Callable) -> Option<&D> {
        self.expect_info(callable).definition.as_ref()
    }

    fn callees(&self, callable: Callable) -> &[Callable] {
        &self.expect_info(callable).callees
    }

    fn overriding(&self, callable: Callable) -> &[Callable] {
        &self.expect_info(callable).overriding
    }

    fn direct_implementation(&self, callable: Callable) -> Option<Callable> {
        self.expect_info(callable).implementation
    }
}
