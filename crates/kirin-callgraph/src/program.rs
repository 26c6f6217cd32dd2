use crate::id::Callable;

/// What the engine must do with a callable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CallableKind {
    /// A function or method with a body.
    Function,
    /// A function or method without a body. Summarized by the obscure model.
    Stub,
    /// A virtual dispatch point: the join over its direct implementation and
    /// every overriding implementation.
    Override,
    /// A module-level or global value. Never analyzed.
    Object,
}

impl CallableKind {
    /// Functions and stubs are "real" units: they stand for one definition.
    pub fn is_real(self) -> bool {
        matches!(self, CallableKind::Function | CallableKind::Stub)
    }
}

/// The unit catalog produced by a program-analysis front end.
///
/// All methods may panic when handed a callable the catalog never allocated;
/// that is a misuse of the front end, not a property of the analyzed program.
pub trait Program: Sync {
    /// A function body, in whatever form the analyses consume.
    type Definition: Sync;

    fn kind(&self, callable: Callable) -> CallableKind;

    /// Human-readable name, used in diagnostics.
    fn name(&self, callable: Callable) -> &str;

    /// The body of `callable`, or `None` for stubs and non-function units.
    fn definition(&self, callable: Callable) -> Option<&Self::Definition>;

    /// Direct callees of `callable`, in call-site order.
    fn callees(&self, callable: Callable) -> &[Callable];

    /// Overriding implementations of an override unit. Empty for other kinds.
    fn overriding(&self, callable: Callable) -> &[Callable];

    /// The method an override unit dispatches to when no override applies.
    fn direct_implementation(&self, callable: Callable) -> Option<Callable>;
}
