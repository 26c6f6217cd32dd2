use std::hash::Hash;

/// Arena ID
/// an ID object can only be created by the [`CallGraph`](crate::CallGraph)
/// or the [`SymbolTable`](crate::SymbolTable) that owns the slot.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Id(pub(crate) usize);

impl Id {
    /// return raw ID as usize
    pub fn raw(self) -> usize {
        self.0
    }
}

pub trait Identifier:
    Sized + Clone + Copy + Hash + Ord + std::fmt::Debug + PartialEq + Eq + From<Id> + Into<Id>
{
    fn raw(self) -> usize {
        Into::<Id>::into(self).raw()
    }
}

macro_rules! identifier {
    ($(#[$attr:meta])* struct $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub(crate) Id);

        impl From<Id> for $name {
            fn from(value: Id) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Id {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl Identifier for $name {}
    };
}

identifier! {
    /// One analyzable unit: a function or method, a virtual dispatch point, or
    /// a global value. Equality is identity of the arena slot, never structure.
    struct Callable
}

identifier! {
    /// Interned name of a callable.
    struct Symbol
}
