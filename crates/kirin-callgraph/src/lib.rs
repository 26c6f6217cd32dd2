//! Analyzable units and the static call structure the fixpoint engine runs over.
//!
//! A [`Callable`] is an arena identifier handed out by a [`CallGraph`]. The
//! engine itself only talks to the [`Program`] trait, so any front end that can
//! answer "what kind of unit is this, and does it have a body" can drive it.

mod dependency;
mod graph;
mod id;
mod intern;
mod program;


pub use dependency::DependencyGraph;
pub use graph::{CallGraph, CallableInfo};
pub use id::{Callable, Id, Identifier, Symbol};
pub use intern::SymbolTable;
pub use program::{CallableKind, Program};
