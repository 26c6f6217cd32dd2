//! Interprocedural static analysis on top of a call graph.
//!
//! [`callgraph`] describes the analyzable units of a program and how they call
//! and override each other; [`fixpoint`] runs a set of analyses over them
//! until every per-callable summary is stable.

pub use kirin_callgraph as callgraph;
pub use kirin_fixpoint as fixpoint;

pub mod prelude {
    pub use kirin_callgraph::{CallGraph, Callable, CallableKind, DependencyGraph, Program};
    pub use kirin_fixpoint::lattice::{HasBottom, HasTop, Lattice, Widen, WideningStrategy};
    pub use kirin_fixpoint::{
        Analysis, AnalysisError, AnalysisKind, AnalyzeContext, Epoch, Fixpoint, FixpointConfig,
        FixpointError, FixpointReport, Interrupt, Model, Reanalysis, Scheduler, SchedulerPolicy,
        WideningCheck,
    };
}
