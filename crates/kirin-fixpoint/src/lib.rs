//! Interprocedural fixpoint engine.
//!
//! Analyses implement [`Analysis`] and are registered as a tuple, which
//! implements [`AnalysisSet`]. [`Fixpoint`] then summarizes every callable of
//! a [`Program`](kirin_callgraph::Program), re-analyzing callers whenever a
//! callee's summary grows, until all summaries are stable.
//!
//! Summaries live in a two-generation [`ModelStore`]: callables of one batch
//! only read summaries promoted before the batch started, which makes the
//! result independent of how the [`Scheduler`] splits the work.

mod analysis;
mod analyze;
mod config;
mod convergence;
mod error;
mod fixpoint;
mod interrupt;
pub mod lattice;
mod model;
mod scheduler;
mod set;
mod store;

pub use analysis::{Analysis, AnalysisKind, AnalyzeContext, CalleeModel, CalleeModels};
pub use config::{FixpointConfig, Reanalysis, WideningCheck};
pub use convergence::{Convergence, NonMonotonicWidening};
pub use error::{AnalysisError, FixpointError};
pub use fixpoint::{BatchSummary, ExpensiveCallable, Fixpoint, FixpointReport, FixpointState};
pub use interrupt::Interrupt;
pub use model::{AnalyzedCallable, Epoch, MetaData, Model, Step};
pub use scheduler::{Scheduler, SchedulerPolicy};
pub use set::{AnalysisSet, CallableContext};
pub use store::ModelStore;

/// The summary type produced by the analysis set `S`.
pub type ModelOf<P, S> = Model<<S as AnalysisSet<P>>::Fragments>;
