use kirin_callgraph::Callable;

use crate::analysis::AnalysisKind;
use crate::model::Step;

/// Failure reported by an analysis plugin for one callable.
///
/// [`Untracked`](Self::Untracked) is soft: the engine logs it and the callable
/// contributes nothing for that analysis this round. Everything else aborts the
/// run.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// An unresolved reference or untracked type made the body unanalyzable.
    #[error("untracked reference: {reason}")]
    Untracked { reason: String },
    /// The plugin observed the run's interrupt flag and gave up.
    #[error("interrupted")]
    Interrupted,
    /// Plugin-defined failure.
    #[error(transparent)]
    Custom(Box<dyn std::error::Error + Send + Sync>),
}

impl AnalysisError {
    pub fn untracked(reason: impl Into<String>) -> Self {
        AnalysisError::Untracked {
            reason: reason.into(),
        }
    }

    /// Wrap an arbitrary error as [`AnalysisError::Custom`].
    pub fn custom(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        AnalysisError::Custom(Box::new(error))
    }
}

/// Fatal error of a fixpoint run.
///
/// Apart from [`Analysis`](Self::Analysis) and [`Interrupted`](Self::Interrupted)
/// every variant is an inconsistency in the engine's own bookkeeping or a
/// misuse of its API. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum FixpointError {
    #[error("fixpoint inconsistency: `{name}` was written at {stored} but is analyzed at {requested}")]
    EpochMismatch {
        callable: Callable,
        name: String,
        stored: Step,
        requested: Step,
    },
    #[error("no initial model for `{name}`")]
    MissingInitialModel { callable: Callable, name: String },
    #[error("`{name}` is an object and cannot be analyzed")]
    ObjectAnalyzed { callable: Callable, name: String },
    #[error("`{name}` lost its definition in iteration {iteration}")]
    DefinitionDisappeared {
        callable: Callable,
        name: String,
        iteration: usize,
    },
    #[error(
        "re-analysis in iteration {iteration} scheduled `{name}`, which is not part of the analyzed callables"
    )]
    RescheduleMismatch {
        callable: Callable,
        name: String,
        iteration: usize,
    },
    #[error(
        "failed to reach a fixpoint after {iterations} iterations ({remaining} callables left, including {})",
        .sample.join(", ")
    )]
    IterationLimit {
        iterations: usize,
        remaining: usize,
        sample: Vec<String>,
    },
    #[error("analysis `{kind}` failed on `{name}`: {source}")]
    Analysis {
        callable: Callable,
        name: String,
        kind: AnalysisKind,
        #[source]
        source: AnalysisError,
    },
    #[error("interrupted while analyzing `{name}`")]
    Interrupted { callable: Callable, name: String },
    #[error("widening of `{name}` does not dominate its operands for {}", kinds_list(.kinds))]
    NonMonotonicWidening {
        callable: Callable,
        name: String,
        kinds: Vec<AnalysisKind>,
    },
    #[error("failed to build the worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

fn kinds_list(kinds: &[AnalysisKind]) -> String {
    kinds
        .iter()
        .map(AnalysisKind::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
