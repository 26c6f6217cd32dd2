use std::time::Duration;

use crate::model::Epoch;
use crate::scheduler::SchedulerPolicy;

/// What the engine does when a widened model is not above its operands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WideningCheck {
    /// Skip the comparison.
    Off,
    /// Log the violation at error level and keep going.
    #[default]
    Log,
    /// Abort the run with [`FixpointError::NonMonotonicWidening`](crate::FixpointError::NonMonotonicWidening).
    Fail,
}

/// Which callables are re-analyzed after one of their dependencies changed.
///
/// On a chain `a -> b -> c` where only `c` was widened, the next batch is
/// `[c, b]` under [`Dependents`](Self::Dependents) and `[c, b, a]` under
/// [`TransitiveDependents`](Self::TransitiveDependents). Both reach the same
/// fixpoint; the first re-analyzes `a` one batch later, and only if `b`
/// changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Reanalysis {
    /// The partial callables and their direct callers: the minimal set that
    /// can observe a changed summary in the next batch.
    #[default]
    Dependents,
    /// The partial callables and everything that transitively depends on
    /// them, so the whole caller chain is scheduled at once.
    TransitiveDependents,
}

/// Tunables of one fixpoint run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FixpointConfig {
    pub epoch: Epoch,
    /// Hard cap on the number of iterations before the run is abandoned.
    pub max_iterations: usize,
    /// Callables taking longer than this in one iteration are reported.
    pub expensive_threshold: Duration,
    /// How many remaining callable names to report when the cap is hit.
    pub divergence_sample: usize,
    pub widening_check: WideningCheck,
    pub reanalysis: Reanalysis,
    pub policy: SchedulerPolicy,
}

impl Default for FixpointConfig {
    fn default() -> Self {
        FixpointConfig {
            epoch: Epoch::INITIAL,
            max_iterations: 100,
            expensive_threshold: Duration::from_millis(500),
            divergence_sample: 10,
            widening_check: WideningCheck::default(),
            reanalysis: Reanalysis::default(),
            policy: SchedulerPolicy::default(),
        }
    }
}

impl FixpointConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_epoch(mut self, epoch: Epoch) -> Self {
        self.epoch = epoch;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_expensive_threshold(mut self, threshold: Duration) -> Self {
        self.expensive_threshold = threshold;
        self
    }

    pub fn with_divergence_sample(mut self, sample: usize) -> Self {
        self.divergence_sample = sample;
        self
    }

    pub fn with_widening_check(mut self, check: WideningCheck) -> Self {
        self.widening_check = check;
        self
    }

    pub fn with_reanalysis(mut self, reanalysis: Reanalysis) -> Self {
        self.reanalysis = reanalysis;
        self
    }

    pub fn with_policy(mut self, policy: SchedulerPolicy) -> Self {
        self.policy = policy;
        self
    }
}
