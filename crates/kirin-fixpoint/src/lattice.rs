//! Lattice vocabulary for analysis models.
//!
//! Nothing in the driver depends on these traits; they are the building
//! blocks most [`Analysis`](crate::Analysis) implementations end up writing
//! anyway, and the law checks in `kirin-test-utils` are phrased over them.

pub trait Lattice {
    fn join(&self, other: &Self) -> Self;
    fn is_subseteq(&self, other: &Self) -> bool;
}

pub trait HasBottom: Lattice {
    fn bottom() -> Self;
}

pub trait HasTop: Lattice {
    fn top() -> Self;
}

/// Lattice with a widening operator.
///
/// ## Algebraic contracts
///
/// `x ⊑ widen(x, y)` and `y ⊑ widen(x, y)`. The ascending chain
/// `x₀, widen(x₀, x₁), widen(widen(x₀, x₁), x₂), ...` must stabilize
/// in finite steps.
pub trait Widen: Lattice {
    fn widen(&self, next: &Self) -> Self;
}

/// When an analysis should widen instead of join while a callable is
/// re-analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WideningStrategy {
    /// Widen in every iteration.
    AllJoins,
    /// Only join, never widen. Suitable for finite-height lattices that
    /// guarantee termination without widening.
    Never,
    /// Join for the first `n` iterations, then widen.
    Delayed(usize),
}

impl Default for WideningStrategy {
    fn default() -> Self {
        WideningStrategy::Delayed(2)
    }
}

impl WideningStrategy {
    /// Merge `current` with `incoming` according to this strategy.
    pub fn merge<V: Widen>(&self, current: &V, incoming: &V, iteration: usize) -> V {
        match self {
            Self::AllJoins => current.widen(incoming),
            Self::Never => current.join(incoming),
            Self::Delayed(n) => {
                if iteration <= *n {
                    current.join(incoming)
                } else {
                    current.widen(incoming)
                }
            }
        }
    }
}
