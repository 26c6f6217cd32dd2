use std::fmt;

/// Generation marker distinguishing independent runs.
///
/// Models installed from outside the analyzed set live in
/// [`Epoch::PREDEFINED`]; a fresh run uses [`Epoch::INITIAL`] unless the host
/// picks its own tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Epoch(u32);

impl Epoch {
    pub const PREDEFINED: Epoch = Epoch(0);
    pub const INITIAL: Epoch = Epoch(1);

    pub const fn new(tag: u32) -> Self {
        Epoch(tag)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Epoch::PREDEFINED => f.write_str("predefined"),
            Epoch::INITIAL => f.write_str("initial"),
            Epoch(tag) => write!(f, "epoch {tag}"),
        }
    }
}

/// Position of a write inside a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Step {
    pub epoch: Epoch,
    pub iteration: usize,
}

impl Step {
    pub fn new(epoch: Epoch, iteration: usize) -> Self {
        Step { epoch, iteration }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, iteration {}", self.epoch, self.iteration)
    }
}

/// Per-callable summary: one optional fragment per registered analysis plus
/// the global obscurity flag.
///
/// `F` is the fragment tuple of an [`AnalysisSet`](crate::AnalysisSet). A
/// missing fragment stands for that analysis' empty model.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Model<F> {
    pub fragments: F,
    /// Set when the callable's behavior is unknown. Never reset within a run.
    pub is_obscure: bool,
}

impl<F: Default> Model<F> {
    /// The model without any fragments.
    pub fn empty() -> Self {
        Model {
            fragments: F::default(),
            is_obscure: false,
        }
    }
}

impl<F> Model<F> {
    pub fn new(fragments: F) -> Self {
        Model {
            fragments,
            is_obscure: false,
        }
    }

    pub fn obscure(fragments: F) -> Self {
        Model {
            fragments,
            is_obscure: true,
        }
    }
}

/// Bookkeeping stored next to every summary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetaData {
    /// Whether the last write was a widening, i.e. the callable (and thus its
    /// dependents) has not converged yet.
    pub is_partial: bool,
    pub step: Step,
}

/// Outcome of analyzing one callable in one iteration.
#[derive(Clone, Debug)]
pub struct AnalyzedCallable<F, R> {
    pub is_partial: bool,
    pub model: Model<F>,
    pub result: R,
}
