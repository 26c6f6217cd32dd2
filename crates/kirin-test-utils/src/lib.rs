//! Shared fixtures for the fixpoint engine's tests: lattice-law assertions,
//! a toy program representation, and two small analyses over it.

mod height;
pub mod lattice;
mod reach;
mod toy;

pub use height::{Height, HeightAnalysis, ToyFailure};
pub use reach::{Reach, ReachAnalysis};
pub use toy::{ToyBody, ToyProgram, chain, cycle};
