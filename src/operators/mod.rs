//! Strategies the population consumes but does not own.
//!
//! - [`RandomSource`]: uniform and rank-biased draws, with [`RngSource`]
//!   adapting any [`rand::Rng`]
//! - [`MutationOperator`]: in-place gene perturbation, with
//!   [`GaussianMutation`] as the stock implementation
//!
//! Both are passed in by the caller, so tests can substitute deterministic
//! stand-ins.

mod mutation;
mod random;

pub use mutation::{GaussianMutation, MutationOperator};
pub use random::{RandomSource, RngSource};
