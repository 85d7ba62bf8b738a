//! Parent selection strategies.
//!
//! Ranks count from 0 at the worst member up to `len - 1` at the best, so
//! every biased strategy pushes draws towards high ranks.
//!
//! # References
//!
//! - Baker (1985), "Adaptive Selection Methods for Genetic Algorithms"
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"

use crate::operators::RandomSource;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Selection strategy for choosing parents.
///
/// # Examples
///
/// ```
/// use u_genepool::population::Selection;
///
/// let sel: Selection = "SqrtBasedSelection".parse().unwrap();
/// assert_eq!(sel, Selection::SqrtBased);
///
/// assert_eq!(Selection::GammaBased.to_string(), "GammaBasedSelection");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Selection {
    /// Every rank equally likely.
    Uniform,

    /// Probability linear in rank.
    RankBased,

    /// Probability follows the square root of rank; milder than
    /// [`RankBased`](Selection::RankBased).
    SqrtBased,

    /// Tunable bias set by the configured `gamma`: `1.0` is uniform,
    /// larger values favour the best more strongly.
    GammaBased,
}

impl Default for Selection {
    fn default() -> Self {
        Selection::RankBased
    }
}

impl Selection {
    /// Draws a rank in `0..len`. `gamma` only affects
    /// [`GammaBased`](Selection::GammaBased).
    ///
    /// Callers guarantee `len > 0`.
    pub(crate) fn pick_rank<R: RandomSource + ?Sized>(
        &self,
        len: usize,
        gamma: f64,
        random: &mut R,
    ) -> usize {
        let last = len.saturating_sub(1);
        let rank = match *self {
            Selection::Uniform => random.uniform_int(0, last),
            Selection::RankBased => random.rank_biased_int(1, len).saturating_sub(1),
            Selection::SqrtBased => random.sqrt_biased_int(0, last),
            Selection::GammaBased => random.gamma_biased_int(0, last, gamma),
        };
        rank.min(last)
    }

    /// Name used in parameter files.
    pub fn name(&self) -> &'static str {
        match self {
            Selection::Uniform => "UniformSelection",
            Selection::RankBased => "RankBasedSelection",
            Selection::SqrtBased => "SqrtBasedSelection",
            Selection::GammaBased => "GammaBasedSelection",
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Selection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UniformSelection" => Ok(Selection::Uniform),
            "RankBasedSelection" => Ok(Selection::RankBased),
            "SqrtBasedSelection" => Ok(Selection::SqrtBased),
            "GammaBasedSelection" => Ok(Selection::GammaBased),
            _ => Err(format!("unknown parent selection {s:?}")),
        }
    }
}
