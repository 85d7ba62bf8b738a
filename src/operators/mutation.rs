//! Mutation operators.

use super::random::RandomSource;
use crate::genome::Genome;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Perturbs the genes of a genome in place.
///
/// Implementations must leave locked genes (zero standard deviation)
/// untouched and report how many genes actually changed value.
pub trait MutationOperator {
    /// Mutates `genome`, scaling the perturbation by `strength`.
    ///
    /// Returns the number of genes whose value changed.
    fn mutate<R: RandomSource + ?Sized>(
        &self,
        genome: &mut Genome,
        strength: f64,
        random: &mut R,
    ) -> usize;
}

/// Independent Gaussian perturbation of each mutable gene.
///
/// Each mutable gene is hit with probability `chance` and moved by
/// `N(0, sd * strength)`. A result outside `[low, high]` wraps around when
/// the gene is circular; otherwise it is reflected off the bound when
/// `bounce` is set, or clamped.
///
/// ```
/// use u_genepool::genome::{Gene, Genome};
/// use u_genepool::operators::{GaussianMutation, MutationOperator, RngSource};
///
/// let mut genome = Genome::new(vec![Gene::new(0.5, 0.0, 1.0, 0.1); 4]).unwrap();
/// let mut random = RngSource::seeded(42);
/// let changed = GaussianMutation::default()
///     .with_chance(1.0)
///     .mutate(&mut genome, 1.0, &mut random);
/// assert_eq!(changed, 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GaussianMutation {
    /// Per-gene mutation probability (0.0–1.0).
    pub chance: f64,

    /// Reflect out-of-range values instead of clamping them.
    pub bounce: bool,
}

impl Default for GaussianMutation {
    fn default() -> Self {
        Self {
            chance: 0.1,
            bounce: false,
        }
    }
}

impl GaussianMutation {
    pub fn with_chance(mut self, chance: f64) -> Self {
        self.chance = chance.clamp(0.0, 1.0);
        self
    }

    pub fn with_bounce(mut self, bounce: bool) -> Self {
        self.bounce = bounce;
        self
    }
}

impl MutationOperator for GaussianMutation {
    fn mutate<R: RandomSource + ?Sized>(
        &self,
        genome: &mut Genome,
        strength: f64,
        random: &mut R,
    ) -> usize {
        let mut changed = 0;
        for i in 0..genome.len() {
            let gene = genome.genes()[i];
            if !gene.is_mutable() || random.uniform_double(0.0, 1.0) >= self.chance {
                continue;
            }
            let raw = gene.value + random.standard_normal() * gene.sd * strength;
            let value = if genome.circular_mutation(i) {
                wrap(raw, gene.low, gene.high)
            } else if self.bounce {
                reflect(raw, gene.low, gene.high)
            } else {
                raw.clamp(gene.low, gene.high)
            };
            if value != gene.value && genome.set_value(i, value).is_ok() {
                changed += 1;
            }
        }
        changed
    }
}

fn wrap(v: f64, low: f64, high: f64) -> f64 {
    let range = high - low;
    if !(range > 0.0) || !v.is_finite() {
        return v.clamp(low, high);
    }
    low + (v - low).rem_euclid(range)
}

fn reflect(v: f64, low: f64, high: f64) -> f64 {
    let range = high - low;
    if !(range > 0.0) || !v.is_finite() {
        return v.clamp(low, high);
    }
    let t = (v - low).rem_euclid(2.0 * range);
    if t > range {
        low + 2.0 * range - t
    } else {
        low + t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::Gene;
    use crate::operators::RngSource;

    fn genome(n: usize) -> Genome {
        Genome::new(vec![Gene::new(0.5, 0.0, 1.0, 0.3); n]).unwrap()
    }

    #[test]
    fn test_locked_genes_never_change() {
        let mut g = Genome::new(vec![Gene::new(0.5, 0.0, 1.0, 0.3), Gene::fixed(0.7)]).unwrap();
        let mut r = RngSource::seeded(42);
        let op = GaussianMutation::default().with_chance(1.0);
        for _ in 0..500 {
            let changed = op.mutate(&mut g, 1.0, &mut r);
            assert!(changed <= 1);
            assert_eq!(g.value(1), Some(0.7));
        }
    }

    #[test]
    fn test_zero_chance_changes_nothing() {
        let mut g = genome(5);
        let mut r = RngSource::seeded(42);
        let op = GaussianMutation::default().with_chance(0.0);
        assert_eq!(op.mutate(&mut g, 1.0, &mut r), 0);
        assert_eq!(g.values(), vec![0.5; 5]);
    }

    #[test]
    fn test_values_stay_in_bounds() {
        let mut r = RngSource::seeded(9);
        for bounce in [false, true] {
            let mut g = genome(3);
            let op = GaussianMutation::default()
                .with_chance(1.0)
                .with_bounce(bounce);
            for _ in 0..1000 {
                op.mutate(&mut g, 5.0, &mut r);
                for v in g.values() {
                    assert!((0.0..=1.0).contains(&v), "bounce={bounce}: {v}");
                }
            }
        }
    }

    #[test]
    fn test_circular_wraps() {
        assert!((wrap(1.25, 0.0, 1.0) - 0.25).abs() < 1e-12);
        assert!((wrap(-0.25, 0.0, 1.0) - 0.75).abs() < 1e-12);
        assert_eq!(wrap(3.0, 2.0, 2.0), 2.0);
    }

    #[test]
    fn test_reflect() {
        assert!((reflect(1.25, 0.0, 1.0) - 0.75).abs() < 1e-12);
        assert!((reflect(-0.25, 0.0, 1.0) - 0.25).abs() < 1e-12);
        assert!((reflect(2.25, 0.0, 1.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_changed_count_reported() {
        let mut g = genome(8);
        let before = g.values();
        let mut r = RngSource::seeded(3);
        let changed = GaussianMutation::default()
            .with_chance(0.5)
            .mutate(&mut g, 1.0, &mut r);
        let differing = before
            .iter()
            .zip(g.values())
            .filter(|(a, b)| **a != *b)
            .count();
        assert_eq!(changed, differing);
    }
}
