//! Random number source consumed by the population.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Source of the random draws used for selection, randomisation and
/// mutation.
///
/// Implementors supply the two uniform primitives. The biased integer
/// draws default to an inverse-CDF power family over the uniform double:
///
/// ```text
/// index = lo + floor(n * u^(1/p)),  u ~ U[0, 1),  n = hi - lo + 1
/// ```
///
/// whose density over the unit interval is proportional to `x^(p-1)`.
/// Higher indices are never less likely than lower ones for `p >= 1`.
///
/// | draw | `p` | shape |
/// |------|-----|-------|
/// | [`rank_biased_int`](Self::rank_biased_int) | 2 | linear in rank |
/// | [`sqrt_biased_int`](Self::sqrt_biased_int) | 1.5 | square root of rank |
/// | [`gamma_biased_int`](Self::gamma_biased_int) | `gamma` | `gamma = 1` is uniform |
pub trait RandomSource {
    /// Uniform integer in `[lo, hi]`. Returns `lo` when `hi <= lo`.
    fn uniform_int(&mut self, lo: usize, hi: usize) -> usize;

    /// Uniform double in `[lo, hi]`. Returns `lo` when the range is empty.
    fn uniform_double(&mut self, lo: f64, hi: f64) -> f64;

    /// Integer in `[lo, hi]` with probability growing linearly towards `hi`.
    fn rank_biased_int(&mut self, lo: usize, hi: usize) -> usize {
        power_biased_int(self, lo, hi, 2.0)
    }

    /// Integer in `[lo, hi]` with a milder, square-root bias towards `hi`.
    fn sqrt_biased_int(&mut self, lo: usize, hi: usize) -> usize {
        power_biased_int(self, lo, hi, 1.5)
    }

    /// Integer in `[lo, hi]` with a bias towards `hi` that sharpens as
    /// `gamma` grows past 1.
    fn gamma_biased_int(&mut self, lo: usize, hi: usize, gamma: f64) -> usize {
        power_biased_int(self, lo, hi, gamma)
    }

    /// Standard normal deviate.
    ///
    /// The default runs Box-Muller over [`uniform_double`](Self::uniform_double)
    /// so uniform-only sources still work; [`RngSource`] samples
    /// [`rand_distr::StandardNormal`] instead.
    fn standard_normal(&mut self) -> f64 {
        let u1 = 1.0 - self.uniform_double(0.0, 1.0);
        let u2 = self.uniform_double(0.0, 1.0);
        if u1 <= 0.0 {
            return 0.0;
        }
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }
}

fn power_biased_int<R: RandomSource + ?Sized>(random: &mut R, lo: usize, hi: usize, p: f64) -> usize {
    if hi <= lo {
        return lo;
    }
    let p = if p.is_finite() && p > 0.0 { p } else { 1.0 };
    let n = hi - lo + 1;
    let u = random.uniform_double(0.0, 1.0).clamp(0.0, 1.0);
    let offset = (u.powf(1.0 / p) * n as f64) as usize;
    lo + offset.min(n - 1)
}

/// [`RandomSource`] backed by any [`rand::Rng`].
///
/// ```
/// use u_genepool::operators::{RandomSource, RngSource};
///
/// let mut random = RngSource::seeded(42);
/// let i = random.rank_biased_int(0, 9);
/// assert!(i <= 9);
/// ```
#[derive(Debug, Clone)]
pub struct RngSource<R = StdRng> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    pub fn into_inner(self) -> R {
        self.rng
    }
}

impl RngSource<StdRng> {
    /// Deterministic source for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl Default for RngSource<StdRng> {
    fn default() -> Self {
        Self::seeded(rand::random())
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn uniform_int(&mut self, lo: usize, hi: usize) -> usize {
        if hi <= lo {
            return lo;
        }
        self.rng.random_range(lo..=hi)
    }

    fn uniform_double(&mut self, lo: f64, hi: f64) -> f64 {
        if !(hi > lo) {
            return lo;
        }
        let u: f64 = self.rng.random();
        // convex combination cannot overflow for finite bounds
        (lo * (1.0 - u) + hi * u).clamp(lo, hi)
    }

    fn standard_normal(&mut self) -> f64 {
        self.rng.sample(StandardNormal)
    }
}
