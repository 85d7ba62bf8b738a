//! Population configuration.
//!
//! [`PopulationConfig`] holds the policies that govern ranking, selection,
//! elite retention and resizing.

use super::selection::Selection;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How [`Population::resize`](super::Population::resize) fills new slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ResizeControl {
    /// Clone the worst member and redraw all its mutable genes.
    Randomise,

    /// Clone the worst member and mutate it until at least one gene changes.
    #[default]
    Mutate,
}

impl ResizeControl {
    /// Name used in parameter files.
    pub fn name(&self) -> &'static str {
        match self {
            ResizeControl::Randomise => "RandomiseResize",
            ResizeControl::Mutate => "MutateResize",
        }
    }
}

impl fmt::Display for ResizeControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResizeControl {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RandomiseResize" => Ok(ResizeControl::Randomise),
            "MutateResize" => Ok(ResizeControl::Mutate),
            _ => Err(format!("unknown resize control {s:?}")),
        }
    }
}

/// Configuration for a [`Population`](super::Population).
///
/// # Defaults
///
/// ```
/// use u_genepool::population::{PopulationConfig, ResizeControl, Selection};
///
/// let config = PopulationConfig::default();
/// assert_eq!(config.selection, Selection::RankBased);
/// assert_eq!(config.parents_to_keep, 0);
/// assert_eq!(config.resize_control, ResizeControl::Mutate);
/// assert!(!config.minimize);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_genepool::population::{PopulationConfig, Selection};
///
/// let config = PopulationConfig::default()
///     .with_selection(Selection::GammaBased)
///     .with_gamma(3.0)
///     .with_parents_to_keep(5)
///     .with_minimize(true);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PopulationConfig {
    /// Parent selection strategy.
    pub selection: Selection,

    /// Bias exponent for [`Selection::GammaBased`]. Must be positive;
    /// `1.0` is uniform.
    pub gamma: f64,

    /// Number of top-ranked members shielded from age-based eviction.
    ///
    /// Set to 0 to evict purely by age.
    pub parents_to_keep: usize,

    /// How growth fills new slots.
    pub resize_control: ResizeControl,

    /// Rank lower fitness as better.
    ///
    /// Keys are stored negated, so higher keys are always better internally.
    pub minimize: bool,

    /// Strength passed to the mutation operator during
    /// [`ResizeControl::Mutate`] growth.
    pub mutation_strength: f64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            selection: Selection::default(),
            gamma: 1.0,
            parents_to_keep: 0,
            resize_control: ResizeControl::default(),
            minimize: false,
            mutation_strength: 1.0,
        }
    }
}

impl PopulationConfig {
    /// Sets the selection strategy.
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// Sets the gamma-selection bias exponent.
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// Sets the number of elite members.
    pub fn with_parents_to_keep(mut self, n: usize) -> Self {
        self.parents_to_keep = n;
        self
    }

    /// Sets the growth strategy.
    pub fn with_resize_control(mut self, control: ResizeControl) -> Self {
        self.resize_control = control;
        self
    }

    /// Ranks lower fitness as better when `true`.
    pub fn with_minimize(mut self, minimize: bool) -> Self {
        self.minimize = minimize;
        self
    }

    /// Sets the mutation strength used during growth.
    pub fn with_mutation_strength(mut self, strength: f64) -> Self {
        self.mutation_strength = strength;
        self
    }

    /// Validates the configuration.
    ///
    /// Returns `Err` with a description if any parameter is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.gamma.is_finite() && self.gamma > 0.0) {
            return Err(format!("gamma must be positive and finite, got {}", self.gamma));
        }
        if !(self.mutation_strength.is_finite() && self.mutation_strength > 0.0) {
            return Err(format!(
                "mutation_strength must be positive and finite, got {}",
                self.mutation_strength
            ));
        }
        Ok(())
    }
}
