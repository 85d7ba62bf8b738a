//! Ranked breeding population.
//!
//! A [`Population`] keeps genomes ordered by fitness, draws parents with a
//! configurable rank bias ([`Selection`]), and bounds its size by evicting
//! the member that has waited longest outside the elite.
//!
//! # Key Types
//!
//! - [`Population`]: the ranked store and its insert, select and resize operations
//! - [`PopulationConfig`]: selection, elite size, growth strategy and objective sense
//! - [`FitnessKey`]: totally ordered fitness used as the ranking key
//!
//! Populations persist to plain text files with
//! [`Population::write_population`] and [`Population::read_population`].
//!
//! # References
//!
//! - Whitley (1989), "The GENITOR Algorithm and Selection Pressure"
//! - Syswerda (1991), "A Study of Reproduction in Generational and
//!   Steady-State Genetic Algorithms"

mod config;
mod index;
mod key;
mod persist;
mod pool;
mod selection;

pub use config::{PopulationConfig, ResizeControl};
pub use key::FitnessKey;
pub use pool::{InsertOutcome, Population};
pub use selection::Selection;
