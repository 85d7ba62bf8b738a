//! Population management for asynchronous steady-state genetic algorithms.
//!
//! Workers evaluate candidates independently and feed the results back one
//! at a time; this crate keeps the breeding pool those results land in.
//!
//! - **Genomes**: bounded real-valued genes with per-gene mutation widths,
//!   locked genes and circular (wrap-around) ranges, plus a plain text
//!   record format.
//! - **Population**: a fitness-ranked store with rank-biased parent
//!   selection, elitism, age-based eviction and resizing.
//! - **Operators**: the random source and mutation operator the population
//!   consumes, as traits with stock implementations.
//!
//! # Example
//!
//! ```
//! use u_genepool::genome::{Gene, Genome};
//! use u_genepool::operators::RngSource;
//! use u_genepool::population::{Population, PopulationConfig, Selection};
//!
//! let config = PopulationConfig::default()
//!     .with_selection(Selection::RankBased)
//!     .with_parents_to_keep(2);
//! let mut population = Population::new(config).unwrap();
//!
//! let seed = Genome::new(vec![Gene::new(0.5, 0.0, 1.0, 0.1); 3]).unwrap();
//! population.initialise(10, &seed);
//!
//! let mut random = RngSource::seeded(42);
//! let (parent, _rank) = population.choose_parent(&mut random).unwrap();
//! let mut child = parent.clone();
//! child.set_fitness(1.5);
//! population.insert(child, 10).unwrap();
//! assert_eq!(population.len(), 10);
//! ```

pub mod error;
pub mod genome;
pub mod operators;
pub mod population;

pub use error::{GenomeError, ParseError, PopulationError, Result};
