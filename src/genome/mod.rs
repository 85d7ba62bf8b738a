//! Candidate solutions.
//!
//! A [`Genome`] is a vector of real-valued [`Gene`]s, each with its own
//! range and Gaussian mutation standard deviation, plus a fitness scalar.
//! Genes with a zero standard deviation are locked.
//!
//! The circular mutation property is stored either as one shared flag or
//! as one flag per gene ([`CircularMutation`]); the choice is made when the
//! genome is built.
//!
//! Genomes serialise to a plain text record (see [`record`]) through
//! [`Display`](std::fmt::Display) and are read back with
//! [`Genome::read_record`].

pub mod record;
mod types;

pub use record::{GLOBAL_CIRCULAR_TAG, PER_GENE_CIRCULAR_TAG};
pub use types::{CircularMutation, Gene, Genome, UNEVALUATED_FITNESS};
