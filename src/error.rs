//! Error types.
//!
//! Duplicate fitness keys are not errors: they surface as
//! [`InsertOutcome::RejectedDuplicateKey`](crate::population::InsertOutcome).
//! Everything here is a condition the caller has to act on.

use std::path::PathBuf;
use thiserror::Error;

/// Faults raised while building or indexing a [`Genome`](crate::genome::Genome).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenomeError {
    #[error("gene sequence length mismatch: {field} has {actual} entries, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("gene {index}: bounds [{low}, {high}] are inverted or not comparable")]
    InvertedBounds { index: usize, low: f64, high: f64 },

    #[error("gene index {index} out of range for genome of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

/// A malformed persisted population or genome record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("record {record}: unexpected end of input while reading {expected}")]
    UnexpectedEof {
        record: usize,
        expected: &'static str,
    },

    #[error("record {record}: invalid {expected} token {token:?}")]
    InvalidToken {
        record: usize,
        expected: &'static str,
        token: String,
    },

    #[error("record {record}: unknown genome type tag {tag}")]
    UnknownGenomeType { record: usize, tag: i64 },

    #[error("record {record}: {source}")]
    Genome {
        record: usize,
        #[source]
        source: GenomeError,
    },
}

/// Errors returned by [`Population`](crate::population::Population) operations.
#[derive(Error, Debug)]
pub enum PopulationError {
    #[error("population is empty")]
    Empty,

    #[error("fitness {0} cannot be used as a population key")]
    InvalidFitness(f64),

    #[error("cannot generate a key above {0}")]
    KeySpaceExhausted(f64),

    #[error("genome has no mutable genes, mutation cannot produce a distinct clone")]
    ImmutableGenome,

    #[error("mutation operator changed no gene in {0} attempts")]
    MutationStalled(usize),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Genome(#[from] GenomeError),
}

pub type Result<T> = std::result::Result<T, PopulationError>;
