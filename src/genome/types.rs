//! The [`Genome`] entity.

use crate::error::GenomeError;
use crate::operators::RandomSource;
use std::cmp::Ordering;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fitness carried by a genome that has not been evaluated yet.
pub const UNEVALUATED_FITNESS: f64 = -f64::MAX;

/// One locus: its current value, the range it may take, and the Gaussian
/// mutation standard deviation.
///
/// A standard deviation of exactly zero locks the gene: neither
/// [`Genome::randomise`] nor the mutation operators will touch it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Gene {
    pub value: f64,
    pub low: f64,
    pub high: f64,
    pub sd: f64,
}

impl Gene {
    /// Creates a mutable gene.
    pub fn new(value: f64, low: f64, high: f64, sd: f64) -> Self {
        Self {
            value,
            low,
            high,
            sd,
        }
    }

    /// Creates a locked gene pinned at `value`.
    pub fn fixed(value: f64) -> Self {
        Self {
            value,
            low: value,
            high: value,
            sd: 0.0,
        }
    }

    /// Whether randomisation and mutation may change this gene.
    pub fn is_mutable(&self) -> bool {
        self.sd != 0.0
    }
}

/// How the circular (wrap-around) mutation property is stored.
///
/// The variant is fixed when the genome is built and never changes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CircularMutation {
    /// One flag shared by every gene.
    Global(bool),
    /// One flag per gene.
    PerGene(Vec<bool>),
}

/// A candidate solution: genes with bounds and mutation metadata, plus
/// the fitness assigned by an external evaluator.
///
/// # Examples
///
/// ```
/// use u_genepool::genome::{Gene, Genome};
///
/// let mut genome = Genome::new(vec![
///     Gene::new(0.5, 0.0, 1.0, 0.1),
///     Gene::fixed(2.0),
/// ])
/// .unwrap();
/// assert!(!genome.is_evaluated());
///
/// genome.set_fitness(3.5);
/// assert_eq!(genome.fitness(), 3.5);
/// assert_eq!(genome.mutable_gene_count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "GenomeFields")
)]
pub struct Genome {
    genes: Vec<Gene>,
    circular: CircularMutation,
    fitness: f64,
}

/// Unchecked wire form of a [`Genome`]; deserialised genomes go through
/// the same validation as [`Genome::with_circular_flags`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct GenomeFields {
    genes: Vec<Gene>,
    circular: CircularMutation,
    fitness: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<GenomeFields> for Genome {
    type Error = GenomeError;

    fn try_from(fields: GenomeFields) -> Result<Self, Self::Error> {
        let mut genome = match fields.circular {
            CircularMutation::Global(flag) => {
                let mut genome = Genome::new(fields.genes)?;
                genome.circular = CircularMutation::Global(flag);
                genome
            }
            CircularMutation::PerGene(flags) => Genome::with_circular_flags(fields.genes, flags)?,
        };
        genome.fitness = fields.fitness;
        Ok(genome)
    }
}

impl Default for Genome {
    fn default() -> Self {
        Self {
            genes: Vec::new(),
            circular: CircularMutation::Global(false),
            fitness: UNEVALUATED_FITNESS,
        }
    }
}

impl Genome {
    /// Builds a genome whose circular mutation flag is shared by all genes
    /// (initially off).
    pub fn new(genes: Vec<Gene>) -> Result<Self, GenomeError> {
        check_bounds(&genes)?;
        Ok(Self {
            genes,
            ..Self::default()
        })
    }

    /// Builds a genome carrying one circular mutation flag per gene.
    pub fn with_circular_flags(genes: Vec<Gene>, flags: Vec<bool>) -> Result<Self, GenomeError> {
        check_bounds(&genes)?;
        check_len("circular flags", genes.len(), flags.len())?;
        Ok(Self {
            genes,
            circular: CircularMutation::PerGene(flags),
            fitness: UNEVALUATED_FITNESS,
        })
    }

    /// Builds a genome from parallel columns of values, bounds and standard
    /// deviations.
    pub fn from_columns(
        values: &[f64],
        low: &[f64],
        high: &[f64],
        sd: &[f64],
        circular: CircularMutation,
    ) -> Result<Self, GenomeError> {
        let n = values.len();
        check_len("low bounds", n, low.len())?;
        check_len("high bounds", n, high.len())?;
        check_len("standard deviations", n, sd.len())?;
        let genes: Vec<Gene> = (0..n)
            .map(|i| Gene::new(values[i], low[i], high[i], sd[i]))
            .collect();
        match circular {
            CircularMutation::Global(flag) => {
                let mut genome = Self::new(genes)?;
                genome.circular = CircularMutation::Global(flag);
                Ok(genome)
            }
            CircularMutation::PerGene(flags) => Self::with_circular_flags(genes, flags),
        }
    }

    /// Number of genes.
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    /// Current gene values in locus order.
    pub fn values(&self) -> Vec<f64> {
        self.genes.iter().map(|g| g.value).collect()
    }

    pub fn value(&self, i: usize) -> Option<f64> {
        self.genes.get(i).map(|g| g.value)
    }

    /// Overwrites the value of gene `i`. Bounds are not enforced here.
    pub fn set_value(&mut self, i: usize, value: f64) -> Result<(), GenomeError> {
        let len = self.genes.len();
        let gene = self
            .genes
            .get_mut(i)
            .ok_or(GenomeError::IndexOutOfRange { index: i, len })?;
        gene.value = value;
        Ok(())
    }

    /// Number of genes with a non-zero standard deviation.
    pub fn mutable_gene_count(&self) -> usize {
        self.genes.iter().filter(|g| g.is_mutable()).count()
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }

    /// `false` while the fitness still holds [`UNEVALUATED_FITNESS`].
    pub fn is_evaluated(&self) -> bool {
        self.fitness != UNEVALUATED_FITNESS
    }

    /// Orders by fitness only. Equal (or incomparable) fitness compares equal
    /// regardless of genes.
    pub fn fitness_cmp(&self, other: &Genome) -> Ordering {
        self.fitness
            .partial_cmp(&other.fitness)
            .unwrap_or(Ordering::Equal)
    }

    pub fn circular(&self) -> &CircularMutation {
        &self.circular
    }

    /// Whether gene `i` wraps around its range when mutated.
    ///
    /// With a shared flag the index is ignored.
    pub fn circular_mutation(&self, i: usize) -> bool {
        match &self.circular {
            CircularMutation::Global(flag) => *flag,
            CircularMutation::PerGene(flags) => flags.get(i).copied().unwrap_or(false),
        }
    }

    /// Sets the circular flag of gene `i`, or the shared flag when the
    /// genome has no per-gene flags.
    pub fn set_circular_mutation(&mut self, i: usize, flag: bool) -> Result<(), GenomeError> {
        match &mut self.circular {
            CircularMutation::Global(shared) => *shared = flag,
            CircularMutation::PerGene(flags) => {
                let len = flags.len();
                let slot = flags
                    .get_mut(i)
                    .ok_or(GenomeError::IndexOutOfRange { index: i, len })?;
                *slot = flag;
            }
        }
        Ok(())
    }

    /// Sets the shared circular flag. Per-gene flags are left untouched.
    pub fn set_global_circular_mutation(&mut self, flag: bool) {
        if let CircularMutation::Global(shared) = &mut self.circular {
            *shared = flag;
        }
    }

    /// Redraws every mutable gene uniformly within its bounds.
    pub fn randomise<R: RandomSource + ?Sized>(&mut self, random: &mut R) {
        for gene in self.genes.iter_mut().filter(|g| g.is_mutable()) {
            gene.value = random.uniform_double(gene.low, gene.high);
        }
    }

    /// Drops all genes and restores the unevaluated fitness.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn check_len(field: &'static str, expected: usize, actual: usize) -> Result<(), GenomeError> {
    if expected != actual {
        return Err(GenomeError::LengthMismatch {
            field,
            expected,
            actual,
        });
    }
    Ok(())
}

fn check_bounds(genes: &[Gene]) -> Result<(), GenomeError> {
    for (index, g) in genes.iter().enumerate() {
        // also rejects NaN bounds
        if !(g.low <= g.high) {
            return Err(GenomeError::InvertedBounds {
                index,
                low: g.low,
                high: g.high,
            });
        }
    }
    Ok(())
}
