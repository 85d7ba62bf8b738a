//! Text record format for a single genome.
//!
//! ```text
//! <type tag>
//! <gene count L>
//! <value> <low> <high> <sd> [<circular flag>]    (L lines)
//! <fitness> 0 0 0 0
//! ```
//!
//! The type tag is `-1` for a shared circular flag and `-2` for per-gene
//! flags; only `-2` records carry the fifth column. The four zeros after the
//! fitness are reserved. Reading is whitespace-tokenised, so column
//! alignment does not matter.

use super::types::{CircularMutation, Gene, Genome};
use crate::error::ParseError;
use std::fmt;

/// Type tag of a genome sharing one circular mutation flag.
pub const GLOBAL_CIRCULAR_TAG: i64 = -1;

/// Type tag of a genome carrying one circular mutation flag per gene.
pub const PER_GENE_CIRCULAR_TAG: i64 = -2;

const RESERVED_FIELDS: usize = 4;

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = match self.circular() {
            CircularMutation::Global(_) => {
                writeln!(f, "{GLOBAL_CIRCULAR_TAG}")?;
                None
            }
            CircularMutation::PerGene(flags) => {
                writeln!(f, "{PER_GENE_CIRCULAR_TAG}")?;
                Some(flags)
            }
        };
        writeln!(f, "{}", self.len())?;
        for (i, g) in self.genes().iter().enumerate() {
            // 17 digits after the point survive a parse round trip exactly
            write!(
                f,
                "{:.17e}\t{:.17e}\t{:.17e}\t{:.17e}",
                g.value, g.low, g.high, g.sd
            )?;
            if let Some(flags) = flags {
                let flag = flags.get(i).copied().unwrap_or(false);
                write!(f, "\t{}", u8::from(flag))?;
            }
            writeln!(f)?;
        }
        writeln!(f, "{:.17e}\t0\t0\t0\t0", self.fitness())
    }
}

impl Genome {
    /// Reads one record from a whitespace token stream.
    ///
    /// `record` is the 1-based position of the record in its file and is
    /// only used in error messages.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_genepool::genome::{Gene, Genome};
    ///
    /// let mut g = Genome::new(vec![Gene::new(0.3, 0.0, 1.0, 0.05)]).unwrap();
    /// g.set_fitness(12.5);
    /// let text = g.to_string();
    ///
    /// let parsed = Genome::read_record(&mut text.split_whitespace(), 1).unwrap();
    /// assert_eq!(parsed, g);
    /// ```
    pub fn read_record<'a, I>(tokens: &mut I, record: usize) -> Result<Genome, ParseError>
    where
        I: Iterator<Item = &'a str>,
    {
        let mut reader = TokenReader { tokens, record };

        let tag = reader.int("genome type tag")?;
        let per_gene = match tag {
            GLOBAL_CIRCULAR_TAG => false,
            PER_GENE_CIRCULAR_TAG => true,
            _ => return Err(ParseError::UnknownGenomeType { record, tag }),
        };
        let len = reader.count("gene count")?;

        // the count is untrusted; let the vectors grow as tokens arrive
        let mut genes = Vec::new();
        let mut flags = Vec::new();
        for _ in 0..len {
            let value = reader.float("gene value")?;
            let low = reader.float("low bound")?;
            let high = reader.float("high bound")?;
            let sd = reader.float("standard deviation")?;
            genes.push(Gene::new(value, low, high, sd));
            if per_gene {
                flags.push(reader.flag("circular flag")?);
            }
        }
        let fitness = reader.float("fitness")?;
        for _ in 0..RESERVED_FIELDS {
            reader.float("reserved field")?;
        }

        let built = if per_gene {
            Genome::with_circular_flags(genes, flags)
        } else {
            Genome::new(genes)
        };
        let mut genome = built.map_err(|source| ParseError::Genome { record, source })?;
        genome.set_fitness(fitness);
        Ok(genome)
    }
}

/// Typed token pulls with record-aware errors.
pub(crate) struct TokenReader<'r, I> {
    pub(crate) tokens: &'r mut I,
    pub(crate) record: usize,
}

impl<'a, I> TokenReader<'_, I>
where
    I: Iterator<Item = &'a str>,
{
    fn next(&mut self, expected: &'static str) -> Result<&'a str, ParseError> {
        self.tokens.next().ok_or(ParseError::UnexpectedEof {
            record: self.record,
            expected,
        })
    }

    fn invalid(&self, expected: &'static str, token: &str) -> ParseError {
        ParseError::InvalidToken {
            record: self.record,
            expected,
            token: token.to_string(),
        }
    }

    pub(crate) fn float(&mut self, expected: &'static str) -> Result<f64, ParseError> {
        let token = self.next(expected)?;
        token.parse().map_err(|_| self.invalid(expected, token))
    }

    pub(crate) fn int(&mut self, expected: &'static str) -> Result<i64, ParseError> {
        let token = self.next(expected)?;
        token.parse().map_err(|_| self.invalid(expected, token))
    }

    pub(crate) fn count(&mut self, expected: &'static str) -> Result<usize, ParseError> {
        let token = self.next(expected)?;
        token.parse().map_err(|_| self.invalid(expected, token))
    }

    fn flag(&mut self, expected: &'static str) -> Result<bool, ParseError> {
        let token = self.next(expected)?;
        match token {
            "0" => Ok(false),
            "1" => Ok(true),
            _ => Err(self.invalid(expected, token)),
        }
    }
}
