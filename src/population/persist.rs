//! Population files.
//!
//! A population file is the member count on the first line followed by
//! that many genome records (see [`crate::genome::record`]), best first.

use super::pool::Population;
use crate::error::{PopulationError, Result};
use crate::genome::record::TokenReader;
use crate::genome::Genome;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

impl Population {
    /// Writes the `n_best` highest-ranked members to `path`, best first.
    ///
    /// `n_best` is capped at the population size.
    pub fn write_population<P: AsRef<Path>>(&self, path: P, n_best: usize) -> Result<()> {
        let path = path.as_ref();
        let io_error = |source: io::Error| PopulationError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut out = BufWriter::new(File::create(path).map_err(io_error)?);
        self.write_to(&mut out, n_best).map_err(io_error)?;
        out.flush().map_err(io_error)
    }

    /// Writes the `n_best` highest-ranked members to any writer.
    pub fn write_to<W: Write>(&self, out: &mut W, n_best: usize) -> io::Result<()> {
        let len = self.len();
        let count = n_best.min(len);
        writeln!(out, "{count}")?;
        for rank in (len - count..len).rev() {
            if let Some(genome) = self.get(rank) {
                write!(out, "{genome}")?;
            }
        }
        Ok(())
    }

    /// Replaces the contents with the population stored at `path`.
    ///
    /// Returns the number of records read. Records whose fitness collides
    /// with one already loaded get the next key above the current best, so
    /// no record is dropped; a warning is logged once per file.
    ///
    /// Loading is not atomic: on a parse error the population keeps the
    /// records read before the fault.
    pub fn read_population<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| PopulationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.read_from_str(&text)
    }

    /// Like [`read_population`](Self::read_population), from text already
    /// in memory.
    pub fn read_from_str(&mut self, text: &str) -> Result<usize> {
        self.clear();
        let mut tokens = text.split_whitespace();
        let count = TokenReader {
            tokens: &mut tokens,
            record: 0,
        }
        .count("population size")?;

        let mut warned = false;
        for record in 1..=count {
            let mut genome = Genome::read_record(&mut tokens, record)?;
            let fitness = genome.fitness();
            let key = self
                .effective_key(fitness)
                .ok_or(PopulationError::InvalidFitness(fitness))?;
            if self.contains_key(key) {
                let best = self.best_key().unwrap_or(key);
                let bumped = best
                    .next_up()
                    .ok_or(PopulationError::KeySpaceExhausted(best.value()))?;
                genome.set_fitness(self.fitness_for_key(bumped));
                if !warned {
                    log::warn!(
                        "population contains duplicate fitness values, substituting synthetic ones (first at record {record})"
                    );
                    warned = true;
                }
            }
            self.insert(genome, count)?;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::genome::Gene;
    use crate::population::PopulationConfig;

    fn genome(value: f64, fitness: f64) -> Genome {
        let mut g = Genome::new(vec![Gene::new(value, 0.0, 1.0, 0.1)]).unwrap();
        g.set_fitness(fitness);
        g
    }

    fn population() -> Population {
        let mut pop = Population::new(PopulationConfig::default().with_parents_to_keep(1)).unwrap();
        for (i, f) in [2.0, 7.0, 4.0].into_iter().enumerate() {
            pop.insert(genome(i as f64 / 10.0, f), 10).unwrap();
        }
        pop
    }

    fn written(pop: &Population, n_best: usize) -> String {
        let mut buf = Vec::new();
        pop.write_to(&mut buf, n_best).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_write_best_first() {
        let text = written(&population(), 2);
        let mut tokens = text.split_whitespace();
        assert_eq!(tokens.next(), Some("2"));
        let first = Genome::read_record(&mut tokens, 1).unwrap();
        let second = Genome::read_record(&mut tokens, 2).unwrap();
        assert_eq!(first.fitness(), 7.0);
        assert_eq!(second.fitness(), 4.0);
        assert!(tokens.next().is_none());
    }

    #[test]
    fn test_write_caps_count() {
        let text = written(&population(), 99);
        assert!(text.starts_with("3\n"));
    }

    #[test]
    fn test_read_back() {
        let source = population();
        let mut pop = Population::default();
        assert_eq!(pop.read_from_str(&written(&source, 3)).unwrap(), 3);
        let fitness: Vec<f64> = pop.iter().map(|(_, g)| g.fitness()).collect();
        assert_eq!(fitness, vec![2.0, 4.0, 7.0]);
        assert_eq!(pop.best().unwrap().values(), vec![0.1]);
        pop.check_consistency().unwrap();
    }

    #[test]
    fn test_read_replaces_contents() {
        let mut pop = population();
        pop.read_from_str("0").unwrap();
        assert!(pop.is_empty());
    }

    #[test]
    fn test_duplicate_fitness_is_bumped() {
        let mut pop = Population::default();
        let text = format!("3\n{}{}{}", genome(0.1, 5.0), genome(0.2, 5.0), genome(0.3, 1.0));
        assert_eq!(pop.read_from_str(&text).unwrap(), 3);
        assert_eq!(pop.len(), 3);
        let best = pop.best().unwrap();
        assert_eq!(best.values(), vec![0.2]);
        assert!(best.fitness() > 5.0);
        pop.check_consistency().unwrap();
    }

    #[test]
    fn test_duplicate_fitness_bumped_when_minimizing() {
        let mut pop = Population::new(PopulationConfig::default().with_minimize(true)).unwrap();
        let text = format!("2\n{}{}", genome(0.1, 5.0), genome(0.2, 5.0));
        pop.read_from_str(&text).unwrap();
        assert_eq!(pop.len(), 2);
        // the bumped copy ranks best, i.e. has the lower fitness
        let best = pop.best().unwrap();
        assert_eq!(best.values(), vec![0.2]);
        assert!(best.fitness() < 5.0);
    }

    #[test]
    fn test_truncated_file_keeps_partial_state() {
        let text = format!("3\n{}{}-1 1 0.5", genome(0.1, 1.0), genome(0.2, 2.0));
        let mut pop = Population::default();
        let err = pop.read_from_str(&text).unwrap_err();
        assert!(matches!(
            err,
            PopulationError::Parse(ParseError::UnexpectedEof { record: 3, .. })
        ));
        assert_eq!(pop.len(), 2);
    }

    #[test]
    fn test_oversized_gene_count_is_a_parse_error() {
        let mut pop = Population::default();
        let err = pop
            .read_from_str("1\n-1 18446744073709551615 0.5 0 1 0.1 1 0 0 0 0")
            .unwrap_err();
        assert!(matches!(
            err,
            PopulationError::Parse(ParseError::UnexpectedEof { record: 1, .. })
        ));
        assert!(pop.is_empty());
    }

    #[test]
    fn test_bad_count() {
        let mut pop = Population::default();
        let err = pop.read_from_str("three").unwrap_err();
        assert!(matches!(
            err,
            PopulationError::Parse(ParseError::InvalidToken { record: 0, .. })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut pop = Population::default();
        let err = pop
            .read_population("/nonexistent/dir/population.txt")
            .unwrap_err();
        assert!(matches!(err, PopulationError::Io { .. }));
    }
}
