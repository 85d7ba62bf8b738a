//! The [`Population`] aggregate.

use super::config::{PopulationConfig, ResizeControl};
use super::index::RankIndex;
use super::key::FitnessKey;
use super::selection::Selection;
use crate::error::{PopulationError, Result};
use crate::genome::Genome;
use crate::operators::{MutationOperator, RandomSource};

/// Upper bound on mutation retries when growing a population by mutation.
const MAX_MUTATION_ATTEMPTS: usize = 10_000;

/// Result of [`Population::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The genome was accepted but was itself the next eviction victim when
    /// trimming back to the target size, so it is not in the population.
    Evicted,
    /// Another member already holds the same effective key. The population
    /// is unchanged.
    RejectedDuplicateKey,
}

/// A bounded, ranked breeding population.
///
/// Members are keyed by effective fitness (negated when minimising), so keys
/// are unique and a higher key is always better. Rank 0 is the worst member.
///
/// The top `parents_to_keep` ranks form the elite and are never evicted by
/// age. Every other member sits in an age queue; when an insertion pushes
/// the population past its target size, the member that has waited longest
/// in that queue is evicted. An elite member displaced by a better newcomer
/// joins the back of the queue.
///
/// All mutating calls must come from a single control flow.
///
/// # Examples
///
/// ```
/// use u_genepool::genome::{Gene, Genome};
/// use u_genepool::population::{InsertOutcome, Population, PopulationConfig};
///
/// let config = PopulationConfig::default().with_parents_to_keep(1);
/// let mut population = Population::new(config).unwrap();
///
/// for fitness in [3.0, 1.0, 2.0] {
///     let mut g = Genome::new(vec![Gene::new(0.5, 0.0, 1.0, 0.1)]).unwrap();
///     g.set_fitness(fitness);
///     assert_eq!(population.insert(g, 2).unwrap(), InsertOutcome::Inserted);
/// }
///
/// // 1.0 was the oldest non-elite member
/// assert_eq!(population.len(), 2);
/// assert_eq!(population.best().unwrap().fitness(), 3.0);
/// assert_eq!(population.worst().unwrap().fitness(), 2.0);
/// ```
pub struct Population {
    config: PopulationConfig,
    members: RankIndex<Genome>,
}

impl Default for Population {
    fn default() -> Self {
        Self {
            config: PopulationConfig::default(),
            members: RankIndex::new(),
        }
    }
}

impl Population {
    /// Creates an empty population.
    pub fn new(config: PopulationConfig) -> Result<Self> {
        config.validate().map_err(PopulationError::Config)?;
        Ok(Self {
            config,
            members: RankIndex::new(),
        })
    }

    pub fn config(&self) -> &PopulationConfig {
        &self.config
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.config.selection = selection;
    }

    pub fn set_gamma(&mut self, gamma: f64) -> Result<()> {
        let config = PopulationConfig {
            gamma,
            ..self.config.clone()
        };
        config.validate().map_err(PopulationError::Config)?;
        self.config = config;
        Ok(())
    }

    pub fn set_resize_control(&mut self, control: ResizeControl) {
        self.config.resize_control = control;
    }

    /// Changes the elite size.
    ///
    /// Members that drop out of the elite join the back of the age queue,
    /// lowest rank first. When the elite grows, the best non-elite members
    /// are promoted.
    pub fn set_parents_to_keep(&mut self, parents_to_keep: usize) {
        let n = self.members.len();
        let old_elite = self.config.parents_to_keep.min(n);
        let new_elite = parents_to_keep.min(n);
        if new_elite < old_elite {
            let demoted: Vec<FitnessKey> = (n - old_elite..n - new_elite)
                .filter_map(|rank| self.members.by_rank(rank).map(|(key, _)| key))
                .collect();
            for key in demoted {
                self.members.restamp(key);
            }
        }
        self.config.parents_to_keep = parents_to_keep;
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Removes every member.
    pub fn clear(&mut self) {
        self.members.clear();
    }

    /// Key a genome with `fitness` would be ranked by, or `None` for NaN.
    pub fn effective_key(&self, fitness: f64) -> Option<FitnessKey> {
        FitnessKey::new(if self.config.minimize { -fitness } else { fitness })
    }

    /// Fitness that maps back onto `key`.
    pub(crate) fn fitness_for_key(&self, key: FitnessKey) -> f64 {
        if self.config.minimize {
            -key.value()
        } else {
            key.value()
        }
    }

    /// Replaces the contents with `size` clones of `seed`.
    ///
    /// The clones get the synthetic keys `0, 1, .., size - 1` purely so that
    /// keys stay unique before anything has been evaluated; the keys do not
    /// reflect any real ranking and the clones keep `seed`'s fitness value.
    pub fn initialise(&mut self, size: usize, seed: &Genome) {
        self.members.clear();
        for i in 0..size {
            if let Some(key) = FitnessKey::new(i as f64) {
                // keys are distinct by construction
                let _ = self.place(key, seed.clone());
            }
        }
        log::debug!("initialised population with {size} placeholder members");
    }

    /// Adds `genome` and trims the population back to `target_size`.
    ///
    /// A `target_size` of 0 means "keep the current size": the population
    /// is trimmed back to the length it had before this call.
    ///
    /// A genome whose effective key is already present is rejected and the
    /// population is left untouched; on an exact fitness tie at most one
    /// individual is lost this way. A genome that is trimmed away again
    /// straight after insertion (for instance a weak newcomer when every
    /// other member is elite) is reported as [`InsertOutcome::Evicted`].
    ///
    /// # Errors
    /// [`PopulationError::InvalidFitness`] if the fitness is NaN.
    pub fn insert(&mut self, genome: Genome, target_size: usize) -> Result<InsertOutcome> {
        let fitness = genome.fitness();
        let key = self
            .effective_key(fitness)
            .ok_or(PopulationError::InvalidFitness(fitness))?;
        let target_size = if target_size == 0 {
            self.members.len()
        } else {
            target_size
        };
        if self.place(key, genome).is_err() {
            log::trace!("rejected genome with duplicate key {key}");
            return Ok(InsertOutcome::RejectedDuplicateKey);
        }
        self.trim(target_size);
        if self.members.contains(key) {
            Ok(InsertOutcome::Inserted)
        } else {
            log::trace!("genome with key {key} was evicted on insertion");
            Ok(InsertOutcome::Evicted)
        }
    }

    /// Inserts under the retention policy without trimming.
    fn place(&mut self, key: FitnessKey, genome: Genome) -> std::result::Result<(), Genome> {
        let n = self.members.len();
        let k = self.config.parents_to_keep;
        // with a full elite, a better newcomer displaces the weakest elite
        let displaced = if k > 0 && n >= k {
            self.members
                .by_rank(n - k)
                .map(|(min_elite, _)| min_elite)
                .filter(|&min_elite| key > min_elite)
        } else {
            None
        };
        self.members.insert(key, genome)?;
        if let Some(min_elite) = displaced {
            self.members.restamp(min_elite);
        }
        Ok(())
    }

    fn non_elite_len(&self) -> usize {
        let n = self.members.len();
        n - self.config.parents_to_keep.min(n)
    }

    fn trim(&mut self, target_size: usize) {
        while self.members.len() > target_size {
            let non_elite = self.non_elite_len();
            if non_elite == 0 {
                log::warn!(
                    "age queue is empty with {} members above target {target_size}, evicting the worst elite",
                    self.members.len()
                );
                self.members.remove_rank(0);
                continue;
            }
            let evicted = self
                .members
                .oldest_below(non_elite)
                .and_then(|key| self.members.remove(key));
            if evicted.is_none() {
                let dropped = self.members.rebuild();
                log::error!(
                    "population index lost track of its age queue, rebuilt it ({dropped} duplicate entries dropped)"
                );
                self.members.remove_rank(0);
            }
        }
    }

    /// Picks a parent with the configured [`Selection`] strategy.
    ///
    /// Returns the genome and its rank (0 = worst).
    ///
    /// # Errors
    /// [`PopulationError::Empty`] if there is nothing to choose from.
    pub fn choose_parent<R: RandomSource + ?Sized>(
        &self,
        random: &mut R,
    ) -> Result<(&Genome, usize)> {
        let n = self.members.len();
        if n == 0 {
            return Err(PopulationError::Empty);
        }
        let rank = self
            .config
            .selection
            .pick_rank(n, self.config.gamma, random);
        self.members
            .by_rank(rank)
            .map(|(_, genome)| (genome, rank))
            .ok_or(PopulationError::Empty)
    }

    /// Redraws the mutable genes of every member.
    pub fn randomise<R: RandomSource + ?Sized>(&mut self, random: &mut R) {
        self.members
            .for_each_mut(|_, genome| genome.randomise(&mut *random));
    }

    /// Grows or shrinks the population to exactly `size` members.
    ///
    /// Shrinking drops the worst members. Growing clones the worst member
    /// and either randomises it or mutates it until at least one gene
    /// changes (per [`ResizeControl`]), then gives it the next key above the
    /// current best so it cannot collide.
    ///
    /// # Errors
    /// - [`PopulationError::Empty`] when growing an empty population
    /// - [`PopulationError::ImmutableGenome`] / [`PopulationError::MutationStalled`]
    ///   when mutation cannot produce a distinct clone
    /// - [`PopulationError::KeySpaceExhausted`] when no key above the best is left
    pub fn resize<R, M>(&mut self, size: usize, random: &mut R, mutator: &M) -> Result<()>
    where
        R: RandomSource + ?Sized,
        M: MutationOperator,
    {
        let n = self.members.len();
        if size < n {
            while self.members.len() > size {
                self.members.remove_rank(0);
            }
            log::debug!("shrank population from {n} to {size}");
            return Ok(());
        }

        while self.members.len() < size {
            let mut genome = self
                .members
                .by_rank(0)
                .map(|(_, worst)| worst.clone())
                .ok_or(PopulationError::Empty)?;
            match self.config.resize_control {
                ResizeControl::Randomise => genome.randomise(random),
                ResizeControl::Mutate => {
                    if genome.mutable_gene_count() == 0 {
                        return Err(PopulationError::ImmutableGenome);
                    }
                    let strength = self.config.mutation_strength;
                    let mut attempts = 0;
                    while mutator.mutate(&mut genome, strength, random) == 0 {
                        attempts += 1;
                        if attempts >= MAX_MUTATION_ATTEMPTS {
                            return Err(PopulationError::MutationStalled(attempts));
                        }
                    }
                }
            }
            let best = self.members.max_key().ok_or(PopulationError::Empty)?;
            let key = best
                .next_up()
                .ok_or(PopulationError::KeySpaceExhausted(best.value()))?;
            genome.set_fitness(self.fitness_for_key(key));
            if self.place(key, genome).is_err() {
                return Err(PopulationError::KeySpaceExhausted(best.value()));
            }
        }
        if size > n {
            log::debug!("grew population from {n} to {size}");
        }
        Ok(())
    }

    /// Sets the shared circular mutation flag on every member.
    ///
    /// Members built with per-gene flags keep them.
    pub fn set_global_circular_mutation(&mut self, flag: bool) {
        self.members
            .for_each_mut(|_, genome| genome.set_global_circular_mutation(flag));
    }

    /// Member with the lowest key.
    pub fn worst(&self) -> Option<&Genome> {
        self.get(0)
    }

    /// Member with the highest key.
    pub fn best(&self) -> Option<&Genome> {
        self.len().checked_sub(1).and_then(|rank| self.get(rank))
    }

    /// Member at `rank` (0 = worst).
    pub fn get(&self, rank: usize) -> Option<&Genome> {
        self.members.by_rank(rank).map(|(_, genome)| genome)
    }

    /// Lowest key in the population.
    pub fn worst_key(&self) -> Option<FitnessKey> {
        self.members.min_key()
    }

    /// Highest key in the population.
    pub fn best_key(&self) -> Option<FitnessKey> {
        self.members.max_key()
    }

    pub fn get_by_key(&self, key: FitnessKey) -> Option<&Genome> {
        self.members.get(key)
    }

    pub fn contains_key(&self, key: FitnessKey) -> bool {
        self.members.contains(key)
    }

    pub fn rank_of(&self, key: FitnessKey) -> Option<usize> {
        self.members.rank_of(key)
    }

    /// Members from worst to best.
    pub fn iter(&self) -> impl Iterator<Item = (FitnessKey, &Genome)> + '_ {
        self.members.iter().map(|(key, _, genome)| (key, genome))
    }

    /// All keys, ascending.
    pub fn keys(&self) -> Vec<FitnessKey> {
        self.members.iter().map(|(key, _, _)| key).collect()
    }

    /// Elite keys, ascending.
    pub fn elite_keys(&self) -> Vec<FitnessKey> {
        let skip = self.non_elite_len();
        self.members.iter().skip(skip).map(|(key, _, _)| key).collect()
    }

    /// Non-elite keys in eviction order, next victim first.
    pub fn age_queue(&self) -> Vec<FitnessKey> {
        let mut queue: Vec<(u64, FitnessKey)> = self
            .members
            .iter()
            .take(self.non_elite_len())
            .map(|(key, age, _)| (age, key))
            .collect();
        queue.sort_by_key(|&(age, _)| age);
        queue.into_iter().map(|(_, key)| key).collect()
    }

    /// Verifies the structural invariants: strictly ascending unique keys,
    /// cached rank and age summaries, and an elite/age-queue partition that
    /// covers every member exactly once.
    pub fn check_consistency(&self) -> std::result::Result<(), String> {
        self.members.check()?;
        let keys = self.keys();
        if keys.len() != self.len() {
            return Err(format!("{} keys for {} members", keys.len(), self.len()));
        }
        if let Some(w) = keys.windows(2).find(|w| w[0] >= w[1]) {
            return Err(format!("keys out of order: {} then {}", w[0], w[1]));
        }
        let elite = self.elite_keys();
        let queue = self.age_queue();
        if elite.len() + queue.len() != keys.len() {
            return Err(format!(
                "elite ({}) and age queue ({}) do not cover {} members",
                elite.len(),
                queue.len(),
                keys.len()
            ));
        }
        if let Some(key) = queue.iter().find(|k| elite.contains(k)) {
            return Err(format!("key {key} is both elite and queued"));
        }
        Ok(())
    }
}
