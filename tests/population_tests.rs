//! End-to-end behaviour of the population through its public API.

use proptest::prelude::*;
use tempfile::TempDir;
use u_genepool::genome::{Gene, Genome};
use u_genepool::operators::{GaussianMutation, RandomSource, RngSource};
use u_genepool::population::{InsertOutcome, Population, PopulationConfig, ResizeControl};
use u_genepool::PopulationError;

fn unit_genome(values: [f64; 2], fitness: f64) -> Genome {
    let mut g = Genome::new(vec![
        Gene::new(values[0], 0.0, 1.0, 0.1),
        Gene::new(values[1], 0.0, 1.0, 0.1),
    ])
    .unwrap();
    g.set_fitness(fitness);
    g
}

fn population(parents_to_keep: usize) -> Population {
    Population::new(PopulationConfig::default().with_parents_to_keep(parents_to_keep)).unwrap()
}

/// Always returns the top of every range.
struct Saturating;

impl RandomSource for Saturating {
    fn uniform_int(&mut self, _lo: usize, hi: usize) -> usize {
        hi
    }

    fn uniform_double(&mut self, _lo: f64, hi: f64) -> f64 {
        hi
    }
}

#[test]
fn test_better_newcomer_evicts_oldest() {
    let mut pop = population(0);
    for (i, f) in [0.3, 0.1, 0.5, 0.2, 0.4].into_iter().enumerate() {
        pop.insert(unit_genome([i as f64 / 10.0, 0.5], f), 5).unwrap();
    }
    assert_eq!(pop.len(), 5);

    let newcomer = unit_genome([0.9, 0.9], 1.0);
    assert_eq!(pop.insert(newcomer.clone(), 5).unwrap(), InsertOutcome::Inserted);

    assert_eq!(pop.len(), 5);
    assert_eq!(pop.best(), Some(&newcomer));
    // 0.3 went in first
    let fitness: Vec<f64> = pop.iter().map(|(_, g)| g.fitness()).collect();
    assert_eq!(fitness, vec![0.1, 0.2, 0.4, 0.5, 1.0]);
    pop.check_consistency().unwrap();
}

#[test]
fn test_elite_never_evicted_under_rising_fitness() {
    let mut pop = population(2);
    for f in 1..=40 {
        pop.insert(unit_genome([0.5, 0.5], f as f64), 5).unwrap();
        assert!(pop.len() <= 5);

        let top: Vec<f64> = pop.elite_keys().iter().map(|k| k.value()).collect();
        if f >= 2 {
            assert_eq!(top, vec![(f - 1) as f64, f as f64]);
        }
        pop.check_consistency().unwrap();
    }
    let fitness: Vec<f64> = pop.iter().map(|(_, g)| g.fitness()).collect();
    assert_eq!(fitness, vec![36.0, 37.0, 38.0, 39.0, 40.0]);
}

#[test]
fn test_locked_gene_survives_randomise() {
    let mut genome = Genome::new(vec![Gene::new(0.2, 0.0, 1.0, 0.3), Gene::fixed(0.7)]).unwrap();
    let mut saturating = Saturating;
    let mut seeded = RngSource::seeded(11);
    for _ in 0..100 {
        genome.randomise(&mut saturating);
        assert_eq!(genome.value(1), Some(0.7));
        genome.randomise(&mut seeded);
        assert_eq!(genome.value(1), Some(0.7));
    }
}

#[test]
fn test_initialise_makes_distinct_placeholders() {
    let seed = unit_genome([0.25, 0.75], 3.0);
    let mut pop = population(1);
    pop.initialise(5, &seed);
    assert_eq!(pop.len(), 5);
    let keys = pop.keys();
    assert!(keys.windows(2).all(|w| w[0] < w[1]));
    assert!(pop.iter().all(|(_, g)| g == &seed));
}

#[test]
fn test_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("population.txt");

    let mut random = RngSource::seeded(42);
    let mut source = population(2);
    for i in 0..8 {
        let values = [random.uniform_double(0.0, 1.0), random.uniform_double(0.0, 1.0)];
        source
            .insert(unit_genome(values, i as f64 * 0.37 - 1.0), 8)
            .unwrap();
    }
    source.write_population(&path, 5).unwrap();

    let mut loaded = population(2);
    assert_eq!(loaded.read_population(&path).unwrap(), 5);

    let expected: Vec<Genome> = source.iter().skip(3).map(|(_, g)| g.clone()).collect();
    let actual: Vec<Genome> = loaded.iter().map(|(_, g)| g.clone()).collect();
    assert_eq!(actual, expected);
    loaded.check_consistency().unwrap();
}

#[test]
fn test_bad_record_keeps_coordinator_alive() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.txt");
    std::fs::write(&path, "2\n-1 2 0.5 0 1 0.1 0.5 0 1 oops 0\n").unwrap();

    let mut pop = population(0);
    let err = pop.read_population(&path).unwrap_err();
    assert!(matches!(err, PopulationError::Parse(_)));

    // still usable afterwards
    pop.insert(unit_genome([0.1, 0.1], 1.0), 3).unwrap();
    assert_eq!(pop.len(), 1);
}

#[test]
fn test_grow_then_evolve() {
    let mut pop = Population::new(
        PopulationConfig::default()
            .with_parents_to_keep(2)
            .with_resize_control(ResizeControl::Mutate),
    )
    .unwrap();
    pop.initialise(3, &unit_genome([0.5, 0.5], 0.0));
    let mut random = RngSource::seeded(9);
    let mutation = GaussianMutation::default().with_chance(0.5);
    pop.resize(10, &mut random, &mutation).unwrap();
    assert_eq!(pop.len(), 10);

    for i in 0..50 {
        let (parent, _) = pop.choose_parent(&mut random).unwrap();
        let mut child = parent.clone();
        child.set_fitness(100.0 + i as f64);
        pop.insert(child, 10).unwrap();
        assert!(pop.len() <= 10);
    }
    assert_eq!(pop.best().unwrap().fitness(), 149.0);
    pop.check_consistency().unwrap();
}

proptest! {
    #[test]
    fn prop_size_bounded_and_consistent(
        fitness in prop::collection::vec(-50i32..50, 1..60),
        parents_to_keep in 0usize..6,
        target in 1usize..12,
        minimize: bool,
    ) {
        let config = PopulationConfig::default()
            .with_parents_to_keep(parents_to_keep)
            .with_minimize(minimize);
        let mut pop = Population::new(config).unwrap();
        for f in fitness {
            pop.insert(unit_genome([0.5, 0.5], f as f64), target).unwrap();
            prop_assert!(pop.len() <= target);
            prop_assert!(pop.check_consistency().is_ok());
            prop_assert_eq!(pop.elite_keys().len(), parents_to_keep.min(pop.len()));
        }
    }

    #[test]
    fn prop_duplicate_leaves_population_unchanged(
        fitness in prop::collection::hash_set(-100i32..100, 1..20),
        pick in any::<prop::sample::Index>(),
        parents_to_keep in 0usize..4,
    ) {
        let fitness: Vec<i32> = fitness.into_iter().collect();
        let mut pop = population(parents_to_keep);
        for &f in &fitness {
            pop.insert(unit_genome([0.5, 0.5], f as f64), 100).unwrap();
        }
        let keys = pop.keys();
        let elite = pop.elite_keys();
        let queue = pop.age_queue();

        let dup = *pick.get(&fitness);
        let outcome = pop.insert(unit_genome([0.9, 0.1], dup as f64), 100).unwrap();
        prop_assert_eq!(outcome, InsertOutcome::RejectedDuplicateKey);
        prop_assert_eq!(pop.keys(), keys);
        prop_assert_eq!(pop.elite_keys(), elite);
        prop_assert_eq!(pop.age_queue(), queue);
    }
}
