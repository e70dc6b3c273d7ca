//! Seeded experiments comparing the two election variants.

use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::{Rng, SeedableRng};
use ringlead_election::{Algorithm, Direction, ElectionOutcome, Identifier, Ring};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::timeline::Timeline;

/// Configuration for an experiment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Number of nodes in the ring
    pub ring_size: usize,
    /// How many nodes wake up as originators
    pub originators: usize,
    /// Seed for ring layout and originator choice
    pub seed: u64,
    /// Travel direction of messages
    pub direction: Direction,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            ring_size: 10,
            originators: 2,
            seed: 42,
            direction: Direction::Right,
        }
    }
}

impl ExperimentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.ring_size == 0 {
            return Err(Error::InvalidConfig("ring size must be at least 1".into()));
        }
        if self.originators == 0 {
            return Err(Error::InvalidConfig("at least one originator is required".into()));
        }
        if self.originators > self.ring_size {
            return Err(Error::InvalidConfig(format!(
                "{} originators do not fit in a ring of {}",
                self.originators, self.ring_size
            )));
        }
        Ok(())
    }
}

/// Identifiers `1..=size` in random ring order.
pub fn random_ring<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Vec<Identifier> {
    let mut ids: Vec<Identifier> = (1..=size as Identifier).collect();
    ids.shuffle(rng);
    ids
}

/// `count` distinct positions out of `size`, in ascending order.
pub fn pick_originators<R: Rng + ?Sized>(size: usize, count: usize, rng: &mut R) -> Result<Vec<usize>> {
    if count == 0 {
        return Err(ringlead_election::Error::NoOriginators.into());
    }
    if count > size {
        return Err(ringlead_election::Error::TooManyOriginators {
            requested: count,
            nodes: size,
        }
        .into());
    }
    let mut picked = index::sample(rng, size, count).into_vec();
    picked.sort_unstable();
    Ok(picked)
}

/// One finished election and its trace.
#[derive(Debug, Clone)]
pub struct Run {
    pub outcome: ElectionOutcome,
    pub timeline: Timeline,
}

/// Both variants on the same ring and originators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub basic: ElectionOutcome,
    pub optimized: ElectionOutcome,
}

impl Comparison {
    /// Hops the optimized variant saved; negative when it spent more.
    pub fn message_savings(&self) -> i64 {
        self.basic.messages as i64 - self.optimized.messages as i64
    }

    pub fn same_leader(&self) -> bool {
        self.basic.leader == self.optimized.leader
    }
}

/// A fixed ring layout and originator set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Experiment {
    identifiers: Vec<Identifier>,
    originators: Vec<usize>,
    direction: Direction,
}

impl Experiment {
    /// Lay out a random ring from the configuration's seed.
    pub fn new(config: &ExperimentConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let identifiers = random_ring(config.ring_size, &mut rng);
        let originators = pick_originators(config.ring_size, config.originators, &mut rng)?;
        info!(
            ring_size = config.ring_size,
            originators = ?originators,
            seed = config.seed,
            "experiment ring laid out"
        );
        Ok(Self {
            identifiers,
            originators,
            direction: config.direction,
        })
    }

    /// Use a given ring instead of a random one.
    pub fn with_ring(identifiers: Vec<Identifier>, originators: Vec<usize>, direction: Direction) -> Self {
        Self {
            identifiers,
            originators,
            direction,
        }
    }

    pub fn identifiers(&self) -> &[Identifier] {
        &self.identifiers
    }

    pub fn originators(&self) -> &[usize] {
        &self.originators
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// A fresh ring for one run.
    pub fn ring(&self, algorithm: Algorithm) -> Result<Ring> {
        Ok(Ring::new(
            self.identifiers.clone(),
            self.direction,
            algorithm,
            &self.originators,
        )?)
    }

    /// Run one variant and keep its trace.
    pub fn run(&self, algorithm: Algorithm) -> Result<Run> {
        let ring = self.ring(algorithm)?;
        let outcome = ring.elect()?;
        Ok(Run {
            outcome,
            timeline: Timeline::record(&ring, outcome),
        })
    }

    /// Run both variants.
    pub fn compare(&self) -> Result<Comparison> {
        let basic = self.run(Algorithm::Basic)?.outcome;
        let optimized = self.run(Algorithm::Optimized)?.outcome;
        let comparison = Comparison { basic, optimized };
        info!(
            basic = basic.messages,
            optimized = optimized.messages,
            savings = comparison.message_savings(),
            "variants compared"
        );
        Ok(comparison)
    }
}
