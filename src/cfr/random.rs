//! Deterministic random draws for the sampling algorithms.
//!
//! A draw is a pure function of (seed, iteration, player, decision index,
//! history point, purpose). Replaying an iteration against the same strategy
//! snapshot therefore samples exactly the same actions, regardless of thread
//! scheduling.

use std::hash::{Hash, Hasher};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHasher;

use crate::cfr::game::{Action, PlayerIndex};
use crate::cfr::history::HistoryPoint;

/// What a draw is used for. Distinct purposes at the same node are independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawPurpose {
    /// Choosing the action a walk follows.
    Walk,
    /// Choosing the action a probe follows.
    Probe,
    /// Deciding whether to explore one action (average-strategy sampling).
    Explore(Action),
    /// Sampling a play-out for reporting.
    Playout(u64),
}

/// Random stream for one (iteration, player) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeterministicStream {
    seed: u64,
    iteration: u64,
    player: PlayerIndex,
}

impl DeterministicStream {
    /// Create the stream for `iteration` optimizing `player`.
    pub fn new(seed: u64, iteration: u64, player: PlayerIndex) -> Self {
        Self {
            seed,
            iteration,
            player,
        }
    }

    /// Iteration this stream belongs to.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Uniform draw in `[0, 1)`.
    pub fn draw(&self, decision_index: usize, point: &HistoryPoint, purpose: DrawPurpose) -> f64 {
        let mut hasher = FxHasher::default();
        self.seed.hash(&mut hasher);
        self.iteration.hash(&mut hasher);
        self.player.hash(&mut hasher);
        decision_index.hash(&mut hasher);
        point.hash(&mut hasher);
        purpose.hash(&mut hasher);
        StdRng::seed_from_u64(hasher.finish()).gen::<f64>()
    }
}
