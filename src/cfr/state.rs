//! Game-tree node types.
//!
//! A resolved history point is one of three things: a chance node with its
//! probability table, an information-set tally holding the regret and
//! strategy statistics of the acting player, or the terminal utilities.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cfr::atomic::AtomicF64;
use crate::cfr::game::{Action, PlayerIndex};
use crate::cfr::regret::{self, ActionVector};

/// A node of the game tree.
#[derive(Debug, Clone)]
pub enum GameState {
    /// Chance resolves the next decision.
    Chance(Arc<ChanceNode>),
    /// A player decides; statistics are shared by the whole information set.
    Decision(Arc<InformationSetTally>),
    /// The game is over.
    Terminal(Arc<TerminalUtilities>),
}

/// A chance decision and its action distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct ChanceNode {
    /// Index of the decision in the game's decision list.
    pub decision_index: usize,
    probabilities: ActionVector,
}

impl ChanceNode {
    /// Create a chance node. `probabilities[0]` is the probability of action 1.
    pub fn new(decision_index: usize, probabilities: &[f64]) -> Self {
        Self {
            decision_index,
            probabilities: ActionVector::from_slice(probabilities),
        }
    }

    /// Number of actions.
    pub fn num_actions(&self) -> usize {
        self.probabilities.len()
    }

    /// Probability of every action.
    pub fn probabilities(&self) -> &ActionVector {
        &self.probabilities
    }

    /// Probability of a single action.
    pub fn probability(&self, action: Action) -> f64 {
        self.probabilities[action as usize - 1]
    }

    /// Pick an action given a uniform draw in `[0, 1)`.
    pub fn sample(&self, u: f64) -> Action {
        regret::sample_action(&self.probabilities, u)
    }
}

/// Payoffs of a finished game, one per non-chance player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalUtilities {
    /// Utility of each non-chance player.
    pub utilities: Vec<f64>,
}

impl TerminalUtilities {
    /// Utility of `player`.
    #[inline]
    pub fn utility(&self, player: PlayerIndex) -> f64 {
        self.utilities[player as usize]
    }
}

/// Cumulative regret and strategy statistics of one information set.
///
/// Tallies are created lazily the first time any history of the information
/// set is visited and live for the whole solve. All mutation goes through
/// atomic per-slot adds, so concurrent iterations can share a tally.
#[derive(Debug)]
pub struct InformationSetTally {
    id: usize,
    decision_index: usize,
    player: PlayerIndex,
    information: String,
    forced_action: Option<Action>,
    cumulative_regret: Box<[AtomicF64]>,
    cumulative_strategy: Box<[AtomicF64]>,
}

impl InformationSetTally {
    /// Create a zero-initialized tally.
    pub fn new(
        id: usize,
        decision_index: usize,
        player: PlayerIndex,
        information: String,
        num_actions: usize,
        forced_action: Option<Action>,
    ) -> Self {
        Self {
            id,
            decision_index,
            player,
            information,
            forced_action,
            cumulative_regret: (0..num_actions).map(|_| AtomicF64::default()).collect(),
            cumulative_strategy: (0..num_actions).map(|_| AtomicF64::default()).collect(),
        }
    }

    /// Registry id, dense from 0 in creation order.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Index of the decision in the game's decision list.
    pub fn decision_index(&self) -> usize {
        self.decision_index
    }

    /// Acting player.
    pub fn player(&self) -> PlayerIndex {
        self.player
    }

    /// Information label reported by the game.
    pub fn information(&self) -> &str {
        &self.information
    }

    /// Number of legal actions.
    pub fn num_actions(&self) -> usize {
        self.cumulative_regret.len()
    }

    /// Action forced by the game's debug override, if any.
    pub fn forced_action(&self) -> Option<Action> {
        self.forced_action
    }

    /// Snapshot of cumulative regrets.
    pub fn cumulative_regrets(&self) -> ActionVector {
        let mut values = ActionVector::zeros(self.num_actions());
        for (v, slot) in values.iter_mut().zip(self.cumulative_regret.iter()) {
            *v = slot.load();
        }
        values
    }

    /// Snapshot of cumulative strategy weights.
    pub fn cumulative_strategy(&self) -> ActionVector {
        let mut values = ActionVector::zeros(self.num_actions());
        for (v, slot) in values.iter_mut().zip(self.cumulative_strategy.iter()) {
            *v = slot.load();
        }
        values
    }

    /// Add to the cumulative regret of `action`.
    #[inline]
    pub fn add_regret(&self, action: Action, delta: f64) {
        self.cumulative_regret[action as usize - 1].fetch_add(delta);
    }

    /// Add to the cumulative strategy weight of `action`.
    #[inline]
    pub fn add_strategy(&self, action: Action, delta: f64) {
        self.cumulative_strategy[action as usize - 1].fetch_add(delta);
    }

    /// Overwrite both statistics (checkpoint restore).
    pub fn restore(&self, regrets: &[f64], strategy: &[f64]) {
        for (slot, &value) in self.cumulative_regret.iter().zip(regrets) {
            slot.store(value);
        }
        for (slot, &value) in self.cumulative_strategy.iter().zip(strategy) {
            slot.store(value);
        }
    }

    /// Reset both statistics to zero.
    pub fn clear(&self) {
        for slot in self.cumulative_regret.iter().chain(self.cumulative_strategy.iter()) {
            slot.store(0.0);
        }
    }

    /// Current regret-matched strategy, optionally blended with uniform.
    pub fn action_probabilities(&self, epsilon: f64) -> ActionVector {
        if let Some(action) = self.forced_action {
            return ActionVector::one_hot(self.num_actions(), action);
        }
        let matched = regret::regret_matched(&self.cumulative_regrets());
        regret::blend_with_uniform(&matched, epsilon)
    }

    /// Regret-matched strategy over actions that have been reached at least once.
    pub fn pruned_action_probabilities(&self) -> ActionVector {
        if let Some(action) = self.forced_action {
            return ActionVector::one_hot(self.num_actions(), action);
        }
        regret::pruned_regret_matched(&self.cumulative_regrets(), &self.cumulative_strategy())
    }

    /// Average strategy: the equilibrium estimate.
    pub fn average_strategy(&self) -> ActionVector {
        if let Some(action) = self.forced_action {
            return ActionVector::one_hot(self.num_actions(), action);
        }
        regret::average_strategy(&self.cumulative_strategy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_accumulates_and_matches() {
        let tally = InformationSetTally::new(0, 1, 0, "x".to_string(), 3, None);
        assert_eq!(tally.num_actions(), 3);
        assert!((tally.action_probabilities(0.0)[0] - 1.0 / 3.0).abs() < 1e-12);

        tally.add_regret(1, 2.0);
        tally.add_regret(3, 6.0);
        tally.add_regret(2, -1.0);
        let p = tally.action_probabilities(0.0);
        assert!((p[0] - 0.25).abs() < 1e-12);
        assert_eq!(p[1], 0.0);
        assert!((p[2] - 0.75).abs() < 1e-12);

        tally.add_strategy(2, 4.0);
        let avg = tally.average_strategy();
        assert_eq!(avg[1], 1.0);

        tally.clear();
        assert_eq!(tally.cumulative_regrets().total(), 0.0);
    }

    #[test]
    fn test_forced_action_is_one_hot() {
        let tally = InformationSetTally::new(0, 0, 1, String::new(), 4, Some(3));
        tally.add_regret(1, 100.0);
        let p = tally.action_probabilities(0.5);
        assert_eq!(&p[..], &[0.0, 0.0, 1.0, 0.0]);
        assert_eq!(tally.average_strategy()[2], 1.0);
    }

    #[test]
    fn test_chance_node_sampling() {
        let node = ChanceNode::new(0, &[0.25, 0.75]);
        assert_eq!(node.num_actions(), 2);
        assert_eq!(node.sample(0.1), 1);
        assert_eq!(node.sample(0.5), 2);
        assert_eq!(node.probability(2), 0.75);
    }
}
