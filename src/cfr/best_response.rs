//! Two-pass best response and exploitability.
//!
//! The first pass walks the whole tree and assigns every information set of
//! the measured player a depth: the number of the player's own decisions on
//! the path to it. Under perfect recall every node of an information set has
//! the same own depth, however many chance or opponent moves precede it; when
//! they differ, the shallowest wins. The second pass handles those depths
//! deepest first. In the pass for a target depth, the measured player's decisions
//! below the target follow the best action found by an earlier pass, the
//! ones above it branch into every action so every target node is reached,
//! and at the target depth every action is valued and its value, weighted by
//! the reach of chance and the other players, is added to the information
//! set's accumulator. The best action of an information set is the argmax of
//! its accumulator. A final walk evaluates the resulting pure strategy
//! against the others' average strategies.

use rustc_hash::FxHashMap;

use crate::cfr::error::SolverError;
use crate::cfr::evaluation;
use crate::cfr::game::{Action, GameDefinition, PlayerIndex};
use crate::cfr::history::{HistoryNavigator, HistoryPoint};
use crate::cfr::random::DeterministicStream;
use crate::cfr::regret::ActionVector;
use crate::cfr::state::GameState;
use crate::cfr::storage::InformationSetKey;

/// Tolerance on best response falling short of the strategy utility.
pub const BEST_RESPONSE_TOLERANCE: f64 = 1e-9;

/// Best response of one player against the others' average strategies.
#[derive(Debug, Clone, PartialEq)]
pub struct BestResponse {
    /// Measured player.
    pub player: PlayerIndex,
    /// Utility of the best response.
    pub utility: f64,
    /// Best action of every information set of the player that was reached.
    pub actions: Vec<(InformationSetKey, Action)>,
}

impl BestResponse {
    /// Best action chosen at an information set.
    pub fn action(&self, key: &InformationSetKey) -> Option<Action> {
        self.actions
            .iter()
            .find(|(k, _)| k == key)
            .map(|&(_, action)| action)
    }
}

/// Exploitability of one player's position.
#[derive(Debug, Clone, PartialEq)]
pub struct Exploitability {
    /// Measured player.
    pub player: PlayerIndex,
    /// Best-response utility.
    pub best_response: f64,
    /// Utility of the average strategy profile for the player.
    pub strategy_utility: f64,
}

impl Exploitability {
    /// What the best response gains over the average strategy.
    pub fn value(&self) -> f64 {
        self.best_response - self.strategy_utility
    }
}

struct Search<'a, G: GameDefinition> {
    navigator: &'a HistoryNavigator<G>,
    player: PlayerIndex,
    /// Best action by tally id.
    best: FxHashMap<usize, Action>,
    /// Own decision depth by tally id.
    depths: FxHashMap<usize, usize>,
    /// Reach-weighted action values by tally id.
    accumulators: FxHashMap<usize, ActionVector>,
}

impl<'a, G: GameDefinition> Search<'a, G> {
    fn best_action(&self, id: usize) -> Action {
        self.best.get(&id).copied().unwrap_or(1)
    }

    fn depth(&self, id: usize) -> usize {
        self.depths.get(&id).copied().unwrap_or(0)
    }

    /// Pass 1: own decision depth of every information set of the player.
    fn discover(&mut self, point: &HistoryPoint, own_depth: usize) -> Result<(), SolverError> {
        let (num_actions, below) = match self.navigator.resolve(point)? {
            GameState::Terminal(_) => return Ok(()),
            GameState::Chance(chance) => (chance.num_actions(), own_depth),
            GameState::Decision(tally) if tally.player() != self.player => (tally.num_actions(), own_depth),
            GameState::Decision(tally) => {
                let depth = self.depths.entry(tally.id()).or_insert(own_depth);
                *depth = (*depth).min(own_depth);
                (tally.num_actions(), own_depth + 1)
            }
        };
        for action in 1..=num_actions as Action {
            self.discover(&point.branch(action), below)?;
        }
        Ok(())
    }

    /// Pass 2 for one target depth. Returns the player's value at `point`
    /// given the best actions known so far.
    fn pass(&mut self, point: &HistoryPoint, target: usize, reach: f64) -> Result<f64, SolverError> {
        if reach == 0.0 {
            return Ok(0.0);
        }
        match self.navigator.resolve(point)? {
            GameState::Terminal(terminal) => Ok(terminal.utility(self.player)),

            GameState::Chance(chance) => {
                let mut value = 0.0;
                for (i, &p) in chance.probabilities().iter().enumerate() {
                    value += p * self.pass(&point.branch((i + 1) as Action), target, reach * p)?;
                }
                Ok(value)
            }

            GameState::Decision(tally) if tally.player() != self.player => {
                let sigma = tally.average_strategy();
                let mut value = 0.0;
                for (i, &p) in sigma.iter().enumerate() {
                    value += p * self.pass(&point.branch((i + 1) as Action), target, reach * p)?;
                }
                Ok(value)
            }

            GameState::Decision(tally) => {
                let depth = self.depth(tally.id());
                if depth > target {
                    let action = self.best_action(tally.id());
                    return self.pass(&point.branch(action), target, reach);
                }

                let mut values = ActionVector::zeros(tally.num_actions());
                for (i, value) in values.iter_mut().enumerate() {
                    *value = self.pass(&point.branch((i + 1) as Action), target, reach)?;
                }
                if depth < target {
                    return Ok(values[self.best_action(tally.id()) as usize - 1]);
                }

                let accumulator = self
                    .accumulators
                    .entry(tally.id())
                    .or_insert_with(|| ActionVector::zeros(tally.num_actions()));
                for (acc, v) in accumulator.iter_mut().zip(values.iter()) {
                    *acc += reach * v;
                }
                let best = argmax(accumulator);
                self.best.insert(tally.id(), best);
                Ok(values[best as usize - 1])
            }
        }
    }

    /// Value of the best response found against the others' average strategies.
    fn evaluate(&self, point: &HistoryPoint) -> Result<f64, SolverError> {
        let probabilities = match self.navigator.resolve(point)? {
            GameState::Terminal(terminal) => return Ok(terminal.utility(self.player)),
            GameState::Chance(chance) => *chance.probabilities(),
            GameState::Decision(tally) if tally.player() != self.player => tally.average_strategy(),
            GameState::Decision(tally) => {
                let action = self.best_action(tally.id());
                return self.evaluate(&point.branch(action));
            }
        };
        let mut value = 0.0;
        for (i, &p) in probabilities.iter().enumerate() {
            if p > 0.0 {
                value += p * self.evaluate(&point.branch((i + 1) as Action))?;
            }
        }
        Ok(value)
    }
}

/// Index of the largest value as an action, lowest action on ties.
fn argmax(values: &[f64]) -> Action {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    (best + 1) as Action
}

/// Compute the best response of `player` against the average strategies.
pub fn best_response<G: GameDefinition>(
    navigator: &HistoryNavigator<G>,
    player: PlayerIndex,
) -> Result<BestResponse, SolverError> {
    let mut search = Search {
        navigator,
        player,
        best: FxHashMap::default(),
        depths: FxHashMap::default(),
        accumulators: FxHashMap::default(),
    };

    let root = HistoryPoint::root();
    search.discover(&root, 0)?;
    let deepest = search.depths.values().copied().max();
    if let Some(deepest) = deepest {
        for target in (0..=deepest).rev() {
            search.pass(&root, target, 1.0)?;
        }
    }
    let utility = search.evaluate(&root)?;

    let store = navigator.store();
    let mut actions: Vec<(InformationSetKey, Action)> = search
        .best
        .iter()
        .filter_map(|(&id, &action)| {
            store.by_id(id).map(|tally| {
                (
                    InformationSetKey::new(tally.decision_index(), tally.information()),
                    action,
                )
            })
        })
        .collect();
    actions.sort_by(|a, b| {
        a.0.decision_index
            .cmp(&b.0.decision_index)
            .then_with(|| a.0.information.cmp(&b.0.information))
    });

    log::debug!(
        "best response for player {} over {} depths: {:.6}",
        player,
        deepest.map_or(0, |d| d + 1),
        utility
    );
    Ok(BestResponse {
        player,
        utility,
        actions,
    })
}

/// Exploitability of `player` under exhaustive evaluation.
///
/// A best response below the strategy utility beyond tolerance means the
/// solver state is inconsistent and is reported as an error.
pub fn exploitability<G: GameDefinition>(
    navigator: &HistoryNavigator<G>,
    player: PlayerIndex,
) -> Result<Exploitability, SolverError> {
    let response = best_response(navigator, player)?;
    let strategy_utility = evaluation::average_strategy_utilities(navigator)?[player as usize];
    if response.utility < strategy_utility - BEST_RESPONSE_TOLERANCE {
        return Err(SolverError::InconsistentBestResponse {
            player,
            best_response: response.utility,
            strategy_utility,
        });
    }
    Ok(Exploitability {
        player,
        best_response: response.utility,
        strategy_utility,
    })
}

/// Exploitability of `player` against a sampled strategy utility.
///
/// Sampling noise can put the estimate above the best response; that is
/// logged, not treated as an error.
pub fn sampled_exploitability<G: GameDefinition>(
    navigator: &HistoryNavigator<G>,
    player: PlayerIndex,
    stream: &DeterministicStream,
    samples: u64,
) -> Result<Exploitability, SolverError> {
    let response = best_response(navigator, player)?;
    let strategy_utility =
        evaluation::sampled_average_strategy_utilities(navigator, stream, samples)?[player as usize];
    if response.utility < strategy_utility - BEST_RESPONSE_TOLERANCE {
        log::warn!(
            "sampled utility {:.6} of player {} exceeds its best response {:.6}",
            strategy_utility,
            player,
            response.utility
        );
    }
    Ok(Exploitability {
        player,
        best_response: response.utility,
        strategy_utility,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfr::algorithm::CfrAlgorithm;
    use crate::cfr::config::SolverConfig;
    use crate::cfr::game::DecisionDescriptor;
    use crate::cfr::vanilla::VanillaCfr;
    use crate::games::kuhn::KuhnPoker;
    use crate::games::settlement::SettlementGame;
    use crate::games::tree::{TreeGame, TreeNode};

    fn three_decision_tree() -> TreeGame {
        TreeGame::single_player(TreeNode::decision(
            0,
            "root",
            vec![
                TreeNode::decision(1, "left", vec![TreeNode::terminal(vec![1.0]), TreeNode::terminal(vec![5.0])]),
                TreeNode::decision(2, "right", vec![TreeNode::terminal(vec![3.0]), TreeNode::terminal(vec![2.0])]),
            ],
        ))
    }

    /// Chance picks a branch player 0 never observes. On one branch player 1
    /// moves first, so the information sets of player 0 sit at different
    /// history lengths on the two branches.
    fn uneven_depth_game(swap: bool) -> TreeGame {
        let pair = |u: f64| TreeNode::terminal(vec![u, -u]);
        let inner = |a: f64, b: f64| {
            TreeNode::decision(
                2,
                "I",
                vec![TreeNode::decision(3, "J", vec![pair(a), pair(b)]), pair(5.5)],
            )
        };
        let mut branches = vec![
            TreeNode::decision(1, "", vec![inner(0.0, 2.0)]),
            inner(10.0, 0.0),
        ];
        if swap {
            branches.reverse();
        }
        TreeGame::new(
            2,
            vec![
                DecisionDescriptor::chance("branch", 2, 2),
                DecisionDescriptor::player("pass", 1, 1),
                DecisionDescriptor::player("I", 0, 2),
                DecisionDescriptor::player("J", 0, 2),
            ],
            TreeNode::chance(0, vec![0.5, 0.5], branches),
        )
    }

    #[test]
    fn test_information_sets_at_uneven_history_lengths() {
        for swap in [false, true] {
            let navigator = HistoryNavigator::new(uneven_depth_game(swap)).unwrap();
            let response = best_response(&navigator, 0).unwrap();
            assert_eq!(response.utility, 5.5, "swap = {}", swap);
            assert_eq!(response.action(&InformationSetKey::new(2, "I")), Some(2));
            assert_eq!(response.action(&InformationSetKey::new(3, "J")), Some(1));

            let cfr = VanillaCfr::new(&SolverConfig::default());
            for iteration in 1..=2_000 {
                for player in navigator.players() {
                    cfr.iterate(&navigator, iteration, player).unwrap();
                }
            }
            let e = exploitability(&navigator, 0).unwrap();
            assert!((e.best_response - 5.5).abs() < 1e-12);
            assert!(e.value() >= -BEST_RESPONSE_TOLERANCE);
        }
    }

    #[test]
    fn test_argmax_prefers_lowest_on_ties() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0]), 2);
        assert_eq!(argmax(&[0.0, 0.0]), 1);
    }

    #[test]
    fn test_single_player_tree_picks_five() {
        let navigator = HistoryNavigator::new(three_decision_tree()).unwrap();
        let response = best_response(&navigator, 0).unwrap();
        assert_eq!(response.utility, 5.0);
        assert_eq!(response.action(&InformationSetKey::new(0, "root")), Some(1));
        assert_eq!(response.action(&InformationSetKey::new(1, "left")), Some(2));
        assert_eq!(response.action(&InformationSetKey::new(2, "right")), Some(1));
    }

    #[test]
    fn test_uniform_kuhn_is_exploitable() {
        let navigator = HistoryNavigator::new(KuhnPoker::new()).unwrap();
        for player in 0..2 {
            let e = exploitability(&navigator, player).unwrap();
            assert!(e.value() > 0.1);
        }
    }

    #[test]
    fn test_best_response_never_below_strategy_utility() {
        let navigator = HistoryNavigator::new(SettlementGame::new()).unwrap();
        let cfr = VanillaCfr::new(&SolverConfig::default());
        for iteration in 1..=25 {
            for player in navigator.players() {
                cfr.iterate(&navigator, iteration, player).unwrap();
            }
            for player in navigator.players() {
                let e = exploitability(&navigator, player).unwrap();
                assert!(e.value() >= -BEST_RESPONSE_TOLERANCE);
            }
        }
    }

    #[test]
    fn test_kuhn_exploitability_shrinks() {
        let navigator = HistoryNavigator::new(KuhnPoker::new()).unwrap();
        let cfr = VanillaCfr::new(&SolverConfig::default());
        let before = exploitability(&navigator, 0).unwrap().value();
        for iteration in 1..=1_000 {
            for player in navigator.players() {
                cfr.iterate(&navigator, iteration, player).unwrap();
            }
        }
        let after = exploitability(&navigator, 0).unwrap().value();
        assert!(before > 0.1);
        assert!(after < 0.02, "{} -> {}", before, after);
    }

    #[test]
    fn test_sampled_discrepancy_is_not_fatal() {
        let navigator = HistoryNavigator::new(KuhnPoker::new()).unwrap();
        let stream = DeterministicStream::new(1, 0, 0);
        let e = sampled_exploitability(&navigator, 1, &stream, 10).unwrap();
        assert!(e.best_response.is_finite());
    }
}
