//! Average-strategy sampling.
//!
//! Like the probing family, chance and the other players are sampled
//! on-policy. At the optimized player's decisions every action is explored
//! independently with probability
//!
//! ```text
//! rho(a) = max(epsilon, (beta + tau * s(a)) / (beta + sum_b s(b)))
//! ```
//!
//! where `s` is the cumulative strategy of the information set. Any number
//! of actions, including none, may be explored. An explored action is valued
//! by its walk divided by `min(1, rho(a))`; an unexplored one contributes zero.

use crate::cfr::algorithm::CfrAlgorithm;
use crate::cfr::config::SolverConfig;
use crate::cfr::error::SolverError;
use crate::cfr::game::{Action, GameDefinition, PlayerIndex};
use crate::cfr::history::{HistoryNavigator, HistoryPoint};
use crate::cfr::random::{DeterministicStream, DrawPurpose};
use crate::cfr::regret::{self, ActionVector};
use crate::cfr::state::GameState;

/// Average-strategy sampling bound to one solve.
#[derive(Debug, Clone)]
pub struct AverageStrategySampling {
    epsilon: f64,
    tau: f64,
    beta: f64,
    seed: u64,
    parallel: bool,
}

impl AverageStrategySampling {
    /// Create from solver settings.
    pub fn new(config: &SolverConfig, seed: u64) -> Self {
        Self {
            epsilon: config.sampling_epsilon,
            tau: config.sampling_tau,
            beta: config.sampling_beta,
            seed,
            parallel: config.parallel,
        }
    }

    /// Exploration probability of each action given the cumulative strategy.
    ///
    /// Values may exceed one; callers cap them.
    pub fn exploration_probabilities(&self, cumulative_strategy: &[f64]) -> ActionVector {
        let total: f64 = cumulative_strategy.iter().sum();
        let mut rho = ActionVector::zeros(cumulative_strategy.len());
        for (r, &s) in rho.iter_mut().zip(cumulative_strategy) {
            *r = self
                .epsilon
                .max((self.beta + self.tau * s) / (self.beta + total));
        }
        rho
    }

    fn walk<G: GameDefinition>(
        &self,
        navigator: &HistoryNavigator<G>,
        stream: &DeterministicStream,
        player: PlayerIndex,
        point: &HistoryPoint,
        q: f64,
        own_reach: f64,
    ) -> Result<f64, SolverError> {
        match navigator.resolve(point)? {
            GameState::Terminal(terminal) => Ok(terminal.utility(player)),

            GameState::Chance(chance) => {
                let u = stream.draw(chance.decision_index, point, DrawPurpose::Walk);
                let child = point.branch(chance.sample(u));
                self.walk(navigator, stream, player, &child, q, own_reach)
            }

            GameState::Decision(tally) if tally.player() != player => {
                let sigma = tally.action_probabilities(0.0);
                let u = stream.draw(tally.decision_index(), point, DrawPurpose::Walk);
                let child = point.branch(regret::sample_action(&sigma, u));
                self.walk(navigator, stream, player, &child, q, own_reach)
            }

            GameState::Decision(tally) => {
                let sigma = tally.action_probabilities(0.0);
                let rho = match tally.forced_action() {
                    Some(action) => ActionVector::one_hot(tally.num_actions(), action),
                    None => self.exploration_probabilities(&tally.cumulative_strategy()),
                };

                let mut values = ActionVector::zeros(tally.num_actions());
                for (i, value) in values.iter_mut().enumerate() {
                    let action = (i + 1) as Action;
                    let explore = rho[i].min(1.0);
                    if explore <= 0.0 {
                        continue;
                    }
                    let u = stream.draw(tally.decision_index(), point, DrawPurpose::Explore(action));
                    if u < explore {
                        let child = point.branch(action);
                        let walked =
                            self.walk(navigator, stream, player, &child, q * explore, own_reach * sigma[i])?;
                        *value = walked / explore;
                    }
                }

                let node_value = sigma.dot(&values);
                let scale = 1.0 / q;
                for (i, &value) in values.iter().enumerate() {
                    let action = (i + 1) as Action;
                    tally.add_regret(action, scale * (value - node_value));
                    tally.add_strategy(action, scale * own_reach * sigma[i]);
                }
                Ok(node_value)
            }
        }
    }
}

impl<G: GameDefinition> CfrAlgorithm<G> for AverageStrategySampling {
    fn name(&self) -> &'static str {
        "average-strategy-sampling"
    }

    fn iterate(
        &self,
        navigator: &HistoryNavigator<G>,
        iteration: u64,
        player: PlayerIndex,
    ) -> Result<f64, SolverError> {
        let stream = DeterministicStream::new(self.seed, iteration, player);
        self.walk(navigator, &stream, player, &HistoryPoint::root(), 1.0, 1.0)
    }

    fn parallel_iterations(&self) -> bool {
        self.parallel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfr::evaluation;
    use crate::cfr::storage::InformationSetKey;
    use crate::games::kuhn::KuhnPoker;
    use crate::games::tree::{TreeGame, TreeNode};

    #[test]
    fn test_exploration_probabilities() {
        let config = SolverConfig {
            sampling_epsilon: 0.05,
            sampling_tau: 1.0,
            sampling_beta: 1.0,
            ..SolverConfig::default()
        };
        let sampler = AverageStrategySampling::new(&config, 0);

        // nothing accumulated yet: every action explored for sure
        let fresh = sampler.exploration_probabilities(&[0.0, 0.0, 0.0]);
        assert!(fresh.iter().all(|&r| r == 1.0));

        let rho = sampler.exploration_probabilities(&[99.0, 0.0]);
        assert_eq!(rho[0], 1.0);
        assert!((rho[1] - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_epsilon_floor_keeps_weights_finite() {
        let config = SolverConfig {
            sampling_epsilon: 0.1,
            sampling_tau: 1.0,
            sampling_beta: 0.0,
            ..SolverConfig::default()
        };
        let sampler = AverageStrategySampling::new(&config, 0);
        let rho = sampler.exploration_probabilities(&[5.0, 0.0]);
        assert_eq!(rho[1], 0.1);
    }

    #[test]
    fn test_single_player_prefers_better_action() {
        let game = TreeGame::single_player(TreeNode::decision(
            0,
            "",
            vec![TreeNode::terminal(vec![0.0]), TreeNode::terminal(vec![2.0]), TreeNode::terminal(vec![1.0])],
        ));
        let navigator = HistoryNavigator::new(game).unwrap();
        let sampler = AverageStrategySampling::new(&SolverConfig::default(), 17);
        for iteration in 1..=300 {
            sampler.iterate(&navigator, iteration, 0).unwrap();
        }
        let avg = navigator
            .store()
            .average_strategy(&InformationSetKey::new(0, ""))
            .unwrap();
        assert!(avg[1] > 0.9, "learned {:?}", avg);
    }

    #[test]
    fn test_kuhn_approaches_game_value() {
        let navigator = HistoryNavigator::new(KuhnPoker::new()).unwrap();
        let sampler = AverageStrategySampling::new(&SolverConfig::default(), 23);
        for iteration in 1..=20_000 {
            for player in navigator.players() {
                sampler.iterate(&navigator, iteration, player).unwrap();
            }
        }
        let utilities = evaluation::average_strategy_utilities(&navigator).unwrap();
        assert!((utilities[0] + 1.0 / 18.0).abs() < 0.05, "got {}", utilities[0]);
    }
}
