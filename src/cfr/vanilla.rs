//! Vanilla CFR: exhaustive counterfactual regret minimization.
//!
//! Every iteration walks the whole tree once per optimized player, carrying
//! the reach probability of every player (chance included). At the optimized
//! player's decisions the counterfactual regret of each action is
//! `inversePi(others) * (v(a) - v)`, and the average strategy accumulates
//! `pi(player) * sigma(a)`.

use rayon::prelude::*;

use crate::cfr::algorithm::CfrAlgorithm;
use crate::cfr::config::SolverConfig;
use crate::cfr::error::SolverError;
use crate::cfr::game::{Action, GameDefinition, PlayerIndex, MAX_PLAYERS};
use crate::cfr::history::{HistoryNavigator, HistoryPoint};
use crate::cfr::regret::ActionVector;
use crate::cfr::state::GameState;

/// Reach probability of every non-chance player plus chance (last slot used
/// is the chance player index).
type Reach = [f64; MAX_PLAYERS + 1];

/// Exhaustive CFR.
#[derive(Debug, Clone)]
pub struct VanillaCfr {
    parallel: bool,
    max_parallel_depth: usize,
    pruning: bool,
}

impl VanillaCfr {
    /// Create from solver settings.
    pub fn new(config: &SolverConfig) -> Self {
        Self {
            parallel: config.parallel,
            max_parallel_depth: config.max_parallel_depth,
            pruning: config.pruning,
        }
    }

    fn walk<G: GameDefinition>(
        &self,
        navigator: &HistoryNavigator<G>,
        point: &HistoryPoint,
        player: PlayerIndex,
        reach: &Reach,
    ) -> Result<f64, SolverError> {
        match navigator.resolve(point)? {
            GameState::Terminal(terminal) => Ok(terminal.utility(player)),

            GameState::Chance(chance) => {
                let chance_player = navigator.num_players();
                let child = |action: Action| -> Result<f64, SolverError> {
                    let p = chance.probability(action);
                    if p == 0.0 {
                        return Ok(0.0);
                    }
                    let mut next = *reach;
                    next[chance_player] *= p;
                    Ok(p * self.walk(navigator, &point.branch(action), player, &next)?)
                };

                let actions = 1..=chance.num_actions() as Action;
                if self.parallel && point.depth() < self.max_parallel_depth {
                    let values = actions
                        .into_par_iter()
                        .map(child)
                        .collect::<Result<Vec<f64>, SolverError>>()?;
                    Ok(values.iter().sum())
                } else {
                    actions.map(child).sum()
                }
            }

            GameState::Decision(tally) => {
                let num_actions = tally.num_actions();
                let sigma = if self.pruning {
                    tally.pruned_action_probabilities()
                } else {
                    tally.action_probabilities(0.0)
                };

                if tally.player() != player {
                    let actor = tally.player() as usize;
                    let mut value = 0.0;
                    for (i, &p) in sigma.iter().enumerate() {
                        if self.pruning && p == 0.0 {
                            continue;
                        }
                        let mut next = *reach;
                        next[actor] *= p;
                        let action = (i + 1) as Action;
                        value += p * self.walk(navigator, &point.branch(action), player, &next)?;
                    }
                    return Ok(value);
                }

                let counterfactual_reach = inverse_pi(reach, player, navigator.num_players());
                if self.pruning && counterfactual_reach == 0.0 {
                    return Ok(0.0);
                }

                let mut values = ActionVector::zeros(num_actions);
                for (i, value) in values.iter_mut().enumerate() {
                    let mut next = *reach;
                    next[player as usize] *= sigma[i];
                    *value = self.walk(navigator, &point.branch((i + 1) as Action), player, &next)?;
                }

                let node_value = sigma.dot(&values);
                let own_reach = reach[player as usize];
                for i in 0..num_actions {
                    let action = (i + 1) as Action;
                    tally.add_regret(action, counterfactual_reach * (values[i] - node_value));
                    tally.add_strategy(action, own_reach * sigma[i]);
                }
                Ok(node_value)
            }
        }
    }
}

/// Product of the reach probabilities of everyone except `player`, chance included.
fn inverse_pi(reach: &Reach, player: PlayerIndex, num_players: usize) -> f64 {
    reach[..=num_players]
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != player as usize)
        .map(|(_, &p)| p)
        .product()
}

impl<G: GameDefinition> CfrAlgorithm<G> for VanillaCfr {
    fn name(&self) -> &'static str {
        "vanilla"
    }

    fn iterate(
        &self,
        navigator: &HistoryNavigator<G>,
        _iteration: u64,
        player: PlayerIndex,
    ) -> Result<f64, SolverError> {
        let reach: Reach = [1.0; MAX_PLAYERS + 1];
        self.walk(navigator, &HistoryPoint::root(), player, &reach)
    }
}
