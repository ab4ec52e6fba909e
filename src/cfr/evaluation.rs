//! Read-only evaluation of the average strategy profile.
//!
//! Exhaustive functions weight every branch by its chance or average-strategy
//! probability; sampled functions follow single random paths drawn from the
//! same distributions.

use crate::cfr::error::SolverError;
use crate::cfr::game::{Action, GameDefinition, MAX_PLAYERS};
use crate::cfr::history::{HistoryNavigator, HistoryPoint};
use crate::cfr::random::{DeterministicStream, DrawPurpose};
use crate::cfr::regret;
use crate::cfr::reporting::CompletedPlayout;
use crate::cfr::state::GameState;

/// Expected utility of every player when everyone plays the average strategy.
pub fn average_strategy_utilities<G: GameDefinition>(
    navigator: &HistoryNavigator<G>,
) -> Result<Vec<f64>, SolverError> {
    let mut totals = [0.0; MAX_PLAYERS];
    accumulate(navigator, &HistoryPoint::root(), 1.0, &mut totals)?;
    Ok(totals[..navigator.num_players()].to_vec())
}

fn accumulate<G: GameDefinition>(
    navigator: &HistoryNavigator<G>,
    point: &HistoryPoint,
    weight: f64,
    totals: &mut [f64; MAX_PLAYERS],
) -> Result<(), SolverError> {
    let probabilities = match navigator.resolve(point)? {
        GameState::Terminal(terminal) => {
            for (total, u) in totals.iter_mut().zip(&terminal.utilities) {
                *total += weight * u;
            }
            return Ok(());
        }
        GameState::Chance(chance) => *chance.probabilities(),
        GameState::Decision(tally) => tally.average_strategy(),
    };
    for (i, &p) in probabilities.iter().enumerate() {
        if p > 0.0 {
            accumulate(navigator, &point.branch((i + 1) as Action), weight * p, totals)?;
        }
    }
    Ok(())
}

/// Play one game to the end, sampling chance and average strategies.
pub fn sample_playout<G: GameDefinition>(
    navigator: &HistoryNavigator<G>,
    stream: &DeterministicStream,
    index: u64,
) -> Result<CompletedPlayout, SolverError> {
    let mut point = HistoryPoint::root();
    loop {
        let action = match navigator.resolve(&point)? {
            GameState::Terminal(terminal) => {
                return Ok(CompletedPlayout {
                    actions: point.actions().to_vec(),
                    utilities: terminal.utilities.clone(),
                    weight: 1.0,
                })
            }
            GameState::Chance(chance) => {
                chance.sample(stream.draw(chance.decision_index, &point, DrawPurpose::Playout(index)))
            }
            GameState::Decision(tally) => {
                let u = stream.draw(tally.decision_index(), &point, DrawPurpose::Playout(index));
                regret::sample_action(&tally.average_strategy(), u)
            }
        };
        point = point.branch(action);
    }
}

/// Sampled estimate of [`average_strategy_utilities`] from `samples` play-outs.
pub fn sampled_average_strategy_utilities<G: GameDefinition>(
    navigator: &HistoryNavigator<G>,
    stream: &DeterministicStream,
    samples: u64,
) -> Result<Vec<f64>, SolverError> {
    let mut totals = vec![0.0; navigator.num_players()];
    for index in 0..samples {
        let playout = sample_playout(navigator, stream, index)?;
        for (total, u) in totals.iter_mut().zip(&playout.utilities) {
            *total += u;
        }
    }
    if samples > 0 {
        for total in totals.iter_mut() {
            *total /= samples as f64;
        }
    }
    Ok(totals)
}

/// Visit every play-out with positive probability under the average
/// strategies, weighted by that probability.
pub fn for_each_weighted_playout<G, F>(navigator: &HistoryNavigator<G>, mut visit: F) -> Result<(), SolverError>
where
    G: GameDefinition,
    F: FnMut(CompletedPlayout) -> Result<(), SolverError>,
{
    enumerate(navigator, &HistoryPoint::root(), 1.0, &mut visit)
}

fn enumerate<G, F>(
    navigator: &HistoryNavigator<G>,
    point: &HistoryPoint,
    weight: f64,
    visit: &mut F,
) -> Result<(), SolverError>
where
    G: GameDefinition,
    F: FnMut(CompletedPlayout) -> Result<(), SolverError>,
{
    let probabilities = match navigator.resolve(point)? {
        GameState::Terminal(terminal) => {
            return visit(CompletedPlayout {
                actions: point.actions().to_vec(),
                utilities: terminal.utilities.clone(),
                weight,
            });
        }
        GameState::Chance(chance) => *chance.probabilities(),
        GameState::Decision(tally) => tally.average_strategy(),
    };
    for (i, &p) in probabilities.iter().enumerate() {
        if p > 0.0 {
            enumerate(navigator, &point.branch((i + 1) as Action), weight * p, visit)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::kuhn::KuhnPoker;
    use crate::games::matching_pennies::MatchingPennies;

    #[test]
    fn test_uniform_kuhn_utilities_are_zero_sum() {
        let navigator = HistoryNavigator::new(KuhnPoker::new()).unwrap();
        let utilities = average_strategy_utilities(&navigator).unwrap();
        assert_eq!(utilities.len(), 2);
        assert!((utilities[0] + utilities[1]).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_playouts_sum_to_one() {
        let navigator = HistoryNavigator::new(KuhnPoker::new()).unwrap();
        let mut total_weight = 0.0;
        let mut expected = 0.0;
        for_each_weighted_playout(&navigator, |playout| {
            total_weight += playout.weight;
            expected += playout.weight * playout.utilities[0];
            Ok(())
        })
        .unwrap();
        assert!((total_weight - 1.0).abs() < 1e-12);
        let exhaustive = average_strategy_utilities(&navigator).unwrap();
        assert!((expected - exhaustive[0]).abs() < 1e-12);
    }

    #[test]
    fn test_sampled_estimate_is_close_and_reproducible() {
        let navigator = HistoryNavigator::new(MatchingPennies::new()).unwrap();
        let stream = DeterministicStream::new(3, 0, 0);
        let a = sampled_average_strategy_utilities(&navigator, &stream, 20_000).unwrap();
        let b = sampled_average_strategy_utilities(&navigator, &stream, 20_000).unwrap();
        assert_eq!(a, b);
        // uniform play in matching pennies is worth zero
        assert!(a[0].abs() < 0.05);
    }
}
