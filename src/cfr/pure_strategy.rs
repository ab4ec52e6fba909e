//! Pure-strategy equilibria of two-player games.
//!
//! Every pure strategy of a player (one action per information set) is
//! numbered in mixed radix over the player's information sets. Each strategy
//! pair is played out over all chance branches to fill two payoff matrices.
//! Dominated strategies are then eliminated round by round until nothing
//! changes, and the surviving profiles where neither player gains by
//! switching to another surviving strategy are the equilibria.

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cfr::config::{ConfigError, DominanceStrictness, SolverConfig};
use crate::cfr::error::SolverError;
use crate::cfr::game::{Action, GameDefinition};
use crate::cfr::history::{HistoryNavigator, HistoryPoint};
use crate::cfr::state::GameState;
use crate::cfr::storage::InformationSetKey;

/// Payoff comparisons within this distance count as equal.
pub const PAYOFF_TOLERANCE: f64 = 1e-9;

/// Payoffs of both players, indexed `[row][column]` where rows are player
/// 0's strategies and columns player 1's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffMatrices {
    /// Player 0's payoffs.
    pub row: Vec<Vec<f64>>,
    /// Player 1's payoffs.
    pub column: Vec<Vec<f64>>,
}

impl PayoffMatrices {
    /// Build from `(row payoff, column payoff)` cells.
    pub fn from_cells(cells: &[Vec<(f64, f64)>]) -> Self {
        Self {
            row: cells.iter().map(|r| r.iter().map(|c| c.0).collect()).collect(),
            column: cells.iter().map(|r| r.iter().map(|c| c.1).collect()).collect(),
        }
    }

    /// Number of row strategies.
    pub fn rows(&self) -> usize {
        self.row.len()
    }

    /// Number of column strategies.
    pub fn columns(&self) -> usize {
        self.row.first().map_or(0, Vec::len)
    }
}

/// Strategies left after iterated dominance elimination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Survivors {
    /// Surviving row strategies, ascending.
    pub rows: Vec<usize>,
    /// Surviving column strategies, ascending.
    pub columns: Vec<usize>,
}

/// Whether `a` dominates `b`, given both payoff vectors over the same
/// opponent strategies.
fn dominates(a: impl Iterator<Item = f64>, b: impl Iterator<Item = f64>, strictness: DominanceStrictness) -> bool {
    let mut strictly_better_somewhere = false;
    let mut compared = false;
    for (x, y) in a.zip(b) {
        compared = true;
        match strictness {
            DominanceStrictness::Strict => {
                if x <= y + PAYOFF_TOLERANCE {
                    return false;
                }
            }
            DominanceStrictness::Weak => {
                if x < y - PAYOFF_TOLERANCE {
                    return false;
                }
                if x > y + PAYOFF_TOLERANCE {
                    strictly_better_somewhere = true;
                }
            }
        }
    }
    match strictness {
        DominanceStrictness::Strict => compared,
        DominanceStrictness::Weak => strictly_better_somewhere,
    }
}

/// Iterated elimination of dominated strategies starting from `start`.
///
/// Each round removes, simultaneously, every row dominated by another
/// surviving row and every column dominated by another surviving column.
/// Rounds repeat until one removes nothing.
pub fn eliminate_dominated_from(
    payoffs: &PayoffMatrices,
    start: Survivors,
    strictness: DominanceStrictness,
) -> Survivors {
    let Survivors { mut rows, mut columns } = start;
    let mut round = 0;
    loop {
        round += 1;
        let kept_rows: Vec<usize> = rows
            .iter()
            .copied()
            .filter(|&r| {
                !rows.iter().any(|&other| {
                    other != r
                        && dominates(
                            columns.iter().map(|&c| payoffs.row[other][c]),
                            columns.iter().map(|&c| payoffs.row[r][c]),
                            strictness,
                        )
                })
            })
            .collect();
        let kept_columns: Vec<usize> = columns
            .iter()
            .copied()
            .filter(|&c| {
                !columns.iter().any(|&other| {
                    other != c
                        && dominates(
                            rows.iter().map(|&r| payoffs.column[r][other]),
                            rows.iter().map(|&r| payoffs.column[r][c]),
                            strictness,
                        )
                })
            })
            .collect();

        if kept_rows.len() == rows.len() && kept_columns.len() == columns.len() {
            log::debug!(
                "dominance elimination stable after {} rounds: {} x {} survive",
                round,
                rows.len(),
                columns.len()
            );
            return Survivors { rows, columns };
        }
        rows = kept_rows;
        columns = kept_columns;
    }
}

/// Iterated elimination of dominated strategies over the full matrices.
pub fn eliminate_dominated(payoffs: &PayoffMatrices, strictness: DominanceStrictness) -> Survivors {
    let start = Survivors {
        rows: (0..payoffs.rows()).collect(),
        columns: (0..payoffs.columns()).collect(),
    };
    eliminate_dominated_from(payoffs, start, strictness)
}

/// A pure-strategy profile and its payoffs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PureProfile {
    /// Player 0's strategy number.
    pub row: usize,
    /// Player 1's strategy number.
    pub column: usize,
    /// Payoffs of player 0 and player 1.
    pub utilities: [f64; 2],
}

/// Surviving profiles from which neither player gains by switching to
/// another surviving strategy.
pub fn nash_profiles(payoffs: &PayoffMatrices, survivors: &Survivors) -> Vec<PureProfile> {
    let mut profiles = Vec::new();
    for &r in &survivors.rows {
        for &c in &survivors.columns {
            let row_payoff = payoffs.row[r][c];
            let column_payoff = payoffs.column[r][c];
            let row_stable = survivors
                .rows
                .iter()
                .all(|&other| payoffs.row[other][c] <= row_payoff + PAYOFF_TOLERANCE);
            let column_stable = survivors
                .columns
                .iter()
                .all(|&other| payoffs.column[r][other] <= column_payoff + PAYOFF_TOLERANCE);
            if row_stable && column_stable {
                profiles.push(PureProfile {
                    row: r,
                    column: c,
                    utilities: [row_payoff, column_payoff],
                });
            }
        }
    }
    profiles
}

/// Profiles not Pareto-dominated by another profile in the list.
pub fn pareto_filter(profiles: Vec<PureProfile>) -> Vec<PureProfile> {
    let dominated = |p: &PureProfile| {
        profiles.iter().any(|q| {
            q.utilities
                .iter()
                .zip(&p.utilities)
                .all(|(a, b)| *a >= b - PAYOFF_TOLERANCE)
                && q.utilities
                    .iter()
                    .zip(&p.utilities)
                    .any(|(a, b)| *a > b + PAYOFF_TOLERANCE)
        })
    };
    profiles.iter().filter(|p| !dominated(p)).cloned().collect()
}

/// Pure strategies of one player: the information sets they cover and
/// their branching factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySpace {
    /// Information sets of the player, in mixed-radix digit order.
    pub information_sets: Vec<InformationSetKey>,
    /// Actions available at each information set.
    pub num_actions: Vec<usize>,
    /// Number of pure strategies.
    pub count: u64,
}

impl StrategySpace {
    /// Actions of strategy `index`, one per information set.
    pub fn decode(&self, mut index: u64) -> Vec<Action> {
        self.num_actions
            .iter()
            .map(|&n| {
                let digit = index % n as u64;
                index /= n as u64;
                (digit + 1) as Action
            })
            .collect()
    }
}

/// Everything the finder produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PureStrategyEquilibria {
    /// Strategy spaces of player 0 and player 1.
    pub spaces: [StrategySpace; 2],
    /// Payoff matrices over all pure strategies.
    pub payoffs: PayoffMatrices,
    /// Strategies surviving dominance elimination.
    pub survivors: Survivors,
    /// Equilibrium profiles among the survivors.
    pub equilibria: Vec<PureProfile>,
}

impl PureStrategyEquilibria {
    /// Actions of both players in an equilibrium profile.
    pub fn actions(&self, profile: &PureProfile) -> [Vec<Action>; 2] {
        [
            self.spaces[0].decode(profile.row as u64),
            self.spaces[1].decode(profile.column as u64),
        ]
    }
}

/// Find pure-strategy equilibria of a two-player game.
pub fn find_pure_strategy_equilibria<G: GameDefinition>(
    navigator: &HistoryNavigator<G>,
    config: &SolverConfig,
) -> Result<PureStrategyEquilibria, SolverError> {
    if navigator.num_players() != 2 {
        return Err(ConfigError::PlayerCount {
            algorithm: "pure-strategy equilibrium finder",
            expected: 2,
            actual: navigator.num_players(),
        }
        .into());
    }
    navigator.populate_all(config.max_tree_nodes)?;

    let mut digit_of: FxHashMap<usize, usize> = FxHashMap::default();
    let mut spaces = Vec::with_capacity(2);
    for player in 0..2 {
        let tallies = navigator.store().tallies_for(player);
        let mut count: u64 = 1;
        for tally in &tallies {
            count = count
                .checked_mul(tally.num_actions() as u64)
                .filter(|&c| c <= config.max_pure_strategies)
                .ok_or_else(|| SolverError::EnumerationLimit {
                    what: format!("pure strategies of player {}", player),
                    count: count.saturating_mul(tally.num_actions() as u64),
                    limit: config.max_pure_strategies,
                })?;
        }
        for (digit, tally) in tallies.iter().enumerate() {
            digit_of.insert(tally.id(), digit);
        }
        spaces.push(StrategySpace {
            information_sets: tallies
                .iter()
                .map(|t| InformationSetKey::new(t.decision_index(), t.information()))
                .collect(),
            num_actions: tallies.iter().map(|t| t.num_actions()).collect(),
            count,
        });
    }

    let profiles = spaces[0]
        .count
        .checked_mul(spaces[1].count)
        .filter(|&c| c <= config.max_pure_profiles)
        .ok_or_else(|| SolverError::EnumerationLimit {
            what: "pure strategy profiles".to_string(),
            count: spaces[0].count.saturating_mul(spaces[1].count),
            limit: config.max_pure_profiles,
        })?;
    log::info!(
        "enumerating {} x {} = {} pure strategy profiles",
        spaces[0].count,
        spaces[1].count,
        profiles
    );

    let cells: Vec<Vec<(f64, f64)>> = (0..spaces[0].count)
        .into_par_iter()
        .map(|r| {
            let row_actions = spaces[0].decode(r);
            (0..spaces[1].count)
                .map(|c| {
                    let column_actions = spaces[1].decode(c);
                    let assignment = [row_actions.as_slice(), column_actions.as_slice()];
                    play(navigator, &HistoryPoint::root(), &assignment, &digit_of)
                })
                .collect::<Result<Vec<(f64, f64)>, SolverError>>()
        })
        .collect::<Result<_, SolverError>>()?;
    let payoffs = PayoffMatrices::from_cells(&cells);

    let survivors = eliminate_dominated(&payoffs, config.dominance);
    let mut equilibria = nash_profiles(&payoffs, &survivors);
    if config.pareto_filter {
        equilibria = pareto_filter(equilibria);
    }
    log::info!(
        "{} pure equilibria among {} x {} surviving strategies",
        equilibria.len(),
        survivors.rows.len(),
        survivors.columns.len()
    );

    let [first, second]: [StrategySpace; 2] = spaces
        .try_into()
        .map_err(|_| SolverError::InvalidGame("expected two strategy spaces".to_string()))?;
    Ok(PureStrategyEquilibria {
        spaces: [first, second],
        payoffs,
        survivors,
        equilibria,
    })
}

/// Expected payoffs of both players under a pure profile, chance weighted.
fn play<G: GameDefinition>(
    navigator: &HistoryNavigator<G>,
    point: &HistoryPoint,
    assignment: &[&[Action]; 2],
    digit_of: &FxHashMap<usize, usize>,
) -> Result<(f64, f64), SolverError> {
    match navigator.resolve(point)? {
        GameState::Terminal(terminal) => Ok((terminal.utility(0), terminal.utility(1))),
        GameState::Chance(chance) => {
            let (mut a, mut b) = (0.0, 0.0);
            for (i, &p) in chance.probabilities().iter().enumerate() {
                if p > 0.0 {
                    let (x, y) = play(navigator, &point.branch((i + 1) as Action), assignment, digit_of)?;
                    a += p * x;
                    b += p * y;
                }
            }
            Ok((a, b))
        }
        GameState::Decision(tally) => {
            let action = match tally.forced_action() {
                Some(action) => action,
                None => {
                    let digit = digit_of.get(&tally.id()).copied().ok_or_else(|| {
                        SolverError::InvalidGame(format!(
                            "information set {}:{} missing from the enumerated tree",
                            tally.decision_index(),
                            tally.information()
                        ))
                    })?;
                    assignment[tally.player() as usize][digit]
                }
            };
            play(navigator, &point.branch(action), assignment, digit_of)
        }
    }
}
