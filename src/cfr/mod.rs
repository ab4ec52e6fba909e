//! Counterfactual regret minimization.
//!
//! This module holds everything game-independent: the [`GameDefinition`]
//! contract, the lazily built history tree, per-information-set tallies and
//! the solving algorithms that update them.
//!
//! # Algorithms
//!
//! - **Vanilla CFR** ([`vanilla`]): full traversal for the optimizing player,
//!   weighting every branch by reach probability.
//! - **Probing CFR** ([`probing`]): samples opponent and chance actions and
//!   estimates unsampled branches with a single probe. Four presets differ in
//!   exploration schedule, probe caching and increment weighting.
//! - **Average-strategy sampling** ([`sampling`]): explores each action with a
//!   probability driven by the cumulative average strategy.
//!
//! # Analysis
//!
//! - [`best_response`]: exact best response and exploitability.
//! - [`pure_strategy`]: payoff matrices over pure strategies, iterated
//!   dominance and pure Nash equilibria for two-player games.
//! - [`evaluation`]: average-strategy utilities, exhaustive or sampled.
//!
//! # Theory
//!
//! **Regret matching** plays each action in proportion to its positive
//! cumulative regret:
//! ```text
//! Strategy(a) = max(0, Regret(a)) / sum(max(0, Regret(a')))
//! ```
//! The average strategy across iterations converges to a Nash equilibrium in
//! two-player zero-sum games.
//!
//! # References
//!
//! - Zinkevich, M., et al. "Regret Minimization in Games with Incomplete Information" (2007)
//! - Gibson, R., et al. "Efficient Monte Carlo Counterfactual Regret Minimization in Games with Many Player Actions" (2012)
//! - Gibson, R. "Regret Minimization in Non-Zero-Sum Games with Applications to Building Champion Multiplayer Computer Poker Agents" (2013)

pub mod algorithm;
mod atomic;
pub mod best_response;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod game;
pub mod history;
pub mod probing;
pub mod pure_strategy;
pub mod random;
pub mod regret;
pub mod reporting;
pub mod sampling;
pub mod solver;
pub mod state;
pub mod storage;
pub mod vanilla;

pub use algorithm::CfrAlgorithm;
pub use best_response::{BestResponse, Exploitability};
pub use config::{Algorithm, ConfigError, DominanceStrictness, SolveStats, SolverConfig};
pub use error::SolverError;
pub use game::{Action, DecisionDescriptor, GameDefinition, GameProgress, PlayerIndex};
pub use history::{HistoryNavigator, HistoryPoint};
pub use pure_strategy::{PureProfile, PureStrategyEquilibria};
pub use reporting::{CompletedPlayout, PlayoutSink, UtilityReport};
pub use solver::{Solver, SolverState};
pub use state::GameState;
pub use storage::{InformationSetKey, TallyExport, TallyStore};
