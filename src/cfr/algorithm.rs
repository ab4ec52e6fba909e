//! The interface shared by every solving algorithm.

use crate::cfr::error::SolverError;
use crate::cfr::game::{GameDefinition, PlayerIndex};
use crate::cfr::history::HistoryNavigator;

/// One solving algorithm: a policy for walking the tree and updating tallies.
///
/// The driver calls [`CfrAlgorithm::iterate`] once per (iteration, player).
/// Implementations only touch shared state through the atomic tally
/// increments, so calls for different iterations may run concurrently when
/// [`CfrAlgorithm::parallel_iterations`] allows it.
pub trait CfrAlgorithm<G: GameDefinition>: Send + Sync {
    /// Name for logs and reports.
    fn name(&self) -> &'static str;

    /// Optimize `player` for one iteration. Returns the root value estimate
    /// for that player.
    fn iterate(
        &self,
        navigator: &HistoryNavigator<G>,
        iteration: u64,
        player: PlayerIndex,
    ) -> Result<f64, SolverError>;

    /// Whether successive iterations may run concurrently.
    fn parallel_iterations(&self) -> bool {
        false
    }
}
