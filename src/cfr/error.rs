//! Error types for the solver.

use thiserror::Error;

use crate::cfr::config::ConfigError;
use crate::cfr::game::PlayerIndex;

/// Errors that can occur while building or running a solver.
#[derive(Debug, Error)]
pub enum SolverError {
    /// Configuration rejected before solving started.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The game definition returned inconsistent data.
    #[error("invalid game definition: {0}")]
    InvalidGame(String),

    /// A hard-capped enumeration would exceed its limit.
    #[error("{what}: {count} exceeds the limit of {limit}")]
    EnumerationLimit {
        /// What was being enumerated.
        what: String,
        /// Size of the requested enumeration (saturating).
        count: u64,
        /// Configured cap.
        limit: u64,
    },

    /// Best response came out worse than the strategy it responds to, under
    /// exhaustive evaluation. Solver output cannot be trusted.
    #[error(
        "best response for player {player} ({best_response}) is below the strategy utility ({strategy_utility})"
    )]
    InconsistentBestResponse {
        /// Measured player.
        player: PlayerIndex,
        /// Best-response utility.
        best_response: f64,
        /// Utility of the current average strategy.
        strategy_utility: f64,
    },

    /// The reporting pipeline shut down before every play-out was delivered.
    #[error("reporting pipeline failed: {0}")]
    Reporting(String),

    /// Checkpoint file could not be read or written.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Checkpoint could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
