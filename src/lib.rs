//! # CFR Core
//!
//! A game-agnostic Counterfactual Regret Minimization (CFR) core for
//! computing equilibrium strategies in extensive-form games.
//!
//! ## Features
//!
//! - **Generic engine**: works with any game implementing [`GameDefinition`]
//! - **Several algorithms**: vanilla CFR, four probing presets and
//!   average-strategy sampling
//! - **Concurrent**: tallies are updated lock-free, so iterations can run on rayon
//! - **Analysis**: best response, exploitability and pure-strategy equilibria
//! - **Checkpointing**: save and resume solver state
//!
//! ## Quick Start
//!
//! ```
//! use cfr_core::{Algorithm, Solver, SolverConfig};
//! use cfr_core::games::kuhn::KuhnPoker;
//!
//! let config = SolverConfig::fast().with_iterations(Algorithm::Vanilla, 100).with_seed(1);
//! let mut solver = Solver::new(KuhnPoker::new(), config).unwrap();
//! solver.develop_strategies(Algorithm::Vanilla).unwrap();
//!
//! let strategy = solver.average_strategy(1, "K:").unwrap();
//! assert_eq!(strategy.len(), 2);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Solver (Generic)                         │
//! │  - Reporting windows       - Best response / exploitability     │
//! │  - Algorithm dispatch      - Pure-strategy equilibria           │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               │ HistoryNavigator + TallyStore
//!                               ▼
//!         ┌─────────────────────┼─────────────────────┐
//!         │                     │                     │
//!         ▼                     ▼                     ▼
//!    ┌─────────┐         ┌───────────┐         ┌───────────┐
//!    │ Vanilla │         │  Probing  │         │  Average  │
//!    │   CFR   │         │    CFR    │         │ sampling  │
//!    └─────────┘         └───────────┘         └───────────┘
//! ```

#![warn(missing_docs)]

/// CFR (Counterfactual Regret Minimization) solver module.
///
/// This is the core module containing the game contract, tallies and algorithms.
pub mod cfr;

/// Game implementations module.
///
/// Small games with known solutions, used for testing and validation.
pub mod games;

// Re-export commonly used types at crate root for convenience
pub use cfr::{
    Action, Algorithm, DecisionDescriptor, GameDefinition, GameProgress, PlayerIndex, Solver, SolverConfig,
    SolverError,
};
