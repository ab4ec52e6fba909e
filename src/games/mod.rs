//! Game implementations for the CFR solver.
//!
//! These games have known solutions or easily checked properties and serve as:
//!
//! 1. **Validation**: games with known equilibria (Kuhn Poker, matching
//!    pennies, the prisoner's dilemma) check the algorithms end to end.
//!
//! 2. **Examples**: they show how to implement [`GameDefinition`] for a new game.
//!
//! 3. **Benchmarks**: standardized games for performance testing.
//!
//! ## Available Games
//!
//! - [`kuhn`]: Kuhn Poker, a 3-card poker game with game value -1/18
//! - [`matching_pennies`]: zero-sum, value 0, preceded by an unobserved coin flip
//! - [`matrix`]: arbitrary two-player normal-form games
//! - [`settlement`]: a litigation game with one-sided private information
//! - [`tree`]: hand-built trees for tests
//!
//! [`GameDefinition`]: crate::cfr::GameDefinition

pub mod kuhn;
pub mod matching_pennies;
pub mod matrix;
pub mod settlement;
pub mod tree;
