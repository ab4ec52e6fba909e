//! Game definition trait consumed by the CFR solvers.
//!
//! The solver never knows the rules of the game it is solving. It only sees
//! an ordered list of decisions and can ask the game what happens after any
//! sequence of actions. Everything else (tree caching, information-set
//! bookkeeping, regret accumulation) is handled on the solver side.

use std::fmt::Debug;

use crate::cfr::error::SolverError;

/// An action taken at a decision. Actions are 1-based: a decision with three
/// legal actions accepts 1, 2 and 3.
pub type Action = u8;

/// Index of a player. Non-chance players are numbered from 0; the chance
/// player is indexed directly after the last non-chance player.
pub type PlayerIndex = u8;

/// Upper bound on the number of legal actions at any decision.
///
/// All per-action scratch buffers are sized by this constant.
pub const MAX_ACTIONS: usize = 32;

/// Upper bound on the number of non-chance players.
pub const MAX_PLAYERS: usize = 8;

/// Metadata describing one decision point of the game.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionDescriptor {
    /// Human readable name, used in logs and reports.
    pub name: String,
    /// Player making the decision (the chance player index for chance decisions).
    pub player: PlayerIndex,
    /// Number of legal actions.
    pub num_actions: u8,
    /// Whether this decision is resolved by chance.
    pub is_chance: bool,
    /// Debug override: when set, the decision always takes this action.
    pub always_do_action: Option<Action>,
}

impl DecisionDescriptor {
    /// Create a decision made by a non-chance player.
    pub fn player(name: impl Into<String>, player: PlayerIndex, num_actions: u8) -> Self {
        Self {
            name: name.into(),
            player,
            num_actions,
            is_chance: false,
            always_do_action: None,
        }
    }

    /// Create a chance decision. `chance_player` is the number of non-chance players.
    pub fn chance(name: impl Into<String>, chance_player: PlayerIndex, num_actions: u8) -> Self {
        Self {
            name: name.into(),
            player: chance_player,
            num_actions,
            is_chance: true,
            always_do_action: None,
        }
    }

    /// Builder method: force this decision to always take `action`.
    pub fn always_do(mut self, action: Action) -> Self {
        self.always_do_action = Some(action);
        self
    }
}

/// What the game reports after replaying a sequence of actions.
#[derive(Debug, Clone, PartialEq)]
pub enum GameProgress {
    /// The next decision is resolved by chance with the given distribution
    /// (index 0 is the probability of action 1).
    Chance {
        /// Index into [`GameDefinition::decisions`].
        decision_index: usize,
        /// Probability of each action, summing to 1.
        probabilities: Vec<f64>,
    },

    /// The next decision is made by a player.
    Decision {
        /// Index into [`GameDefinition::decisions`].
        decision_index: usize,
        /// Everything the acting player has observed. Two histories with the
        /// same decision index and the same label belong to one information set.
        information: String,
    },

    /// The game is over.
    Terminal {
        /// Payoff of every non-chance player.
        utilities: Vec<f64>,
    },
}

/// The interface every solvable game implements.
///
/// # Example
/// ```ignore
/// struct MyGame { decisions: Vec<DecisionDescriptor> }
///
/// impl GameDefinition for MyGame {
///     fn num_players(&self) -> usize { 2 }
///     fn decisions(&self) -> &[DecisionDescriptor] { &self.decisions }
///     fn progress(&self, actions: &[Action]) -> GameProgress {
///         // replay `actions` and report what comes next
///     }
/// }
/// ```
pub trait GameDefinition: Send + Sync {
    /// Number of non-chance players.
    fn num_players(&self) -> usize;

    /// Ordered descriptors of every decision in the game.
    fn decisions(&self) -> &[DecisionDescriptor];

    /// Replay the game along `actions` from the root and report the node reached.
    ///
    /// Must be a pure function of `actions`.
    fn progress(&self, actions: &[Action]) -> GameProgress;

    /// Name used in logs.
    fn name(&self) -> String {
        "game".to_string()
    }

    /// Index of the chance player.
    fn chance_player(&self) -> PlayerIndex {
        self.num_players() as PlayerIndex
    }
}

/// Check the decision descriptors of a game before solving it.
pub fn validate_game<G: GameDefinition + ?Sized>(game: &G) -> Result<(), SolverError> {
    let num_players = game.num_players();
    if num_players == 0 || num_players > MAX_PLAYERS {
        return Err(SolverError::InvalidGame(format!(
            "player count {} is outside 1..={}",
            num_players, MAX_PLAYERS
        )));
    }

    for (index, decision) in game.decisions().iter().enumerate() {
        if decision.num_actions == 0 || decision.num_actions as usize > MAX_ACTIONS {
            return Err(SolverError::InvalidGame(format!(
                "decision {} ({}) has {} actions; expected 1..={}",
                index, decision.name, decision.num_actions, MAX_ACTIONS
            )));
        }
        if decision.is_chance {
            if decision.player as usize != num_players {
                return Err(SolverError::InvalidGame(format!(
                    "chance decision {} ({}) assigned to player {} instead of {}",
                    index, decision.name, decision.player, num_players
                )));
            }
        } else if decision.player as usize >= num_players {
            return Err(SolverError::InvalidGame(format!(
                "decision {} ({}) assigned to unknown player {}",
                index, decision.name, decision.player
            )));
        }
        if let Some(action) = decision.always_do_action {
            if action == 0 || action > decision.num_actions {
                return Err(SolverError::InvalidGame(format!(
                    "decision {} ({}) forces action {} outside 1..={}",
                    index, decision.name, action, decision.num_actions
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Descriptors(Vec<DecisionDescriptor>, usize);

    impl GameDefinition for Descriptors {
        fn num_players(&self) -> usize {
            self.1
        }

        fn decisions(&self) -> &[DecisionDescriptor] {
            &self.0
        }

        fn progress(&self, _actions: &[Action]) -> GameProgress {
            GameProgress::Terminal {
                utilities: vec![0.0; self.1],
            }
        }
    }

    #[test]
    fn test_valid_descriptors() {
        let game = Descriptors(
            vec![
                DecisionDescriptor::chance("deal", 2, 3),
                DecisionDescriptor::player("first", 0, 2),
                DecisionDescriptor::player("second", 1, 2).always_do(2),
            ],
            2,
        );
        assert!(validate_game(&game).is_ok());
        assert_eq!(game.chance_player(), 2);
    }

    #[test]
    fn test_rejects_bad_descriptors() {
        let too_many_actions = Descriptors(vec![DecisionDescriptor::player("wide", 0, 40)], 2);
        assert!(validate_game(&too_many_actions).is_err());

        let bad_player = Descriptors(vec![DecisionDescriptor::player("ghost", 3, 2)], 2);
        assert!(validate_game(&bad_player).is_err());

        let bad_chance = Descriptors(vec![DecisionDescriptor::chance("deal", 0, 2)], 2);
        assert!(validate_game(&bad_chance).is_err());

        let bad_forced = Descriptors(vec![DecisionDescriptor::player("x", 0, 2).always_do(3)], 2);
        assert!(validate_game(&bad_forced).is_err());
    }
}
