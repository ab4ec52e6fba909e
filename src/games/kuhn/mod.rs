//! Kuhn Poker, the standard benchmark for CFR correctness.
//!
//! Kuhn Poker is small enough to solve exactly and has a known, mathematically
//! proven Nash equilibrium, which makes it a good end-to-end check.
//!
//! ## Game Rules
//!
//! - 3 cards: Jack, Queen, King
//! - 2 players, each antes 1 chip
//! - Each player receives 1 card
//! - Player 1 acts first: Pass or Bet (1 chip)
//! - Player 2 responds based on P1's action
//! - Higher card wins at showdown
//!
//! ## Game Tree
//!
//! ```text
//! Deal (chance, 6 equally likely deals)
//! └── P1 (decision 1)
//!     ├── Pass
//!     │   └── P2 (decision 2)
//!     │       ├── Pass → Showdown (pot = 2)
//!     │       └── Bet
//!     │           └── P1 (decision 3)
//!     │               ├── Pass → P2 wins (pot = 3)
//!     │               └── Bet → Showdown (pot = 4)
//!     └── Bet
//!         └── P2 (decision 2)
//!             ├── Pass → P1 wins (pot = 3)
//!             └── Bet → Showdown (pot = 4)
//! ```
//!
//! Information labels are the acting player's card and the betting so far,
//! e.g. `"Q:pb"`.
//!
//! ## Known Nash Equilibrium
//!
//! - **Player 1 with Queen**: Always Pass
//! - **Player 2 facing Bet with Jack**: Always Fold
//! - **Player 2 facing Bet with King**: Always Call
//!
//! **Expected Value**: Player 1 EV = -1/18 ≈ -0.0556

use std::fmt;

use crate::cfr::game::{Action, DecisionDescriptor, GameDefinition, GameProgress};

/// The six deals, as (player 1 card, player 2 card). 0 = Jack, 2 = King.
const DEALS: [(u8, u8); 6] = [(0, 1), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1)];

/// Actions in Kuhn Poker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KuhnAction {
    /// Pass (check if no bet, fold if facing bet)
    Pass,
    /// Bet (or call if facing bet)
    Bet,
}

impl KuhnAction {
    /// Solver action number (1-based).
    pub fn action(self) -> Action {
        match self {
            KuhnAction::Pass => 1,
            KuhnAction::Bet => 2,
        }
    }

    fn from_action(action: Action) -> Option<Self> {
        match action {
            1 => Some(KuhnAction::Pass),
            2 => Some(KuhnAction::Bet),
            _ => None,
        }
    }

    fn symbol(self) -> char {
        match self {
            KuhnAction::Pass => 'p',
            KuhnAction::Bet => 'b',
        }
    }
}

impl fmt::Display for KuhnAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KuhnAction::Pass => write!(f, "Pass"),
            KuhnAction::Bet => write!(f, "Bet"),
        }
    }
}

/// Kuhn Poker game.
#[derive(Debug, Clone)]
pub struct KuhnPoker {
    decisions: Vec<DecisionDescriptor>,
}

impl KuhnPoker {
    /// Create a new Kuhn Poker game.
    pub fn new() -> Self {
        Self {
            decisions: vec![
                DecisionDescriptor::chance("deal", 2, DEALS.len() as u8),
                DecisionDescriptor::player("open", 0, 2),
                DecisionDescriptor::player("respond", 1, 2),
                DecisionDescriptor::player("answer bet", 0, 2),
            ],
        }
    }

    /// Single-letter card name.
    pub fn card_name(card: u8) -> &'static str {
        match card {
            0 => "J",
            1 => "Q",
            2 => "K",
            _ => "?",
        }
    }

    /// Payoff of player 1 for a finished betting sequence, `None` while the
    /// hand is still running.
    fn payoff(cards: (u8, u8), history: &str) -> Option<f64> {
        let showdown = if cards.0 > cards.1 { 1.0 } else { -1.0 };
        match history {
            "pp" => Some(showdown),
            "bp" => Some(1.0),
            "pbp" => Some(-1.0),
            "bb" | "pbb" => Some(2.0 * showdown),
            _ => None,
        }
    }
}

impl Default for KuhnPoker {
    fn default() -> Self {
        Self::new()
    }
}

impl GameDefinition for KuhnPoker {
    fn num_players(&self) -> usize {
        2
    }

    fn decisions(&self) -> &[DecisionDescriptor] {
        &self.decisions
    }

    fn progress(&self, actions: &[Action]) -> GameProgress {
        let Some((&deal, betting)) = actions.split_first() else {
            return GameProgress::Chance {
                decision_index: 0,
                probabilities: vec![1.0 / DEALS.len() as f64; DEALS.len()],
            };
        };
        let (Some(&cards), Some(history)) = (
            DEALS.get((deal as usize).wrapping_sub(1)),
            betting
                .iter()
                .map(|&a| KuhnAction::from_action(a).map(KuhnAction::symbol))
                .collect::<Option<String>>(),
        ) else {
            return GameProgress::Terminal { utilities: Vec::new() };
        };

        if let Some(p0) = Self::payoff(cards, &history) {
            return GameProgress::Terminal {
                utilities: vec![p0, -p0],
            };
        }

        let (decision_index, card) = match history.as_str() {
            "" => (1, cards.0),
            "p" | "b" => (2, cards.1),
            "pb" => (3, cards.0),
            _ => return GameProgress::Terminal { utilities: Vec::new() },
        };
        GameProgress::Decision {
            decision_index,
            information: format!("{}:{}", Self::card_name(card), history),
        }
    }

    fn name(&self) -> String {
        "kuhn poker".to_string()
    }
}
