//! Matching pennies with a cosmetic coin flip.
//!
//! A fair chance node comes first so the game exercises chance handling. The
//! flip is not observed and does not change the payoffs. Player 0 then picks
//! heads or tails, and player 1 picks without seeing that choice. Player 0
//! wins 1 on a match and loses 1 otherwise. The value of the game is 0.

use crate::cfr::game::{Action, DecisionDescriptor, GameDefinition, GameProgress};

/// Matching pennies.
#[derive(Debug, Clone)]
pub struct MatchingPennies {
    decisions: Vec<DecisionDescriptor>,
}

impl MatchingPennies {
    /// Create the game.
    pub fn new() -> Self {
        Self {
            decisions: vec![
                DecisionDescriptor::chance("coin", 2, 2),
                DecisionDescriptor::player("matcher", 0, 2),
                DecisionDescriptor::player("mismatcher", 1, 2),
            ],
        }
    }
}

impl Default for MatchingPennies {
    fn default() -> Self {
        Self::new()
    }
}

impl GameDefinition for MatchingPennies {
    fn num_players(&self) -> usize {
        2
    }

    fn decisions(&self) -> &[DecisionDescriptor] {
        &self.decisions
    }

    fn progress(&self, actions: &[Action]) -> GameProgress {
        match actions {
            [] => GameProgress::Chance {
                decision_index: 0,
                probabilities: vec![0.5, 0.5],
            },
            [_] => GameProgress::Decision {
                decision_index: 1,
                information: String::new(),
            },
            [_, _] => GameProgress::Decision {
                decision_index: 2,
                information: String::new(),
            },
            [_, first, second, ..] => {
                let u = if first == second { 1.0 } else { -1.0 };
                GameProgress::Terminal { utilities: vec![u, -u] }
            }
        }
    }

    fn name(&self) -> String {
        "matching pennies".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payoffs() {
        let game = MatchingPennies::new();
        assert_eq!(game.progress(&[1, 2, 2]), GameProgress::Terminal { utilities: vec![1.0, -1.0] });
        assert_eq!(game.progress(&[2, 1, 2]), GameProgress::Terminal { utilities: vec![-1.0, 1.0] });
    }
}
