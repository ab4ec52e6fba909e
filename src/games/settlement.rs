//! A small litigation settlement game with private information.
//!
//! Chance draws the strength of the plaintiff's case, which only the
//! plaintiff observes. The plaintiff demands a fraction of the damages and
//! the defendant, without seeing the demand, offers a fraction. If the offer
//! meets the demand the case settles at the midpoint; otherwise it goes to
//! trial, where the plaintiff recovers the full damages with a probability
//! set by the case strength and each side pays its own costs.

use crate::cfr::game::{Action, DecisionDescriptor, GameDefinition, GameProgress};

const STRENGTH_PROBABILITIES: [f64; 3] = [0.3, 0.4, 0.3];
const WIN_PROBABILITIES: [f64; 3] = [0.2, 0.5, 0.8];
const STRENGTH_LABELS: [&str; 3] = ["weak", "average", "strong"];
const AMOUNTS: [f64; 3] = [0.25, 0.5, 0.75];
const TRIAL_COST: f64 = 0.1;

/// The settlement game. Damages are normalized to 1.
#[derive(Debug, Clone)]
pub struct SettlementGame {
    decisions: Vec<DecisionDescriptor>,
}

impl SettlementGame {
    /// Create the game.
    pub fn new() -> Self {
        Self {
            decisions: vec![
                DecisionDescriptor::chance("case strength", 2, STRENGTH_PROBABILITIES.len() as u8),
                DecisionDescriptor::player("demand", 0, AMOUNTS.len() as u8),
                DecisionDescriptor::player("offer", 1, AMOUNTS.len() as u8),
            ],
        }
    }

    fn outcome(strength: usize, demand: usize, offer: usize) -> Option<[f64; 2]> {
        let demand = *AMOUNTS.get(demand)?;
        let offer = *AMOUNTS.get(offer)?;
        if offer >= demand {
            let paid = (offer + demand) / 2.0;
            return Some([paid, -paid]);
        }
        let expected = *WIN_PROBABILITIES.get(strength)?;
        Some([expected - TRIAL_COST, -expected - TRIAL_COST])
    }
}

impl Default for SettlementGame {
    fn default() -> Self {
        Self::new()
    }
}

impl GameDefinition for SettlementGame {
    fn num_players(&self) -> usize {
        2
    }

    fn decisions(&self) -> &[DecisionDescriptor] {
        &self.decisions
    }

    fn progress(&self, actions: &[Action]) -> GameProgress {
        let index = |a: Action| (a as usize).wrapping_sub(1);
        match actions {
            [] => GameProgress::Chance {
                decision_index: 0,
                probabilities: STRENGTH_PROBABILITIES.to_vec(),
            },
            [strength] => GameProgress::Decision {
                decision_index: 1,
                information: STRENGTH_LABELS.get(index(*strength)).copied().unwrap_or("").to_string(),
            },
            [_, _] => GameProgress::Decision {
                decision_index: 2,
                information: String::new(),
            },
            [strength, demand, offer, ..] => GameProgress::Terminal {
                utilities: Self::outcome(index(*strength), index(*demand), index(*offer))
                    .map(|u| u.to_vec())
                    .unwrap_or_default(),
            },
        }
    }

    fn name(&self) -> String {
        "settlement".to_string()
    }
}
