//! Two-player normal-form games.
//!
//! The row player moves first and the column player moves without observing
//! the row, so every matrix game has exactly one information set per player.

use crate::cfr::game::{Action, DecisionDescriptor, GameDefinition, GameProgress};

/// A bimatrix game. `cells[r][c]` holds the payoffs (row, column) when the
/// row player picks action `r + 1` and the column player picks `c + 1`.
#[derive(Debug, Clone)]
pub struct MatrixGame {
    decisions: Vec<DecisionDescriptor>,
    cells: Vec<Vec<(f64, f64)>>,
}

impl MatrixGame {
    /// Create a game from its payoff cells. Rows must all have the same length.
    pub fn new(cells: Vec<Vec<(f64, f64)>>) -> Self {
        let rows = cells.len() as u8;
        let columns = cells.first().map_or(0, |row| row.len()) as u8;
        Self {
            decisions: vec![
                DecisionDescriptor::player("row", 0, rows),
                DecisionDescriptor::player("column", 1, columns),
            ],
            cells,
        }
    }

    /// The prisoner's dilemma. Action 1 cooperates and action 2 defects.
    pub fn prisoners_dilemma() -> Self {
        Self::new(vec![
            vec![(-1.0, -1.0), (-3.0, 0.0)],
            vec![(0.0, -3.0), (-2.0, -2.0)],
        ])
    }
}

impl GameDefinition for MatrixGame {
    fn num_players(&self) -> usize {
        2
    }

    fn decisions(&self) -> &[DecisionDescriptor] {
        &self.decisions
    }

    fn progress(&self, actions: &[Action]) -> GameProgress {
        match actions {
            [] => GameProgress::Decision {
                decision_index: 0,
                information: String::new(),
            },
            [_] => GameProgress::Decision {
                decision_index: 1,
                information: String::new(),
            },
            [row, column, ..] => {
                let cell = self
                    .cells
                    .get((*row as usize).wrapping_sub(1))
                    .and_then(|r| r.get((*column as usize).wrapping_sub(1)));
                match cell {
                    Some(&(a, b)) => GameProgress::Terminal { utilities: vec![a, b] },
                    None => GameProgress::Terminal { utilities: Vec::new() },
                }
            }
        }
    }

    fn name(&self) -> String {
        format!("{}x{} matrix", self.decisions[0].num_actions, self.decisions[1].num_actions)
    }
}
