//! Explicit game trees.
//!
//! [`TreeGame`] wraps a hand-built tree of [`TreeNode`]s. It is the quickest
//! way to describe a small extensive-form game for tests and experiments.

use crate::cfr::game::{Action, DecisionDescriptor, GameDefinition, GameProgress};

/// A node of an explicit game tree.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    /// Chance node over `children` with the given probabilities.
    Chance {
        /// Decision index.
        decision_index: usize,
        /// Probability of each child.
        probabilities: Vec<f64>,
        /// One child per action.
        children: Vec<TreeNode>,
    },
    /// Player decision.
    Decision {
        /// Decision index.
        decision_index: usize,
        /// Information label.
        information: String,
        /// One child per action.
        children: Vec<TreeNode>,
    },
    /// Leaf with one utility per player.
    Terminal(Vec<f64>),
}

impl TreeNode {
    /// A player decision.
    pub fn decision(decision_index: usize, information: impl Into<String>, children: Vec<TreeNode>) -> Self {
        Self::Decision {
            decision_index,
            information: information.into(),
            children,
        }
    }

    /// A chance node.
    pub fn chance(decision_index: usize, probabilities: Vec<f64>, children: Vec<TreeNode>) -> Self {
        Self::Chance {
            decision_index,
            probabilities,
            children,
        }
    }

    /// A leaf.
    pub fn terminal(utilities: Vec<f64>) -> Self {
        Self::Terminal(utilities)
    }

    fn children(&self) -> &[TreeNode] {
        match self {
            Self::Chance { children, .. } | Self::Decision { children, .. } => children,
            Self::Terminal(_) => &[],
        }
    }
}

/// A game given by an explicit tree and its decision descriptors.
#[derive(Debug, Clone)]
pub struct TreeGame {
    num_players: usize,
    decisions: Vec<DecisionDescriptor>,
    root: TreeNode,
}

impl TreeGame {
    /// Create a game from descriptors and a tree.
    pub fn new(num_players: usize, decisions: Vec<DecisionDescriptor>, root: TreeNode) -> Self {
        Self {
            num_players,
            decisions,
            root,
        }
    }

    /// A one-player game. Descriptors are derived from the tree: every
    /// decision index gets player 0 (or the chance player) and the branching
    /// factor of the first node seen with that index.
    pub fn single_player(root: TreeNode) -> Self {
        let mut decisions: Vec<Option<DecisionDescriptor>> = Vec::new();
        collect_descriptors(&root, &mut decisions);
        let decisions = decisions
            .into_iter()
            .enumerate()
            .map(|(i, d)| d.unwrap_or_else(|| DecisionDescriptor::player(format!("unused {}", i), 0, 1)))
            .collect();
        Self::new(1, decisions, root)
    }
}

fn collect_descriptors(node: &TreeNode, decisions: &mut Vec<Option<DecisionDescriptor>>) {
    let (index, descriptor) = match node {
        TreeNode::Terminal(_) => return,
        TreeNode::Chance {
            decision_index,
            children,
            ..
        } => (
            *decision_index,
            DecisionDescriptor::chance(format!("chance {}", decision_index), 1, children.len() as u8),
        ),
        TreeNode::Decision {
            decision_index,
            children,
            ..
        } => (
            *decision_index,
            DecisionDescriptor::player(format!("decision {}", decision_index), 0, children.len() as u8),
        ),
    };
    if decisions.len() <= index {
        decisions.resize(index + 1, None);
    }
    decisions[index].get_or_insert(descriptor);
    for child in node.children() {
        collect_descriptors(child, decisions);
    }
}

impl GameDefinition for TreeGame {
    fn num_players(&self) -> usize {
        self.num_players
    }

    fn decisions(&self) -> &[DecisionDescriptor] {
        &self.decisions
    }

    fn progress(&self, actions: &[Action]) -> GameProgress {
        let mut node = &self.root;
        for &action in actions {
            match node.children().get((action as usize).wrapping_sub(1)) {
                Some(child) => node = child,
                // off the tree
                None => return GameProgress::Terminal { utilities: Vec::new() },
            }
        }
        match node {
            TreeNode::Chance {
                decision_index,
                probabilities,
                ..
            } => GameProgress::Chance {
                decision_index: *decision_index,
                probabilities: probabilities.clone(),
            },
            TreeNode::Decision {
                decision_index,
                information,
                ..
            } => GameProgress::Decision {
                decision_index: *decision_index,
                information: information.clone(),
            },
            TreeNode::Terminal(utilities) => GameProgress::Terminal {
                utilities: utilities.clone(),
            },
        }
    }

    fn name(&self) -> String {
        "tree".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfr::game::validate_game;

    #[test]
    fn test_single_player_descriptors() {
        let game = TreeGame::single_player(TreeNode::chance(
            1,
            vec![0.5, 0.5],
            vec![
                TreeNode::decision(0, "a", vec![TreeNode::terminal(vec![1.0]); 3]),
                TreeNode::decision(0, "b", vec![TreeNode::terminal(vec![2.0]); 3]),
            ],
        ));
        assert!(validate_game(&game).is_ok());
        assert_eq!(game.decisions()[0].num_actions, 3);
        assert!(game.decisions()[1].is_chance);
        assert_eq!(game.decisions()[1].player, 1);
    }

    #[test]
    fn test_progress_walks_children() {
        let game = TreeGame::single_player(TreeNode::decision(
            0,
            "root",
            vec![TreeNode::terminal(vec![1.0]), TreeNode::terminal(vec![2.0])],
        ));
        assert_eq!(
            game.progress(&[2]),
            GameProgress::Terminal { utilities: vec![2.0] }
        );
        assert!(matches!(game.progress(&[]), GameProgress::Decision { decision_index: 0, .. }));
        assert_eq!(game.progress(&[3]), GameProgress::Terminal { utilities: Vec::new() });
    }
}
