//! History points and the navigator that resolves them to game states.
//!
//! A [`HistoryPoint`] names a node of the game tree by the actions leading to
//! it. The [`HistoryNavigator`] turns a history point into a [`GameState`],
//! replaying the game on a cache miss and remembering every node it builds.
//! Nothing is enumerated up front unless [`HistoryNavigator::populate_all`]
//! is called.

use std::sync::{Arc, RwLock};

use rustc_hash::FxHashMap;

use crate::cfr::error::SolverError;
use crate::cfr::game::{validate_game, Action, GameDefinition, GameProgress, PlayerIndex};
use crate::cfr::state::{ChanceNode, GameState, InformationSetTally, TerminalUtilities};
use crate::cfr::storage::{InformationSetKey, TallyStore};

/// Tolerance for chance distributions summing to one.
const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Immutable position in the game tree: the action sequence from the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct HistoryPoint {
    actions: Vec<Action>,
}

impl HistoryPoint {
    /// The root of the tree.
    pub fn root() -> Self {
        Self::default()
    }

    /// A point reached by `actions` from the root.
    pub fn from_actions(actions: impl Into<Vec<Action>>) -> Self {
        Self {
            actions: actions.into(),
        }
    }

    /// Actions from the root.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Number of actions from the root.
    pub fn depth(&self) -> usize {
        self.actions.len()
    }

    /// The child reached by taking `action` here.
    pub fn branch(&self, action: Action) -> Self {
        let mut actions = Vec::with_capacity(self.actions.len() + 1);
        actions.extend_from_slice(&self.actions);
        actions.push(action);
        Self { actions }
    }
}

/// Resolves history points to game states, caching the tree as it is discovered.
///
/// The cache and the tally registry are both safe to populate from several
/// threads: when two threads build the same node, the first insert wins and
/// the duplicate replay is discarded.
pub struct HistoryNavigator<G: GameDefinition> {
    game: G,
    store: TallyStore,
    nodes: RwLock<FxHashMap<Vec<Action>, GameState>>,
}

impl<G: GameDefinition> HistoryNavigator<G> {
    /// Create a navigator after validating the game's decision descriptors.
    pub fn new(game: G) -> Result<Self, SolverError> {
        validate_game(&game)?;
        Ok(Self {
            game,
            store: TallyStore::new(),
            nodes: RwLock::new(FxHashMap::default()),
        })
    }

    /// The game being navigated.
    pub fn game(&self) -> &G {
        &self.game
    }

    /// Tally registry.
    pub fn store(&self) -> &TallyStore {
        &self.store
    }

    /// Number of non-chance players.
    pub fn num_players(&self) -> usize {
        self.game.num_players()
    }

    /// Non-chance player indices.
    pub fn players(&self) -> impl Iterator<Item = PlayerIndex> {
        0..self.game.num_players() as PlayerIndex
    }

    /// Number of cached tree nodes.
    pub fn cached_nodes(&self) -> usize {
        self.nodes.read().unwrap().len()
    }

    /// Resolve `point`, replaying the game and caching every missing node
    /// along its path.
    pub fn resolve(&self, point: &HistoryPoint) -> Result<GameState, SolverError> {
        let actions = point.actions();
        let first_missing = {
            let nodes = self.nodes.read().unwrap();
            if let Some(state) = nodes.get(actions) {
                return Ok(state.clone());
            }
            let mut depth = actions.len();
            while depth > 0 && !nodes.contains_key(&actions[..depth - 1]) {
                depth -= 1;
            }
            depth
        };

        let mut resolved = None;
        for depth in first_missing..=actions.len() {
            let prefix = &actions[..depth];
            let built = self.build(prefix, true)?;
            let mut nodes = self.nodes.write().unwrap();
            let state = nodes.entry(prefix.to_vec()).or_insert(built).clone();
            resolved = Some(state);
        }
        resolved.ok_or_else(|| SolverError::InvalidGame("empty resolution path".to_string()))
    }

    /// Resolve `point` without adding anything to the cache or the registry.
    ///
    /// Registered tallies are reused; information sets never seen before get
    /// a transient zero tally, which reads as the uniform strategy.
    pub fn resolve_detached(&self, point: &HistoryPoint) -> Result<GameState, SolverError> {
        if let Some(state) = self.nodes.read().unwrap().get(point.actions()) {
            return Ok(state.clone());
        }
        self.build(point.actions(), false)
    }

    /// Enumerate and cache the whole tree. Fails once more than `limit`
    /// nodes would be created. Returns the number of nodes in the tree.
    pub fn populate_all(&self, limit: usize) -> Result<usize, SolverError> {
        let mut count = 0usize;
        let mut pending = vec![HistoryPoint::root()];
        while let Some(point) = pending.pop() {
            count += 1;
            if count > limit {
                return Err(SolverError::EnumerationLimit {
                    what: "eager tree population".to_string(),
                    count: count as u64,
                    limit: limit as u64,
                });
            }
            let num_actions = match self.resolve(&point)? {
                GameState::Terminal(_) => 0,
                GameState::Chance(chance) => chance.num_actions(),
                GameState::Decision(tally) => tally.num_actions(),
            };
            for action in (1..=num_actions as Action).rev() {
                pending.push(point.branch(action));
            }
        }
        log::debug!("populated {} tree nodes for {}", count, self.game.name());
        Ok(count)
    }

    /// Drop every cached node. Tallies are kept.
    pub fn clear_cache(&self) {
        self.nodes.write().unwrap().clear();
    }

    fn build(&self, actions: &[Action], register: bool) -> Result<GameState, SolverError> {
        let decisions = self.game.decisions();
        match self.game.progress(actions) {
            GameProgress::Terminal { utilities } => {
                if utilities.len() != self.game.num_players() {
                    return Err(SolverError::InvalidGame(format!(
                        "terminal {:?} has {} utilities for {} players",
                        actions,
                        utilities.len(),
                        self.game.num_players()
                    )));
                }
                if utilities.iter().any(|u| !u.is_finite()) {
                    return Err(SolverError::InvalidGame(format!(
                        "terminal {:?} has non-finite utilities {:?}",
                        actions, utilities
                    )));
                }
                Ok(GameState::Terminal(Arc::new(TerminalUtilities { utilities })))
            }

            GameProgress::Chance {
                decision_index,
                probabilities,
            } => {
                let descriptor = decisions.get(decision_index).ok_or_else(|| {
                    SolverError::InvalidGame(format!("unknown decision index {}", decision_index))
                })?;
                if !descriptor.is_chance || probabilities.len() != descriptor.num_actions as usize {
                    return Err(SolverError::InvalidGame(format!(
                        "chance node at {:?} does not match decision {} ({})",
                        actions, decision_index, descriptor.name
                    )));
                }
                let total: f64 = probabilities.iter().sum();
                if probabilities.iter().any(|&p| p < 0.0 || !p.is_finite())
                    || (total - 1.0).abs() > PROBABILITY_TOLERANCE
                {
                    return Err(SolverError::InvalidGame(format!(
                        "chance probabilities {:?} at {:?} are not a distribution",
                        probabilities, actions
                    )));
                }
                let node = match descriptor.always_do_action {
                    Some(forced) => {
                        let mut one_hot = vec![0.0; probabilities.len()];
                        one_hot[forced as usize - 1] = 1.0;
                        ChanceNode::new(decision_index, &one_hot)
                    }
                    None => ChanceNode::new(decision_index, &probabilities),
                };
                Ok(GameState::Chance(Arc::new(node)))
            }

            GameProgress::Decision {
                decision_index,
                information,
            } => {
                let descriptor = decisions.get(decision_index).ok_or_else(|| {
                    SolverError::InvalidGame(format!("unknown decision index {}", decision_index))
                })?;
                if descriptor.is_chance {
                    return Err(SolverError::InvalidGame(format!(
                        "player decision at {:?} refers to chance decision {} ({})",
                        actions, decision_index, descriptor.name
                    )));
                }
                let key = InformationSetKey::new(decision_index, information);
                let num_actions = descriptor.num_actions as usize;
                let tally = if register {
                    self.store.get_or_create(
                        key,
                        descriptor.player,
                        num_actions,
                        descriptor.always_do_action,
                    )
                } else {
                    match self.store.get(&key) {
                        Some(tally) => tally,
                        None => Arc::new(InformationSetTally::new(
                            usize::MAX,
                            decision_index,
                            descriptor.player,
                            key.information,
                            num_actions,
                            descriptor.always_do_action,
                        )),
                    }
                };
                Ok(GameState::Decision(tally))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::kuhn::KuhnPoker;
    use crate::games::tree::{TreeGame, TreeNode};

    fn two_level_game() -> TreeGame {
        TreeGame::single_player(TreeNode::decision(
            0,
            "root",
            vec![
                TreeNode::decision(1, "left", vec![TreeNode::terminal(vec![1.0]), TreeNode::terminal(vec![5.0])]),
                TreeNode::decision(2, "right", vec![TreeNode::terminal(vec![3.0]), TreeNode::terminal(vec![2.0])]),
            ],
        ))
    }

    #[test]
    fn test_branching_is_pure() {
        let root = HistoryPoint::root();
        let a = root.branch(2);
        let b = root.branch(2);
        assert_eq!(a, b);
        assert_eq!(root.depth(), 0);
        assert_eq!(a.branch(1).actions(), &[2, 1]);
    }

    #[test]
    fn test_lazy_resolution_populates_path() {
        let navigator = HistoryNavigator::new(two_level_game()).unwrap();
        let leaf = HistoryPoint::from_actions(vec![1, 2]);
        match navigator.resolve(&leaf).unwrap() {
            GameState::Terminal(t) => assert_eq!(t.utilities, vec![5.0]),
            other => panic!("expected terminal, got {:?}", other),
        }
        // root, the left decision and the leaf
        assert_eq!(navigator.cached_nodes(), 3);
        assert_eq!(navigator.store().num_info_sets(), 2);
    }

    #[test]
    fn test_equal_paths_resolve_to_same_tally() {
        let navigator = HistoryNavigator::new(KuhnPoker::new()).unwrap();
        // deal 1 and deal 2 both give player 0 the jack
        let a = navigator.resolve(&HistoryPoint::from_actions(vec![1])).unwrap();
        let b = navigator.resolve(&HistoryPoint::from_actions(vec![2])).unwrap();
        match (a, b) {
            (GameState::Decision(x), GameState::Decision(y)) => assert!(Arc::ptr_eq(&x, &y)),
            _ => panic!("expected decisions"),
        }
    }

    #[test]
    fn test_detached_resolution_leaves_cache_untouched() {
        let navigator = HistoryNavigator::new(two_level_game()).unwrap();
        let state = navigator
            .resolve_detached(&HistoryPoint::from_actions(vec![2]))
            .unwrap();
        assert!(matches!(state, GameState::Decision(_)));
        assert_eq!(navigator.cached_nodes(), 0);
        assert_eq!(navigator.store().num_info_sets(), 0);
    }

    #[test]
    fn test_populate_all_and_limit() {
        let navigator = HistoryNavigator::new(two_level_game()).unwrap();
        assert_eq!(navigator.populate_all(100).unwrap(), 7);
        assert_eq!(navigator.cached_nodes(), 7);

        let capped = HistoryNavigator::new(KuhnPoker::new()).unwrap();
        assert!(matches!(
            capped.populate_all(10),
            Err(SolverError::EnumerationLimit { .. })
        ));
    }

    #[test]
    fn test_kuhn_tree_size() {
        let navigator = HistoryNavigator::new(KuhnPoker::new()).unwrap();
        // 1 deal + 6 * (1 root + 2 + 2 + ... ) = 1 + 6 * 9 nodes
        assert_eq!(navigator.populate_all(1_000).unwrap(), 55);
        assert_eq!(navigator.store().num_info_sets(), 12);
    }
}
