//! Registry of information-set tallies.
//!
//! Every information set visited during a solve gets exactly one
//! [`InformationSetTally`], shared by all histories of that set. The registry
//! hands out `Arc`s; the statistics themselves are updated atomically inside
//! the tally, so the registry lock is only taken to look up or create entries.

use std::sync::{Arc, RwLock};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cfr::error::SolverError;
use crate::cfr::game::{Action, PlayerIndex};
use crate::cfr::state::InformationSetTally;

/// Identity of an information set: decision plus what the actor observed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InformationSetKey {
    /// Index of the decision in the game's decision list.
    pub decision_index: usize,
    /// Observation label reported by the game.
    pub information: String,
}

impl InformationSetKey {
    /// Create a key.
    pub fn new(decision_index: usize, information: impl Into<String>) -> Self {
        Self {
            decision_index,
            information: information.into(),
        }
    }
}

#[derive(Debug, Default)]
struct Registry {
    by_key: FxHashMap<InformationSetKey, Arc<InformationSetTally>>,
    by_id: Vec<Arc<InformationSetTally>>,
}

/// Thread-safe registry of tallies.
#[derive(Debug, Default)]
pub struct TallyStore {
    registry: RwLock<Registry>,
}

impl TallyStore {
    /// Create new empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an existing tally.
    pub fn get(&self, key: &InformationSetKey) -> Option<Arc<InformationSetTally>> {
        self.registry.read().unwrap().by_key.get(key).cloned()
    }

    /// Tally with the given registry id.
    pub fn by_id(&self, id: usize) -> Option<Arc<InformationSetTally>> {
        self.registry.read().unwrap().by_id.get(id).cloned()
    }

    /// Return the tally for `key`, creating a zeroed one if needed.
    ///
    /// Creation is single-writer-wins: if two threads race, the first insert
    /// is kept and both receive it.
    pub fn get_or_create(
        &self,
        key: InformationSetKey,
        player: PlayerIndex,
        num_actions: usize,
        forced_action: Option<Action>,
    ) -> Arc<InformationSetTally> {
        if let Some(tally) = self.get(&key) {
            return tally;
        }

        let mut registry = self.registry.write().unwrap();
        let Registry { by_key, by_id } = &mut *registry;
        by_key
            .entry(key)
            .or_insert_with_key(|key| {
                let tally = Arc::new(InformationSetTally::new(
                    by_id.len(),
                    key.decision_index,
                    player,
                    key.information.clone(),
                    num_actions,
                    forced_action,
                ));
                by_id.push(Arc::clone(&tally));
                tally
            })
            .clone()
    }

    /// Get the number of information sets stored.
    pub fn num_info_sets(&self) -> usize {
        self.registry.read().unwrap().by_id.len()
    }

    /// Check if an information set exists in storage.
    pub fn contains(&self, key: &InformationSetKey) -> bool {
        self.registry.read().unwrap().by_key.contains_key(key)
    }

    /// All tallies in creation order.
    pub fn tallies(&self) -> Vec<Arc<InformationSetTally>> {
        self.registry.read().unwrap().by_id.clone()
    }

    /// Tallies of one player, ordered by decision index then information label.
    pub fn tallies_for(&self, player: PlayerIndex) -> Vec<Arc<InformationSetTally>> {
        let mut tallies: Vec<_> = self
            .registry
            .read()
            .unwrap()
            .by_id
            .iter()
            .filter(|t| t.player() == player)
            .cloned()
            .collect();
        tallies.sort_by(|a, b| {
            a.decision_index()
                .cmp(&b.decision_index())
                .then_with(|| a.information().cmp(b.information()))
        });
        tallies
    }

    /// Average strategy of an information set, if it has been visited.
    pub fn average_strategy(&self, key: &InformationSetKey) -> Option<Vec<f64>> {
        self.get(key).map(|t| t.average_strategy().to_vec())
    }

    /// Current regret-matched strategy of an information set, if it has been visited.
    pub fn current_strategy(&self, key: &InformationSetKey) -> Option<Vec<f64>> {
        self.get(key).map(|t| t.action_probabilities(0.0).to_vec())
    }

    /// Zero every statistic. Tallies themselves stay registered.
    pub fn clear(&self) {
        for tally in self.registry.read().unwrap().by_id.iter() {
            tally.clear();
        }
    }

    /// Export storage to serializable format.
    pub fn export(&self) -> TallyExport {
        let tallies = self
            .registry
            .read()
            .unwrap()
            .by_id
            .iter()
            .map(|t| TallyRecord {
                decision_index: t.decision_index(),
                player: t.player(),
                information: t.information().to_string(),
                forced_action: t.forced_action(),
                cumulative_regret: t.cumulative_regrets().to_vec(),
                cumulative_strategy: t.cumulative_strategy().to_vec(),
            })
            .collect();
        TallyExport { tallies }
    }

    /// Import storage from serialized format, creating missing tallies.
    pub fn import(&self, data: TallyExport) -> Result<(), SolverError> {
        for record in data.tallies {
            let num_actions = record.cumulative_regret.len();
            if record.cumulative_strategy.len() != num_actions {
                return Err(SolverError::InvalidGame(format!(
                    "checkpoint tally {}:{} has {} regrets but {} strategy weights",
                    record.decision_index,
                    record.information,
                    num_actions,
                    record.cumulative_strategy.len()
                )));
            }
            let key = InformationSetKey::new(record.decision_index, record.information);
            let tally = self.get_or_create(key, record.player, num_actions, record.forced_action);
            if tally.num_actions() != num_actions {
                return Err(SolverError::InvalidGame(format!(
                    "checkpoint tally {}:{} has {} actions, the game has {}",
                    tally.decision_index(),
                    tally.information(),
                    num_actions,
                    tally.num_actions()
                )));
            }
            tally.restore(&record.cumulative_regret, &record.cumulative_strategy);
        }
        Ok(())
    }
}

/// One tally in a checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TallyRecord {
    /// Decision index.
    pub decision_index: usize,
    /// Acting player.
    pub player: PlayerIndex,
    /// Observation label.
    pub information: String,
    /// Forced action override, if any.
    #[serde(default)]
    pub forced_action: Option<Action>,
    /// Cumulative regrets.
    pub cumulative_regret: Vec<f64>,
    /// Cumulative strategy weights.
    pub cumulative_strategy: Vec<f64>,
}

/// Serializable export format for storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TallyExport {
    /// Every tally, in creation order.
    pub tallies: Vec<TallyRecord>,
}

/// Snapshot of average strategies for CI calculation.
#[derive(Debug, Clone, Default)]
pub struct StrategySnapshot {
    /// Average strategies by tally id.
    pub strategies: FxHashMap<usize, Vec<f64>>,
    /// Strategy weight totals by tally id, used to tell visited sets apart.
    pub totals: FxHashMap<usize, f64>,
}

impl TallyStore {
    /// Create a snapshot of all current average strategies.
    pub fn snapshot_strategies(&self) -> StrategySnapshot {
        let mut snapshot = StrategySnapshot::default();
        for tally in self.registry.read().unwrap().by_id.iter() {
            snapshot
                .strategies
                .insert(tally.id(), tally.average_strategy().to_vec());
            snapshot
                .totals
                .insert(tally.id(), tally.cumulative_strategy().total());
        }
        snapshot
    }

    /// Convergence indicator: how much average strategies moved since `snapshot`.
    ///
    /// CI = 100 * mean over visited information sets of the L1 distance
    /// between the current and snapshot average strategies. Information sets
    /// discovered after the snapshot are compared against uniform. Lower is
    /// more converged; returns infinity when nothing can be compared.
    pub fn calculate_ci(&self, snapshot: &StrategySnapshot) -> f64 {
        let mut total_change = 0.0;
        let mut num_info_sets = 0;

        for tally in self.registry.read().unwrap().by_id.iter() {
            let current_total = tally.cumulative_strategy().total();
            let old_total = snapshot.totals.get(&tally.id()).copied().unwrap_or(0.0);
            if current_total == 0.0 && old_total == 0.0 {
                continue;
            }

            let current = tally.average_strategy();
            let change: f64 = match snapshot.strategies.get(&tally.id()) {
                Some(old) => current.iter().zip(old).map(|(n, o)| (n - o).abs()).sum(),
                None => {
                    let uniform = 1.0 / current.len() as f64;
                    current.iter().map(|p| (p - uniform).abs()).sum()
                }
            };
            total_change += change;
            num_info_sets += 1;
        }

        if num_info_sets == 0 {
            return f64::INFINITY;
        }
        100.0 * total_change / num_info_sets as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn test_get_or_create_is_idempotent() {
        let store = TallyStore::new();
        let key = InformationSetKey::new(2, "K:b");
        let a = store.get_or_create(key.clone(), 1, 2, None);
        let b = store.get_or_create(key.clone(), 1, 2, None);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(store.num_info_sets(), 1);
        assert_eq!(a.id(), 0);
        assert!(store.contains(&key));
    }

    #[test]
    fn test_concurrent_creation_single_winner() {
        let store = TallyStore::new();
        let ids: Vec<usize> = (0..64)
            .into_par_iter()
            .map(|i| {
                let key = InformationSetKey::new(0, format!("set{}", i % 4));
                store.get_or_create(key, 0, 3, None).id()
            })
            .collect();
        assert_eq!(store.num_info_sets(), 4);
        assert!(ids.iter().all(|&id| id < 4));
        let tallies = store.tallies();
        for (id, tally) in tallies.iter().enumerate() {
            assert_eq!(tally.id(), id);
        }
    }

    #[test]
    fn test_export_import_round_trip() {
        let store = TallyStore::new();
        let tally = store.get_or_create(InformationSetKey::new(1, "x"), 0, 2, None);
        tally.add_regret(1, 3.0);
        tally.add_strategy(2, 5.0);

        let json = serde_json::to_string(&store.export()).unwrap();
        let restored = TallyStore::new();
        restored.import(serde_json::from_str(&json).unwrap()).unwrap();

        let key = InformationSetKey::new(1, "x");
        assert_eq!(restored.current_strategy(&key).unwrap(), vec![1.0, 0.0]);
        assert_eq!(restored.average_strategy(&key).unwrap(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_import_rejects_mismatched_lengths() {
        let store = TallyStore::new();
        let export = TallyExport {
            tallies: vec![TallyRecord {
                decision_index: 0,
                player: 0,
                information: String::new(),
                forced_action: None,
                cumulative_regret: vec![0.0, 1.0],
                cumulative_strategy: vec![0.0],
            }],
        };
        assert!(store.import(export).is_err());
    }

    #[test]
    fn test_convergence_indicator() {
        let store = TallyStore::new();
        let tally = store.get_or_create(InformationSetKey::new(0, ""), 0, 2, None);
        assert_eq!(store.calculate_ci(&store.snapshot_strategies()), f64::INFINITY);

        tally.add_strategy(1, 1.0);
        let snapshot = store.snapshot_strategies();
        assert_eq!(store.calculate_ci(&snapshot), 0.0);

        tally.add_strategy(2, 1.0);
        // average moved from [1, 0] to [0.5, 0.5]
        assert!((store.calculate_ci(&snapshot) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_tallies_for_player_sorted() {
        let store = TallyStore::new();
        store.get_or_create(InformationSetKey::new(3, "b"), 0, 2, None);
        store.get_or_create(InformationSetKey::new(1, "z"), 0, 2, None);
        store.get_or_create(InformationSetKey::new(3, "a"), 0, 2, None);
        store.get_or_create(InformationSetKey::new(2, "q"), 1, 2, None);
        let labels: Vec<String> = store
            .tallies_for(0)
            .iter()
            .map(|t| format!("{}{}", t.decision_index(), t.information()))
            .collect();
        assert_eq!(labels, vec!["1z", "3a", "3b"]);
    }
}
