//! Iteration driver.
//!
//! [`Solver`] owns the history navigator (and with it every tally), the
//! configuration and the iteration counter. [`Solver::develop_strategies`]
//! dispatches to one solving algorithm and runs its configured number of
//! iterations in reporting windows; at the end of every window it measures
//! utilities, pushes play-outs through the reporting pipeline and optionally
//! measures exploitability.
//!
//! Mutating iterations and read-only analysis never overlap: both need the
//! solver, and iterations take it mutably.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cfr::algorithm::CfrAlgorithm;
use crate::cfr::best_response::{self, BestResponse, Exploitability};
use crate::cfr::config::{Algorithm, SolveStats, SolverConfig};
use crate::cfr::error::SolverError;
use crate::cfr::evaluation;
use crate::cfr::game::{GameDefinition, PlayerIndex};
use crate::cfr::history::HistoryNavigator;
use crate::cfr::probing::{ProbingCfr, ProbingVariant};
use crate::cfr::pure_strategy::{self, PureStrategyEquilibria};
use crate::cfr::random::DeterministicStream;
use crate::cfr::reporting::{PlayoutSink, ReportingPipeline, UtilityReport};
use crate::cfr::sampling::AverageStrategySampling;
use crate::cfr::storage::{InformationSetKey, StrategySnapshot, TallyExport};
use crate::cfr::vanilla::VanillaCfr;

/// The CFR solver.
///
/// # Example
/// ```
/// use cfr_core::cfr::{Algorithm, Solver, SolverConfig};
/// use cfr_core::games::kuhn::KuhnPoker;
///
/// let config = SolverConfig::default()
///     .with_iterations(Algorithm::Vanilla, 200)
///     .with_seed(42);
/// let mut solver = Solver::new(KuhnPoker::new(), config).unwrap();
/// let stats = solver.develop_strategies(Algorithm::Vanilla).unwrap();
/// assert_eq!(stats.iterations, 200);
/// ```
pub struct Solver<G: GameDefinition> {
    navigator: HistoryNavigator<G>,
    config: SolverConfig,
    seed: u64,
    iteration: u64,
    stats: SolveStats,
    snapshot: Option<StrategySnapshot>,
    playout_sink: Option<Arc<dyn PlayoutSink>>,
}

impl<G: GameDefinition> Solver<G> {
    /// Create a solver after validating the configuration and the game.
    pub fn new(game: G, config: SolverConfig) -> Result<Self, SolverError> {
        config.validate()?;
        let navigator = HistoryNavigator::new(game)?;
        if config.eager_tree {
            let nodes = navigator.populate_all(config.max_tree_nodes)?;
            log::info!("eagerly populated {} tree nodes", nodes);
        }
        let seed = config.seed.unwrap_or_else(rand::random);

        Ok(Self {
            navigator,
            config,
            seed,
            iteration: 0,
            stats: SolveStats::new(),
            snapshot: None,
            playout_sink: None,
        })
    }

    /// Hand every play-out produced at report time to `sink` as well.
    pub fn with_playout_sink(mut self, sink: Arc<dyn PlayoutSink>) -> Self {
        self.playout_sink = Some(sink);
        self
    }

    /// Run the configured number of iterations of `algorithm`.
    pub fn develop_strategies(&mut self, algorithm: Algorithm) -> Result<&SolveStats, SolverError> {
        self.develop_strategies_with_callback(algorithm, |_| {})
    }

    /// Like [`Solver::develop_strategies`], calling `callback` with every report.
    pub fn develop_strategies_with_callback<F>(
        &mut self,
        algorithm: Algorithm,
        mut callback: F,
    ) -> Result<&SolveStats, SolverError>
    where
        F: FnMut(&UtilityReport),
    {
        self.config.validate_for(algorithm)?;
        let total = self.config.iterations_for(algorithm);
        let runner = self.runner(algorithm, self.iteration, total);
        let interval = match self.config.reporting_interval {
            0 => total,
            n => n.min(total),
        };

        log::info!(
            "developing strategies for {} with {} ({} iterations, reports every {})",
            self.navigator.game().name(),
            runner.name(),
            total,
            interval
        );

        let progress = if self.config.show_progress {
            let bar = ProgressBar::new(total);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}) {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            bar
        } else {
            ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::hidden())
        };

        let start = Instant::now();
        let mut done = 0;
        while done < total {
            let window = interval.min(total - done);
            self.run_window(runner.as_ref(), window)?;
            done += window;
            progress.inc(window);

            let report = self.report(runner.name())?;
            progress.set_message(format!("{:?}", report.average_strategy_utilities));
            log::info!(
                "iteration {}: utilities {:?}, exploitability {:?}, ci {:?}",
                report.iteration,
                report.average_strategy_utilities,
                report.exploitability,
                report.convergence_indicator
            );
            callback(&report);
            self.stats.record_report(report);
        }
        progress.finish_and_clear();

        self.stats.algorithm = Some(algorithm);
        self.stats.iterations = self.iteration;
        self.stats.info_sets = self.navigator.store().num_info_sets();
        self.stats.elapsed_seconds += start.elapsed().as_secs_f64();
        self.stats.update_rate();
        log::info!(
            "finished {} iterations in {:.2}s ({} information sets)",
            total,
            start.elapsed().as_secs_f64(),
            self.stats.info_sets
        );
        Ok(&self.stats)
    }

    /// Run one iteration of `algorithm`, optimizing every player once.
    ///
    /// Exploration and increment weights follow the configured schedule of
    /// `algorithm` counted from the solver's first iteration, so repeated
    /// calls step through it the way one [`Solver::develop_strategies`] run
    /// from a fresh solver would.
    pub fn run_iteration(&mut self, algorithm: Algorithm) -> Result<(), SolverError> {
        let runner = self.runner(algorithm, 0, self.config.iterations_for(algorithm).max(1));
        self.run_window(runner.as_ref(), 1)
    }

    /// Algorithm instance whose schedules count `total` iterations after `offset`.
    fn runner(&self, algorithm: Algorithm, offset: u64, total: u64) -> Box<dyn CfrAlgorithm<G>> {
        match ProbingVariant::for_algorithm(algorithm) {
            Some(variant) => Box::new(ProbingCfr::new(variant, &self.config, self.seed, offset, total)),
            None => match algorithm {
                Algorithm::AverageStrategySampling => {
                    Box::new(AverageStrategySampling::new(&self.config, self.seed))
                }
                _ => Box::new(VanillaCfr::new(&self.config)),
            },
        }
    }

    fn run_window(&mut self, runner: &dyn CfrAlgorithm<G>, window: u64) -> Result<(), SolverError> {
        let first = self.iteration + 1;
        let last = self.iteration + window;
        let navigator = &self.navigator;
        let iterate = |iteration: u64| -> Result<(), SolverError> {
            for player in navigator.players() {
                runner.iterate(navigator, iteration, player)?;
            }
            Ok(())
        };

        if self.config.parallel && runner.parallel_iterations() {
            (first..last + 1).into_par_iter().try_for_each(iterate)?;
        } else {
            (first..last + 1).try_for_each(iterate)?;
        }
        self.iteration = last;
        Ok(())
    }

    fn report(&mut self, algorithm: &str) -> Result<UtilityReport, SolverError> {
        let navigator = &self.navigator;
        let utilities = evaluation::average_strategy_utilities(navigator)?;

        let pipeline = ReportingPipeline::with_sink(
            navigator.num_players(),
            self.config.report_queue_capacity,
            self.config.report_consumers,
            self.playout_sink.clone(),
        );
        let produced = if self.config.report_playouts == 0 {
            let sender = pipeline.sender();
            evaluation::for_each_weighted_playout(navigator, |playout| sender.send(playout))
        } else {
            let stream = DeterministicStream::new(self.seed, self.iteration, navigator.num_players() as PlayerIndex);
            (0..self.config.report_playouts as u64)
                .into_par_iter()
                .try_for_each_with(pipeline.sender(), |sender, index| {
                    sender.send(evaluation::sample_playout(navigator, &stream, index)?)
                })
        };
        let statistics = pipeline.finish()?;
        produced?;

        let exploitability = if self.config.measure_exploitability {
            let values = navigator
                .players()
                .map(|player| best_response::exploitability(navigator, player).map(|e| e.value()))
                .collect::<Result<Vec<f64>, SolverError>>()?;
            Some(values)
        } else {
            None
        };

        let store = navigator.store();
        let convergence_indicator = self.snapshot.as_ref().map(|s| store.calculate_ci(s));
        self.snapshot = Some(store.snapshot_strategies());

        Ok(UtilityReport {
            iteration: self.iteration,
            algorithm: algorithm.to_string(),
            average_strategy_utilities: utilities,
            playout_means: statistics.means(),
            playouts: statistics.count,
            exploitability,
            convergence_indicator,
        })
    }

    /// Best response of `player` against the current average strategies.
    pub fn best_response(&self, player: PlayerIndex) -> Result<BestResponse, SolverError> {
        best_response::best_response(&self.navigator, player)
    }

    /// Exploitability of `player` under exhaustive evaluation.
    pub fn exploitability(&self, player: PlayerIndex) -> Result<Exploitability, SolverError> {
        best_response::exploitability(&self.navigator, player)
    }

    /// Exploitability of `player` against a sampled utility estimate.
    pub fn sampled_exploitability(&self, player: PlayerIndex, samples: u64) -> Result<Exploitability, SolverError> {
        let stream = DeterministicStream::new(self.seed, self.iteration, player);
        best_response::sampled_exploitability(&self.navigator, player, &stream, samples)
    }

    /// Pure-strategy equilibria (two-player games only).
    pub fn find_pure_strategy_equilibria(&self) -> Result<PureStrategyEquilibria, SolverError> {
        pure_strategy::find_pure_strategy_equilibria(&self.navigator, &self.config)
    }

    /// Expected utility of every player under the average strategies.
    pub fn average_strategy_utilities(&self) -> Result<Vec<f64>, SolverError> {
        evaluation::average_strategy_utilities(&self.navigator)
    }

    /// Average strategy of one information set, if it has been visited.
    pub fn average_strategy(&self, decision_index: usize, information: &str) -> Option<Vec<f64>> {
        self.navigator
            .store()
            .average_strategy(&InformationSetKey::new(decision_index, information))
    }

    /// Current regret-matched strategy of one information set, if visited.
    pub fn current_strategy(&self, decision_index: usize, information: &str) -> Option<Vec<f64>> {
        self.navigator
            .store()
            .current_strategy(&InformationSetKey::new(decision_index, information))
    }

    /// Iterations completed.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Number of information sets discovered.
    pub fn num_info_sets(&self) -> usize {
        self.navigator.store().num_info_sets()
    }

    /// Seed of the deterministic random streams.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Statistics of the solves so far.
    pub fn stats(&self) -> &SolveStats {
        &self.stats
    }

    /// The configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// The history navigator, for direct tree and tally access.
    pub fn navigator(&self) -> &HistoryNavigator<G> {
        &self.navigator
    }

    /// The game being solved.
    pub fn game(&self) -> &G {
        self.navigator.game()
    }

    /// Export solver state for checkpointing.
    pub fn export_state(&self) -> SolverState {
        SolverState {
            iteration: self.iteration,
            seed: self.seed,
            tallies: self.navigator.store().export(),
            stats: self.stats.clone(),
        }
    }

    /// Import solver state from a checkpoint.
    pub fn import_state(&mut self, state: SolverState) -> Result<(), SolverError> {
        self.navigator.store().import(state.tallies)?;
        self.iteration = state.iteration;
        self.seed = state.seed;
        self.stats = state.stats;
        self.snapshot = None;
        Ok(())
    }

    /// Write a checkpoint as JSON.
    pub fn save_checkpoint<P: AsRef<Path>>(&self, path: P) -> Result<(), SolverError> {
        let writer = BufWriter::new(File::create(path.as_ref())?);
        serde_json::to_writer(writer, &self.export_state())?;
        log::info!("saved checkpoint at iteration {} to {}", self.iteration, path.as_ref().display());
        Ok(())
    }

    /// Restore a checkpoint written by [`Solver::save_checkpoint`].
    pub fn load_checkpoint<P: AsRef<Path>>(&mut self, path: P) -> Result<(), SolverError> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let state: SolverState = serde_json::from_reader(reader)?;
        self.import_state(state)
    }

    /// Zero every tally and the iteration counter.
    pub fn reset(&mut self) {
        self.navigator.store().clear();
        self.iteration = 0;
        self.stats = SolveStats::new();
        self.snapshot = None;
    }
}

/// Serializable solver state for checkpointing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverState {
    /// Iterations completed.
    pub iteration: u64,
    /// Seed of the random streams.
    pub seed: u64,
    /// Every tally.
    pub tallies: TallyExport,
    /// Statistics.
    pub stats: SolveStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::cfr::config::ConfigError;
    use crate::cfr::history::HistoryPoint;
    use crate::cfr::reporting::CompletedPlayout;
    use crate::cfr::state::GameState;
    use crate::games::kuhn::KuhnPoker;
    use crate::games::matching_pennies::MatchingPennies;
    use crate::games::matrix::MatrixGame;
    use crate::games::settlement::SettlementGame;
    use crate::games::tree::{TreeGame, TreeNode};

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn tally_bits<G: GameDefinition>(solver: &Solver<G>) -> Vec<(usize, String, Vec<u64>, Vec<u64>)> {
        let mut tallies: Vec<_> = solver
            .navigator()
            .store()
            .tallies()
            .iter()
            .map(|t| {
                (
                    t.decision_index(),
                    t.information().to_string(),
                    t.cumulative_regrets().iter().map(|v| v.to_bits()).collect(),
                    t.cumulative_strategy().iter().map(|v| v.to_bits()).collect(),
                )
            })
            .collect();
        tallies.sort();
        tallies
    }

    #[test]
    fn test_matching_pennies_vanilla_scenario() {
        init_logging();
        let config = SolverConfig::default()
            .with_iterations(Algorithm::Vanilla, 10_000)
            .with_reporting_interval(2_500)
            .with_seed(1);
        let mut solver = Solver::new(MatchingPennies::new(), config).unwrap();
        let stats = solver.develop_strategies(Algorithm::Vanilla).unwrap();
        assert_eq!(stats.iterations, 10_000);
        assert_eq!(stats.reports.len(), 4);
        let utilities = solver.average_strategy_utilities().unwrap();
        assert!(utilities[0].abs() < 0.01);
    }

    #[test]
    fn test_single_player_tree_best_response_scenario() {
        let game = TreeGame::single_player(TreeNode::decision(
            0,
            "root",
            vec![
                TreeNode::decision(1, "left", vec![TreeNode::terminal(vec![1.0]), TreeNode::terminal(vec![5.0])]),
                TreeNode::decision(2, "right", vec![TreeNode::terminal(vec![3.0]), TreeNode::terminal(vec![2.0])]),
            ],
        ));
        let solver = Solver::new(game, SolverConfig::default().with_seed(0)).unwrap();
        assert_eq!(solver.best_response(0).unwrap().utility, 5.0);
    }

    #[test]
    fn test_prisoners_dilemma_scenario() {
        let solver = Solver::new(MatrixGame::prisoners_dilemma(), SolverConfig::default().with_seed(0)).unwrap();
        let result = solver.find_pure_strategy_equilibria().unwrap();
        assert_eq!(result.equilibria.len(), 1);
        assert_eq!(result.equilibria[0].utilities, [-2.0, -2.0]);
    }

    #[test]
    fn test_every_algorithm_runs_on_kuhn() {
        init_logging();
        for algorithm in Algorithm::ALL {
            let config = SolverConfig::fast()
                .with_iterations(algorithm, 300)
                .with_reporting_interval(100)
                .with_report_playouts(50)
                .with_seed(9);
            let mut solver = Solver::new(KuhnPoker::new(), config).unwrap();
            let mut reports = 0;
            let stats = solver
                .develop_strategies_with_callback(algorithm, |_| reports += 1)
                .unwrap();
            assert_eq!(stats.iterations, 300, "{}", algorithm.name());
            assert_eq!(stats.info_sets, 12, "{}", algorithm.name());
            assert_eq!(reports, 3);
            let last = stats.reports.last().unwrap();
            assert_eq!(last.playouts, 50);
            assert!(last.exploitability.as_ref().unwrap().iter().all(|&e| e >= -1e-9));
            assert!(last.convergence_indicator.is_some());
        }
    }

    #[test]
    fn test_terminal_utilities_do_not_depend_on_algorithm() {
        let path = HistoryPoint::from_actions(vec![2, 1, 2]);
        let mut seen = Vec::new();
        for algorithm in [Algorithm::Vanilla, Algorithm::GibsonProbing, Algorithm::AverageStrategySampling] {
            let config = SolverConfig::fast()
                .with_iterations(algorithm, 50)
                .with_exploitability(false)
                .with_seed(4);
            let mut solver = Solver::new(SettlementGame::new(), config).unwrap();
            solver.develop_strategies(algorithm).unwrap();
            match solver.navigator().resolve(&path).unwrap() {
                GameState::Terminal(t) => seen.push(t.utilities.clone()),
                _ => panic!("expected terminal"),
            }
        }
        assert!(seen.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_sequential_sampling_is_deterministic() {
        for algorithm in [Algorithm::Probing, Algorithm::AbramowiczProbing, Algorithm::AverageStrategySampling] {
            let run = || {
                let config = SolverConfig::fast()
                    .with_iterations(algorithm, 500)
                    .with_exploitability(false)
                    .with_seed(77);
                let mut solver = Solver::new(KuhnPoker::new(), config).unwrap();
                solver.develop_strategies(algorithm).unwrap();
                tally_bits(&solver)
            };
            assert_eq!(run(), run(), "{}", algorithm.name());
        }
    }

    #[test]
    fn test_parallel_sampling_converges() {
        let config = SolverConfig::fast()
            .with_iterations(Algorithm::AverageStrategySampling, 20_000)
            .with_reporting_interval(5_000)
            .with_parallel(true)
            .with_seed(3);
        let mut solver = Solver::new(KuhnPoker::new(), config).unwrap();
        solver.develop_strategies(Algorithm::AverageStrategySampling).unwrap();
        let utilities = solver.average_strategy_utilities().unwrap();
        assert!((utilities[0] + 1.0 / 18.0).abs() < 0.05, "got {}", utilities[0]);
    }

    #[test]
    fn test_exhaustive_report_playouts() {
        let config = SolverConfig::fast()
            .with_iterations(Algorithm::Vanilla, 10)
            .with_report_playouts(0)
            .with_seed(2);
        let mut solver = Solver::new(KuhnPoker::new(), config).unwrap();
        let stats = solver.develop_strategies(Algorithm::Vanilla).unwrap();
        let report = stats.reports.last().unwrap();
        // weighted play-out means equal the exhaustive utilities
        for (a, b) in report.playout_means.iter().zip(&report.average_strategy_utilities) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_playout_sink_receives_report_playouts() {
        let config = SolverConfig::fast()
            .with_iterations(Algorithm::Vanilla, 30)
            .with_reporting_interval(10)
            .with_report_playouts(40)
            .with_exploitability(false)
            .with_seed(6);
        let weights = Arc::new(Mutex::new(Vec::new()));
        let collected = Arc::clone(&weights);
        let mut solver = Solver::new(KuhnPoker::new(), config)
            .unwrap()
            .with_playout_sink(Arc::new(move |p: &CompletedPlayout| {
                assert_eq!(p.utilities.len(), 2);
                collected.lock().unwrap().push(p.weight);
            }));
        solver.develop_strategies(Algorithm::Vanilla).unwrap();

        let weights = weights.lock().unwrap();
        assert_eq!(weights.len(), 3 * 40);
        assert!(weights.iter().all(|&w| w == 1.0));
    }

    #[test]
    fn test_playout_sink_sees_exhaustive_weights() {
        let config = SolverConfig::fast()
            .with_iterations(Algorithm::Vanilla, 5)
            .with_report_playouts(0)
            .with_exploitability(false)
            .with_seed(6);
        let weights = Arc::new(Mutex::new(Vec::new()));
        let collected = Arc::clone(&weights);
        let mut solver = Solver::new(KuhnPoker::new(), config)
            .unwrap()
            .with_playout_sink(Arc::new(move |p: &CompletedPlayout| collected.lock().unwrap().push(p.weight)));
        let stats = solver.develop_strategies(Algorithm::Vanilla).unwrap();
        let playouts = stats.reports.last().unwrap().playouts;

        let weights = weights.lock().unwrap();
        assert_eq!(weights.len() as u64, playouts);
        let total: f64 = weights.iter().sum();
        assert!((total - 1.0).abs() < 1e-9, "weights sum to {}", total);
    }

    #[test]
    fn test_repeated_single_iterations_follow_schedule() {
        let config = SolverConfig::fast()
            .with_iterations(Algorithm::ExplorativeProbing, 10)
            .with_exploitability(false)
            .with_seed(12);
        let mut solver = Solver::new(KuhnPoker::new(), config.clone()).unwrap();
        for _ in 0..3 {
            solver.run_iteration(Algorithm::ExplorativeProbing).unwrap();
        }
        assert_eq!(solver.iteration(), 3);

        // Same three iterations driven directly with the schedule counted from 1.
        let reference = Solver::new(KuhnPoker::new(), config.clone()).unwrap();
        let runner = ProbingCfr::new(ProbingVariant::EXPLORATIVE, &config, reference.seed(), 0, 10);
        for iteration in 1..=3 {
            for player in reference.navigator().players() {
                CfrAlgorithm::iterate(&runner, reference.navigator(), iteration, player).unwrap();
            }
        }
        assert_eq!(tally_bits(&solver), tally_bits(&reference));

        // A runner whose schedule restarts at every call diverges.
        let restarted = Solver::new(KuhnPoker::new(), config.clone()).unwrap();
        for iteration in 1..=3 {
            let runner = ProbingCfr::new(ProbingVariant::EXPLORATIVE, &config, restarted.seed(), iteration - 1, 10);
            for player in restarted.navigator().players() {
                CfrAlgorithm::iterate(&runner, restarted.navigator(), iteration, player).unwrap();
            }
        }
        assert_ne!(tally_bits(&solver), tally_bits(&restarted));
    }

    #[test]
    fn test_eager_tree_and_cap() {
        let config = SolverConfig::default().with_eager_tree(true).with_seed(0);
        let solver = Solver::new(KuhnPoker::new(), config).unwrap();
        assert_eq!(solver.num_info_sets(), 12);

        let capped = SolverConfig {
            max_tree_nodes: 20,
            ..SolverConfig::default().with_eager_tree(true)
        };
        assert!(matches!(
            Solver::new(KuhnPoker::new(), capped),
            Err(SolverError::EnumerationLimit { .. })
        ));
    }

    #[test]
    fn test_config_errors_abort_before_solving() {
        let config = SolverConfig::default().with_epsilon(0.1, 0.2);
        assert!(matches!(
            Solver::new(KuhnPoker::new(), config),
            Err(SolverError::Config(ConfigError::IncreasingSchedule { .. }))
        ));

        let config = SolverConfig::default().with_iterations(Algorithm::Probing, 0);
        let mut solver = Solver::new(KuhnPoker::new(), config).unwrap();
        let err = solver.develop_strategies(Algorithm::Probing).unwrap_err();
        assert!(err.to_string().contains("probing"));
        assert_eq!(solver.iteration(), 0);
    }

    #[test]
    fn test_pure_strategies_reject_three_players() {
        let game = TreeGame::new(
            3,
            vec![crate::cfr::game::DecisionDescriptor::player("only", 0, 1)],
            TreeNode::decision(0, "", vec![TreeNode::terminal(vec![0.0, 0.0, 0.0])]),
        );
        let solver = Solver::new(game, SolverConfig::default().with_seed(0)).unwrap();
        assert!(matches!(
            solver.find_pure_strategy_equilibria(),
            Err(SolverError::Config(ConfigError::PlayerCount { actual: 3, .. }))
        ));
    }

    #[test]
    fn test_checkpoint_round_trip() {
        let config = SolverConfig::fast()
            .with_iterations(Algorithm::Vanilla, 100)
            .with_exploitability(false)
            .with_seed(5);
        let mut solver = Solver::new(KuhnPoker::new(), config.clone()).unwrap();
        solver.develop_strategies(Algorithm::Vanilla).unwrap();

        let path = std::env::temp_dir().join(format!("cfr-core-checkpoint-{}.json", std::process::id()));
        solver.save_checkpoint(&path).unwrap();

        let mut restored = Solver::new(KuhnPoker::new(), config).unwrap();
        restored.load_checkpoint(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(restored.iteration(), 100);
        assert_eq!(restored.num_info_sets(), 12);
        assert_eq!(
            restored.average_strategy(1, "K:").unwrap(),
            solver.average_strategy(1, "K:").unwrap()
        );

        restored.reset();
        assert_eq!(restored.iteration(), 0);
        assert_eq!(restored.average_strategy(1, "K:").unwrap(), vec![0.5, 0.5]);
    }
}
