//! Configuration options for the CFR solvers.
//!
//! A single [`SolverConfig`] drives every algorithm: iteration budgets,
//! exploration schedules, parallelism, reporting cadence and the limits of
//! the pure-strategy equilibrium finder.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cfr::reporting::UtilityReport;

/// Which solving algorithm [`crate::cfr::Solver::develop_strategies`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    /// Exhaustive counterfactual regret minimization.
    Vanilla,
    /// Probing with a linear exploration schedule.
    Probing,
    /// Gibson-style probing with detached probes.
    GibsonProbing,
    /// Explorative probing with iteration-weighted increments.
    ExplorativeProbing,
    /// Abramowicz probing with an inverse-square-root schedule.
    AbramowiczProbing,
    /// Average-strategy sampling.
    AverageStrategySampling,
}

impl Algorithm {
    /// All algorithms, in dispatch order.
    pub const ALL: [Algorithm; 6] = [
        Algorithm::Vanilla,
        Algorithm::Probing,
        Algorithm::GibsonProbing,
        Algorithm::ExplorativeProbing,
        Algorithm::AbramowiczProbing,
        Algorithm::AverageStrategySampling,
    ];

    /// Short name for logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Vanilla => "vanilla",
            Algorithm::Probing => "probing",
            Algorithm::GibsonProbing => "gibson-probing",
            Algorithm::ExplorativeProbing => "explorative-probing",
            Algorithm::AbramowiczProbing => "abramowicz-probing",
            Algorithm::AverageStrategySampling => "average-strategy-sampling",
        }
    }

    /// Whether the algorithm samples paths (as opposed to walking the full tree).
    pub fn is_sampling(&self) -> bool {
        !matches!(self, Algorithm::Vanilla)
    }
}

/// How strict iterated dominance elimination is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DominanceStrictness {
    /// Eliminate only strategies beaten against every surviving opponent strategy.
    Strict,
    /// Eliminate strategies that are never better and sometimes worse than another.
    Weak,
}

/// Configuration for the solver.
///
/// # Example
/// ```
/// use cfr_core::cfr::SolverConfig;
///
/// let config = SolverConfig::default().with_seed(7).with_parallel(true);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Iterations of Vanilla CFR per solve.
    pub vanilla_iterations: u64,

    /// Iterations of any probing variant per solve.
    pub probing_iterations: u64,

    /// Iterations of average-strategy sampling per solve.
    pub sampling_iterations: u64,

    /// Report every this many iterations. Zero reports only at the end.
    pub reporting_interval: u64,

    /// Exploration epsilon of the probing family at the first iteration.
    pub epsilon_start: f64,

    /// Exploration epsilon of the probing family at the last iteration.
    ///
    /// Must be positive so the sampling probability never reaches zero.
    pub epsilon_end: f64,

    /// Minimum exploration probability per action in average-strategy sampling.
    pub sampling_epsilon: f64,

    /// Threshold parameter `tau` of average-strategy sampling.
    pub sampling_tau: f64,

    /// Bonus parameter `beta` of average-strategy sampling.
    pub sampling_beta: f64,

    /// Run iterations (sampling algorithms) or chance subtrees (vanilla) in parallel.
    pub parallel: bool,

    /// Maximum depth of chance-node fan-out when running vanilla CFR in parallel.
    pub max_parallel_depth: usize,

    /// Skip zero-reach subtrees in vanilla CFR and prune unvisited actions.
    pub pruning: bool,

    /// Populate the whole game tree before solving instead of on demand.
    pub eager_tree: bool,

    /// Hard cap on nodes created by eager population.
    pub max_tree_nodes: usize,

    /// Strictness of iterated dominance elimination.
    pub dominance: DominanceStrictness,

    /// Keep only Pareto-undominated pure equilibria.
    pub pareto_filter: bool,

    /// Hard cap on pure strategies per player.
    pub max_pure_strategies: u64,

    /// Hard cap on pure strategy profiles (product over players).
    pub max_pure_profiles: u64,

    /// Measure exploitability of every player in each report.
    pub measure_exploitability: bool,

    /// Sampled play-outs per report. Zero enumerates every weighted play-out.
    pub report_playouts: usize,

    /// Capacity of the bounded reporting queue.
    pub report_queue_capacity: usize,

    /// Number of threads draining the reporting queue.
    pub report_consumers: usize,

    /// Display a progress bar while solving.
    pub show_progress: bool,

    /// Random seed. If `None`, a random seed is drawn when the solver is built.
    pub seed: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            vanilla_iterations: 10_000,
            probing_iterations: 100_000,
            sampling_iterations: 100_000,
            reporting_interval: 0,
            epsilon_start: 0.5,
            epsilon_end: 0.05,
            sampling_epsilon: 0.05,
            sampling_tau: 1_000.0,
            sampling_beta: 1_000_000.0,
            parallel: false,
            max_parallel_depth: 2,
            pruning: false,
            eager_tree: false,
            max_tree_nodes: 10_000_000,
            dominance: DominanceStrictness::Weak,
            pareto_filter: false,
            max_pure_strategies: 100_000,
            max_pure_profiles: 10_000_000,
            measure_exploitability: true,
            report_playouts: 1_000,
            report_queue_capacity: 1_024,
            report_consumers: 2,
            show_progress: false,
            seed: None,
        }
    }
}

impl SolverConfig {
    /// Create a new config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Small iteration budgets for quick experiments and tests.
    pub fn fast() -> Self {
        Self {
            vanilla_iterations: 1_000,
            probing_iterations: 10_000,
            sampling_iterations: 10_000,
            report_playouts: 200,
            ..Default::default()
        }
    }

    /// Iterations configured for `algorithm`.
    pub fn iterations_for(&self, algorithm: Algorithm) -> u64 {
        match algorithm {
            Algorithm::Vanilla => self.vanilla_iterations,
            Algorithm::Probing
            | Algorithm::GibsonProbing
            | Algorithm::ExplorativeProbing
            | Algorithm::AbramowiczProbing => self.probing_iterations,
            Algorithm::AverageStrategySampling => self.sampling_iterations,
        }
    }

    /// Builder method: set the iteration budget of `algorithm`.
    pub fn with_iterations(mut self, algorithm: Algorithm, iterations: u64) -> Self {
        match algorithm {
            Algorithm::Vanilla => self.vanilla_iterations = iterations,
            Algorithm::AverageStrategySampling => self.sampling_iterations = iterations,
            _ => self.probing_iterations = iterations,
        }
        self
    }

    /// Builder method: set the reporting interval.
    pub fn with_reporting_interval(mut self, interval: u64) -> Self {
        self.reporting_interval = interval;
        self
    }

    /// Builder method: set the exploration schedule endpoints.
    pub fn with_epsilon(mut self, start: f64, end: f64) -> Self {
        self.epsilon_start = start;
        self.epsilon_end = end;
        self
    }

    /// Builder method: enable or disable parallel execution.
    pub fn with_parallel(mut self, enable: bool) -> Self {
        self.parallel = enable;
        self
    }

    /// Builder method: enable or disable pruning.
    pub fn with_pruning(mut self, enable: bool) -> Self {
        self.pruning = enable;
        self
    }

    /// Builder method: populate the tree eagerly.
    pub fn with_eager_tree(mut self, enable: bool) -> Self {
        self.eager_tree = enable;
        self
    }

    /// Builder method: set dominance strictness.
    pub fn with_dominance(mut self, dominance: DominanceStrictness) -> Self {
        self.dominance = dominance;
        self
    }

    /// Builder method: enable Pareto filtering of pure equilibria.
    pub fn with_pareto_filter(mut self, enable: bool) -> Self {
        self.pareto_filter = enable;
        self
    }

    /// Builder method: enable or disable exploitability in reports.
    pub fn with_exploitability(mut self, enable: bool) -> Self {
        self.measure_exploitability = enable;
        self
    }

    /// Builder method: set sampled play-outs per report.
    pub fn with_report_playouts(mut self, playouts: usize) -> Self {
        self.report_playouts = playouts;
        self
    }

    /// Builder method: set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_json_str(&content)
    }

    /// Parse configuration from a JSON string. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("epsilon_start", self.epsilon_start),
            ("epsilon_end", self.epsilon_end),
            ("sampling_epsilon", self.sampling_epsilon),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    setting: name,
                    value,
                    range: "[0, 1]",
                });
            }
        }

        if self.epsilon_end <= 0.0 {
            return Err(ConfigError::OutOfRange {
                setting: "epsilon_end",
                value: self.epsilon_end,
                range: "(0, 1]",
            });
        }

        if self.epsilon_start < self.epsilon_end {
            return Err(ConfigError::IncreasingSchedule {
                start: self.epsilon_start,
                end: self.epsilon_end,
            });
        }

        if self.sampling_tau < 0.0 {
            return Err(ConfigError::OutOfRange {
                setting: "sampling_tau",
                value: self.sampling_tau,
                range: "[0, inf)",
            });
        }

        if self.sampling_beta <= 0.0 && self.sampling_epsilon <= 0.0 {
            return Err(ConfigError::OutOfRange {
                setting: "sampling_beta",
                value: self.sampling_beta,
                range: "(0, inf) when sampling_epsilon is zero",
            });
        }

        if self.sampling_beta < 0.0 {
            return Err(ConfigError::OutOfRange {
                setting: "sampling_beta",
                value: self.sampling_beta,
                range: "[0, inf)",
            });
        }

        if self.report_queue_capacity == 0 {
            return Err(ConfigError::Zero("report_queue_capacity"));
        }

        if self.report_consumers == 0 {
            return Err(ConfigError::Zero("report_consumers"));
        }

        if self.max_pure_strategies == 0 {
            return Err(ConfigError::Zero("max_pure_strategies"));
        }

        if self.max_pure_profiles == 0 {
            return Err(ConfigError::Zero("max_pure_profiles"));
        }

        Ok(())
    }

    /// Validate that `algorithm` has iterations to run.
    pub fn validate_for(&self, algorithm: Algorithm) -> Result<(), ConfigError> {
        self.validate()?;
        if self.iterations_for(algorithm) == 0 {
            return Err(ConfigError::NoIterations(algorithm.name()));
        }
        Ok(())
    }
}

/// Errors that can occur when validating solver configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A numeric setting is outside its allowed range.
    #[error("{setting} = {value} is out of range {range}")]
    OutOfRange {
        /// Name of the setting.
        setting: &'static str,
        /// Offending value.
        value: f64,
        /// Allowed range, human readable.
        range: &'static str,
    },

    /// The exploration schedule would increase over the solve.
    #[error("epsilon schedule must not increase (epsilon_start = {start}, epsilon_end = {end})")]
    IncreasingSchedule {
        /// Configured start.
        start: f64,
        /// Configured end.
        end: f64,
    },

    /// A setting that must be positive is zero.
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    /// The selected algorithm has no iterations configured.
    #[error("no iterations configured for {0}")]
    NoIterations(&'static str),

    /// The game has a player count the algorithm does not support.
    #[error("{algorithm} requires exactly {expected} non-chance players, the game has {actual}")]
    PlayerCount {
        /// Algorithm that was requested.
        algorithm: &'static str,
        /// Required player count.
        expected: usize,
        /// Player count of the game.
        actual: usize,
    },

    /// Configuration file could not be read.
    #[error("could not read configuration: {0}")]
    Io(String),

    /// Configuration file could not be parsed.
    #[error("could not parse configuration: {0}")]
    Parse(String),
}

/// Statistics tracked during a solve.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolveStats {
    /// Algorithm that produced these statistics.
    pub algorithm: Option<Algorithm>,

    /// Total number of iterations completed.
    pub iterations: u64,

    /// Number of information sets discovered.
    pub info_sets: usize,

    /// Total time spent solving (in seconds).
    pub elapsed_seconds: f64,

    /// Iterations per second.
    pub iterations_per_second: f64,

    /// Largest exploitability in the latest report, if measured.
    pub exploitability: Option<f64>,

    /// Every report produced during the solve.
    pub reports: Vec<UtilityReport>,
}

impl SolveStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update iterations per second based on elapsed time.
    pub fn update_rate(&mut self) {
        if self.elapsed_seconds > 0.0 {
            self.iterations_per_second = self.iterations as f64 / self.elapsed_seconds;
        }
    }

    /// Record a report.
    pub fn record_report(&mut self, report: UtilityReport) {
        if let Some(values) = &report.exploitability {
            self.exploitability = values.iter().copied().reduce(f64::max);
        }
        self.reports.push(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SolverConfig::default().validate().is_ok());
        assert!(SolverConfig::fast().validate().is_ok());
    }

    #[test]
    fn test_rejects_increasing_schedule() {
        let config = SolverConfig::default().with_epsilon(0.1, 0.3);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::IncreasingSchedule { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_epsilon_end() {
        let config = SolverConfig::default().with_epsilon(0.3, 0.0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("epsilon_end"));
    }

    #[test]
    fn test_rejects_zero_iterations_for_selected_algorithm() {
        let config = SolverConfig::default().with_iterations(Algorithm::GibsonProbing, 0);
        assert!(config.validate_for(Algorithm::Vanilla).is_ok());
        assert_eq!(
            config.validate_for(Algorithm::GibsonProbing),
            Err(ConfigError::NoIterations("gibson-probing"))
        );
    }

    #[test]
    fn test_json_round_trip_with_defaults() {
        let config = SolverConfig::from_json_str(
            r#"{ "vanilla_iterations": 250, "parallel": true, "dominance": "Strict" }"#,
        )
        .unwrap();
        assert_eq!(config.vanilla_iterations, 250);
        assert!(config.parallel);
        assert_eq!(config.dominance, DominanceStrictness::Strict);
        assert_eq!(config.probing_iterations, SolverConfig::default().probing_iterations);

        let bad = SolverConfig::from_json_str(r#"{ "report_consumers": 0 }"#);
        assert_eq!(bad.unwrap_err(), ConfigError::Zero("report_consumers"));
    }
}
