//! The probing family of Monte Carlo CFR algorithms.
//!
//! Chance and the other players are sampled on-policy. At the optimized
//! player's decisions one action is sampled from the regret-matched strategy
//! blended with uniform exploration and walked normally; every other action
//! is valued by a probe, a single on-policy play-out to a terminal that
//! updates no statistics. With `q` the probability that the optimized
//! player's own sampling reached the node, the increments are
//!
//! ```text
//! regret(a)   += w * (1 / q) * (v(a) - sum_b sigma(b) v(b))
//! strategy(a) += w * (1 / q) * pi_player * sigma(a)
//! ```
//!
//! The four variants differ only in the exploration schedule, in whether
//! probes are memoised in the tree cache, and in the increment weight `w`.
//! They are presets of [`ProbingVariant`] driving one procedure.

use crate::cfr::algorithm::CfrAlgorithm;
use crate::cfr::config::{Algorithm, SolverConfig};
use crate::cfr::error::SolverError;
use crate::cfr::game::{Action, GameDefinition, PlayerIndex};
use crate::cfr::history::{HistoryNavigator, HistoryPoint};
use crate::cfr::random::{DeterministicStream, DrawPurpose};
use crate::cfr::regret::{self, ActionVector};
use crate::cfr::state::GameState;

/// How exploration decays over a solve. `t` is the fraction of the solve done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpsilonSchedule {
    /// `start + (end - start) * t`
    Linear,
    /// `start * (end / start)^t`
    Geometric,
    /// `start` for the first half, then linear down to `end`.
    HoldThenLinear,
    /// `max(end, start / sqrt(iteration))`
    InverseSqrt,
}

impl EpsilonSchedule {
    /// Exploration weight at `iteration` (1-based) of `total`.
    pub fn epsilon(&self, start: f64, end: f64, iteration: u64, total: u64) -> f64 {
        let t = if total <= 1 {
            1.0
        } else {
            ((iteration.saturating_sub(1)) as f64 / (total - 1) as f64).min(1.0)
        };
        match self {
            EpsilonSchedule::Linear => start + (end - start) * t,
            EpsilonSchedule::Geometric => {
                if start <= 0.0 {
                    end
                } else {
                    start * (end / start).powf(t)
                }
            }
            EpsilonSchedule::HoldThenLinear => {
                if t < 0.5 {
                    start
                } else {
                    start + (end - start) * (2.0 * t - 1.0)
                }
            }
            EpsilonSchedule::InverseSqrt => end.max(start / (iteration.max(1) as f64).sqrt()),
        }
    }
}

/// Whether probes go through the tree cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeRule {
    /// Probes resolve nodes like walks do, populating the cache.
    Memoized,
    /// Probes replay the game without touching the cache.
    Detached,
}

/// Extra weight on every increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementWeight {
    /// Weight 1.
    Unit,
    /// Weight equal to the iteration number within the solve.
    Iteration,
}

impl IncrementWeight {
    fn value(&self, iteration: u64) -> f64 {
        match self {
            IncrementWeight::Unit => 1.0,
            IncrementWeight::Iteration => iteration as f64,
        }
    }
}

/// Parameters distinguishing the probing variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbingVariant {
    /// Short name for logs.
    pub name: &'static str,
    /// Exploration schedule.
    pub schedule: EpsilonSchedule,
    /// Probe resolution.
    pub probe: ProbeRule,
    /// Increment weight.
    pub weight: IncrementWeight,
}

impl ProbingVariant {
    /// Outcome probing with a linear schedule.
    pub const PROBING: Self = Self {
        name: "probing",
        schedule: EpsilonSchedule::Linear,
        probe: ProbeRule::Memoized,
        weight: IncrementWeight::Unit,
    };

    /// Gibson probing: geometric schedule, detached probes.
    pub const GIBSON: Self = Self {
        name: "gibson-probing",
        schedule: EpsilonSchedule::Geometric,
        probe: ProbeRule::Detached,
        weight: IncrementWeight::Unit,
    };

    /// Explorative probing: held exploration, iteration-weighted increments.
    pub const EXPLORATIVE: Self = Self {
        name: "explorative-probing",
        schedule: EpsilonSchedule::HoldThenLinear,
        probe: ProbeRule::Memoized,
        weight: IncrementWeight::Iteration,
    };

    /// Abramowicz probing: inverse square root schedule, detached probes.
    pub const ABRAMOWICZ: Self = Self {
        name: "abramowicz-probing",
        schedule: EpsilonSchedule::InverseSqrt,
        probe: ProbeRule::Detached,
        weight: IncrementWeight::Unit,
    };

    /// Preset for a probing algorithm, `None` for the others.
    pub fn for_algorithm(algorithm: Algorithm) -> Option<Self> {
        match algorithm {
            Algorithm::Probing => Some(Self::PROBING),
            Algorithm::GibsonProbing => Some(Self::GIBSON),
            Algorithm::ExplorativeProbing => Some(Self::EXPLORATIVE),
            Algorithm::AbramowiczProbing => Some(Self::ABRAMOWICZ),
            Algorithm::Vanilla | Algorithm::AverageStrategySampling => None,
        }
    }
}

/// A probing solver bound to one solve.
#[derive(Debug, Clone)]
pub struct ProbingCfr {
    variant: ProbingVariant,
    epsilon_start: f64,
    epsilon_end: f64,
    /// Iterations before this solve started; schedules count from here.
    offset: u64,
    total: u64,
    seed: u64,
    parallel: bool,
}

/// Everything fixed for one (iteration, player) walk.
struct Walk<'a, G: GameDefinition> {
    navigator: &'a HistoryNavigator<G>,
    stream: DeterministicStream,
    player: PlayerIndex,
    epsilon: f64,
    weight: f64,
}

impl ProbingCfr {
    /// Create a solver running `total` iterations after `offset` already done.
    pub fn new(variant: ProbingVariant, config: &SolverConfig, seed: u64, offset: u64, total: u64) -> Self {
        Self {
            variant,
            epsilon_start: config.epsilon_start,
            epsilon_end: config.epsilon_end,
            offset,
            total,
            seed,
            parallel: config.parallel,
        }
    }

    /// The preset in use.
    pub fn variant(&self) -> ProbingVariant {
        self.variant
    }

    /// Exploration weight at a global iteration number.
    pub fn epsilon(&self, iteration: u64) -> f64 {
        self.variant.schedule.epsilon(
            self.epsilon_start,
            self.epsilon_end,
            iteration.saturating_sub(self.offset),
            self.total,
        )
    }

    fn walk<G: GameDefinition>(
        &self,
        ctx: &Walk<'_, G>,
        point: &HistoryPoint,
        q: f64,
        own_reach: f64,
    ) -> Result<f64, SolverError> {
        match ctx.navigator.resolve(point)? {
            GameState::Terminal(terminal) => Ok(terminal.utility(ctx.player)),

            GameState::Chance(chance) => {
                let u = ctx.stream.draw(chance.decision_index, point, DrawPurpose::Walk);
                self.walk(ctx, &point.branch(chance.sample(u)), q, own_reach)
            }

            GameState::Decision(tally) if tally.player() != ctx.player => {
                let sigma = tally.action_probabilities(0.0);
                let u = ctx.stream.draw(tally.decision_index(), point, DrawPurpose::Walk);
                let action = regret::sample_action(&sigma, u);
                self.walk(ctx, &point.branch(action), q, own_reach)
            }

            GameState::Decision(tally) => {
                let sigma = tally.action_probabilities(0.0);
                let sampling = match tally.forced_action() {
                    Some(_) => sigma,
                    None => regret::blend_with_uniform(&sigma, ctx.epsilon),
                };
                let u = ctx.stream.draw(tally.decision_index(), point, DrawPurpose::Walk);
                let sampled = regret::sample_action(&sampling, u);

                let mut values = ActionVector::zeros(tally.num_actions());
                for (i, value) in values.iter_mut().enumerate() {
                    let action = (i + 1) as Action;
                    let child = point.branch(action);
                    *value = if action == sampled {
                        self.walk(ctx, &child, q * sampling[i], own_reach * sigma[i])?
                    } else {
                        self.probe(ctx, child)?
                    };
                }

                let node_value = sigma.dot(&values);
                let scale = ctx.weight / q;
                for (i, &value) in values.iter().enumerate() {
                    let action = (i + 1) as Action;
                    tally.add_regret(action, scale * (value - node_value));
                    tally.add_strategy(action, scale * own_reach * sigma[i]);
                }
                Ok(node_value)
            }
        }
    }

    /// One on-policy play-out from `point` to a terminal.
    fn probe<G: GameDefinition>(&self, ctx: &Walk<'_, G>, mut point: HistoryPoint) -> Result<f64, SolverError> {
        loop {
            let state = match self.variant.probe {
                ProbeRule::Memoized => ctx.navigator.resolve(&point)?,
                ProbeRule::Detached => ctx.navigator.resolve_detached(&point)?,
            };
            let action = match state {
                GameState::Terminal(terminal) => return Ok(terminal.utility(ctx.player)),
                GameState::Chance(chance) => {
                    chance.sample(ctx.stream.draw(chance.decision_index, &point, DrawPurpose::Probe))
                }
                GameState::Decision(tally) => {
                    let u = ctx.stream.draw(tally.decision_index(), &point, DrawPurpose::Probe);
                    regret::sample_action(&tally.action_probabilities(0.0), u)
                }
            };
            point = point.branch(action);
        }
    }
}

impl<G: GameDefinition> CfrAlgorithm<G> for ProbingCfr {
    fn name(&self) -> &'static str {
        self.variant.name
    }

    fn iterate(
        &self,
        navigator: &HistoryNavigator<G>,
        iteration: u64,
        player: PlayerIndex,
    ) -> Result<f64, SolverError> {
        let ctx = Walk {
            navigator,
            stream: DeterministicStream::new(self.seed, iteration, player),
            player,
            epsilon: self.epsilon(iteration),
            weight: self
                .variant
                .weight
                .value(iteration.saturating_sub(self.offset)),
        };
        self.walk(&ctx, &HistoryPoint::root(), 1.0, 1.0)
    }

    fn parallel_iterations(&self) -> bool {
        self.parallel
    }
}
