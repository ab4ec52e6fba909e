//! Bounded play-out reporting pipeline.
//!
//! Producers push completed play-outs into a fixed-capacity channel; a send
//! blocks while the channel is full. A fixed pool of consumer threads drains
//! the channel, hands every play-out to an optional [`PlayoutSink`] and folds
//! it into shared running statistics. Shutdown is explicit:
//! [`ReportingPipeline::finish`] drops the pipeline's own sender, waits for
//! the consumers to drain everything still queued, joins them and returns
//! the totals.

use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};

use crate::cfr::error::SolverError;
use crate::cfr::game::Action;

/// One finished play-out and the weight it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedPlayout {
    /// Actions from the root to the terminal.
    pub actions: Vec<Action>,
    /// Terminal utility of every non-chance player.
    pub utilities: Vec<f64>,
    /// Sampling weight: 1 for sampled play-outs, the path probability for
    /// exhaustive enumeration.
    pub weight: f64,
}

/// Weighted running totals over received play-outs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunningStatistics {
    /// Play-outs received.
    pub count: u64,
    /// Sum of weights.
    pub total_weight: f64,
    /// Weighted utility sums per player.
    pub weighted_utility: Vec<f64>,
}

impl RunningStatistics {
    /// Empty statistics for `num_players` players.
    pub fn new(num_players: usize) -> Self {
        Self {
            count: 0,
            total_weight: 0.0,
            weighted_utility: vec![0.0; num_players],
        }
    }

    /// Fold in one play-out.
    pub fn record(&mut self, playout: &CompletedPlayout) {
        self.count += 1;
        self.total_weight += playout.weight;
        for (sum, u) in self.weighted_utility.iter_mut().zip(&playout.utilities) {
            *sum += playout.weight * u;
        }
    }

    /// Weighted mean utility per player (zeros when nothing was recorded).
    pub fn means(&self) -> Vec<f64> {
        if self.total_weight <= 0.0 {
            return vec![0.0; self.weighted_utility.len()];
        }
        self.weighted_utility
            .iter()
            .map(|s| s / self.total_weight)
            .collect()
    }
}

/// Receiver of every completed play-out, called from the consumer threads.
pub trait PlayoutSink: Send + Sync {
    /// Take one play-out and its weight.
    fn receive(&self, playout: &CompletedPlayout);
}

impl<F> PlayoutSink for F
where
    F: Fn(&CompletedPlayout) + Send + Sync,
{
    fn receive(&self, playout: &CompletedPlayout) {
        self(playout)
    }
}

/// Cloneable producer handle. Sending blocks while the queue is full.
#[derive(Debug, Clone)]
pub struct PlayoutSender {
    sender: SyncSender<CompletedPlayout>,
}

impl PlayoutSender {
    /// Enqueue a play-out, waiting for room.
    pub fn send(&self, playout: CompletedPlayout) -> Result<(), SolverError> {
        self.sender
            .send(playout)
            .map_err(|_| SolverError::Reporting("all consumers have stopped".to_string()))
    }
}

/// A running pipeline: bounded queue plus consumer threads.
pub struct ReportingPipeline {
    sender: PlayoutSender,
    consumers: Vec<JoinHandle<()>>,
    statistics: Arc<Mutex<RunningStatistics>>,
}

impl ReportingPipeline {
    /// Start `consumers` threads draining a queue of `capacity` play-outs.
    pub fn start(num_players: usize, capacity: usize, consumers: usize) -> Self {
        Self::with_sink(num_players, capacity, consumers, None)
    }

    /// Like [`ReportingPipeline::start`], also handing every play-out to `sink`.
    pub fn with_sink(
        num_players: usize,
        capacity: usize,
        consumers: usize,
        sink: Option<Arc<dyn PlayoutSink>>,
    ) -> Self {
        let (sender, receiver) = mpsc::sync_channel(capacity);
        let receiver: Arc<Mutex<Receiver<CompletedPlayout>>> = Arc::new(Mutex::new(receiver));
        let statistics = Arc::new(Mutex::new(RunningStatistics::new(num_players)));

        let consumers = (0..consumers.max(1))
            .map(|_| {
                let receiver = Arc::clone(&receiver);
                let statistics = Arc::clone(&statistics);
                let sink = sink.clone();
                thread::spawn(move || loop {
                    // The receiver lock is released before the statistics lock is taken.
                    let next = receiver.lock().unwrap().recv();
                    match next {
                        Ok(playout) => {
                            if let Some(sink) = &sink {
                                sink.receive(&playout);
                            }
                            statistics.lock().unwrap().record(&playout);
                        }
                        Err(_) => break,
                    }
                })
            })
            .collect();

        Self {
            sender: PlayoutSender { sender },
            consumers,
            statistics,
        }
    }

    /// A new producer handle.
    pub fn sender(&self) -> PlayoutSender {
        self.sender.clone()
    }

    /// Signal completion, drain, join and return the final statistics.
    ///
    /// Every producer handle obtained from [`ReportingPipeline::sender`] must
    /// have been dropped, otherwise this waits for them.
    pub fn finish(self) -> Result<RunningStatistics, SolverError> {
        let Self {
            sender,
            consumers,
            statistics,
        } = self;
        drop(sender);
        for consumer in consumers {
            consumer
                .join()
                .map_err(|_| SolverError::Reporting("consumer thread panicked".to_string()))?;
        }
        let totals = statistics.lock().unwrap().clone();
        Ok(totals)
    }
}

/// Utilities and convergence measured at the end of a reporting window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilityReport {
    /// Solver iteration count when the report was taken.
    pub iteration: u64,
    /// Name of the algorithm that produced the strategies.
    pub algorithm: String,
    /// Exhaustive average-strategy expected utility per player.
    pub average_strategy_utilities: Vec<f64>,
    /// Weighted mean utility of the reported play-outs.
    pub playout_means: Vec<f64>,
    /// Number of play-outs that went through the pipeline.
    pub playouts: u64,
    /// Exploitability per player, when measured.
    pub exploitability: Option<Vec<f64>>,
    /// Convergence indicator against the previous report.
    pub convergence_indicator: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn playout(u: f64, weight: f64) -> CompletedPlayout {
        CompletedPlayout {
            actions: vec![1],
            utilities: vec![u, -u],
            weight,
        }
    }

    #[test]
    fn test_running_statistics() {
        let mut stats = RunningStatistics::new(2);
        assert_eq!(stats.means(), vec![0.0, 0.0]);
        stats.record(&playout(1.0, 3.0));
        stats.record(&playout(-1.0, 1.0));
        assert_eq!(stats.count, 2);
        assert_eq!(stats.means(), vec![0.5, -0.5]);
    }

    #[test]
    fn test_pipeline_drains_everything() {
        let pipeline = ReportingPipeline::start(2, 4, 3);
        (0..1_000).into_par_iter().for_each_with(pipeline.sender(), |sender, i| {
            sender.send(playout(if i % 2 == 0 { 1.0 } else { 0.0 }, 1.0)).unwrap();
        });
        let stats = pipeline.finish().unwrap();
        assert_eq!(stats.count, 1_000);
        assert_eq!(stats.total_weight, 1_000.0);
        assert!((stats.means()[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_single_slot_queue_applies_backpressure() {
        let pipeline = ReportingPipeline::start(2, 1, 1);
        // Holding the statistics stalls the consumer after it takes one play-out.
        let gate = pipeline.statistics.lock().unwrap();

        let sent = Arc::new(AtomicUsize::new(0));
        let sender = pipeline.sender();
        let counter = Arc::clone(&sent);
        let producer = thread::spawn(move || {
            for _ in 0..3 {
                sender.send(playout(2.0, 0.5)).unwrap();
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        // One play-out is held by the consumer and one fills the slot; the
        // third send waits.
        thread::sleep(Duration::from_millis(200));
        assert_eq!(sent.load(Ordering::SeqCst), 2);

        drop(gate);
        producer.join().unwrap();
        assert_eq!(sent.load(Ordering::SeqCst), 3);
        let stats = pipeline.finish().unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.means(), vec![2.0, -2.0]);
    }

    #[test]
    fn test_sink_receives_every_playout() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let collected = Arc::clone(&received);
        let sink: Arc<dyn PlayoutSink> = Arc::new(move |p: &CompletedPlayout| {
            collected.lock().unwrap().push((p.utilities[0], p.weight));
        });
        let pipeline = ReportingPipeline::with_sink(2, 2, 3, Some(sink));
        (0..100).into_par_iter().for_each_with(pipeline.sender(), |sender, i| {
            sender.send(playout(i as f64, 0.25)).unwrap();
        });
        let stats = pipeline.finish().unwrap();

        let mut received = received.lock().unwrap().clone();
        received.sort_by(|a, b| a.0.total_cmp(&b.0));
        assert_eq!(received.len(), 100);
        assert_eq!(stats.count, 100);
        for (i, (u, weight)) in received.iter().enumerate() {
            assert_eq!(*u, i as f64);
            assert_eq!(*weight, 0.25);
        }
    }

    #[test]
    fn test_report_serializes() {
        let report = UtilityReport {
            iteration: 10,
            algorithm: "vanilla".to_string(),
            average_strategy_utilities: vec![0.1, -0.1],
            playout_means: vec![0.0, 0.0],
            playouts: 4,
            exploitability: Some(vec![0.01, 0.02]),
            convergence_indicator: None,
        };
        let json = serde_json::to_string(&report).unwrap();
        let back: UtilityReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
