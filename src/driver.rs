//! Feedback driver
//!
//! Replays every dataset record through the prediction endpoint, scores the
//! prediction against the record's label and reports the reward back with
//! the original request/response pair. Passes repeat until the stop handle
//! is triggered; the first error ends the run.

use crate::dataset::Dataset;
use crate::error::{ProbeError, Result};
use crate::reward::reward_elementwise;
use crate::services::PredictionClient;
use crate::types::{FeatureMatrix, LabelMatrix, Record};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Wait between passes over an empty dataset
pub const EMPTY_PASS_INTERVAL: Duration = Duration::from_millis(500);

/// Summary of one pass over the dataset, used for logging
#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    /// Number of records predicted and scored
    pub records: usize,

    /// Sum of the returned rewards
    pub total_reward: f64,

    pub min_reward: Option<f64>,
    pub max_reward: Option<f64>,

    /// Records whose prediction matched the label exactly
    pub exact_matches: usize,

    pub duration: Duration,
}

impl PassReport {
    fn new() -> Self {
        Self {
            records: 0,
            total_reward: 0.0,
            min_reward: None,
            max_reward: None,
            exact_matches: 0,
            duration: Duration::ZERO,
        }
    }

    fn record(&mut self, scored: &ScoredRecord) {
        let reward = scored.reward;
        self.records += 1;
        self.total_reward += reward;
        self.min_reward = Some(self.min_reward.map_or(reward, |m| m.min(reward)));
        self.max_reward = Some(self.max_reward.map_or(reward, |m| m.max(reward)));
        if scored.exact_match {
            self.exact_matches += 1;
        }
    }

    /// Mean reward, `None` for an empty pass
    pub fn mean_reward(&self) -> Option<f64> {
        if self.records == 0 {
            None
        } else {
            Some(self.total_reward / self.records as f64)
        }
    }
}

/// Outcome of one reported record
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScoredRecord {
    reward: f64,
    /// Prediction equalled the label, decided on the values, not the reward
    exact_match: bool,
}

/// Cloneable handle that asks a running driver to stop
///
/// The driver checks it before each pass, so the pass in flight completes.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Clears the running flag when `run` returns or is dropped mid-pass
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Drives predict → score → feedback over a dataset
pub struct FeedbackDriver {
    client: Arc<dyn PredictionClient>,
    dataset: Arc<Dataset>,
    stop: StopHandle,
    running: AtomicBool,
}

impl FeedbackDriver {
    /// Create a driver over an injected client and dataset
    pub fn new(client: Arc<dyn PredictionClient>, dataset: Arc<Dataset>) -> Self {
        Self {
            client,
            dataset,
            stop: StopHandle::new(),
            running: AtomicBool::new(false),
        }
    }

    /// Use an existing stop handle, e.g. one created before the driver
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    /// Handle that stops [`FeedbackDriver::run`] after the current pass
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Predict, score and report one record; returns the first reward value
    pub async fn process_record(&self, record: &Record) -> Result<f64> {
        Ok(self.score_record(record).await?.reward)
    }

    async fn score_record(&self, record: &Record) -> Result<ScoredRecord> {
        let features = FeatureMatrix::single_row(
            record.features.clone(),
            self.dataset.feature_names().to_vec(),
        )?;
        let label = LabelMatrix::single(record.label);

        let prediction = self.client.predict(&features).await?;
        let predicted = prediction.response.tensor_values()?;

        let rewards = reward_elementwise(label.values(), predicted)?;
        let reward = rewards.first().copied().ok_or(ProbeError::ShapeMismatch {
            expected: 1,
            actual: 0,
        })?;
        let exact_match = label.values() == predicted;

        self.client
            .feedback(&prediction.request, &prediction.response, reward)
            .await?;

        debug!(
            "label={} predicted={:?} reward={}",
            record.label, predicted, reward
        );

        Ok(ScoredRecord {
            reward,
            exact_match,
        })
    }

    /// Process every record once, in dataset order
    ///
    /// The first failing record aborts the pass; later records are not sent.
    pub async fn run_pass(&self) -> Result<PassReport> {
        let started = Instant::now();
        let mut report = PassReport::new();

        for (idx, record) in self.dataset.records().iter().enumerate() {
            let scored = self.score_record(record).await.map_err(|e| {
                warn!("Record {} failed: {}", idx, e);
                e
            })?;
            report.record(&scored);
        }

        report.duration = started.elapsed();
        Ok(report)
    }

    /// Repeat passes until stopped; returns the number of completed passes
    ///
    /// Any record error ends the run immediately and is returned.
    pub async fn run(&self) -> Result<u64> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ProbeError::AlreadyRunning);
        }
        let _guard = RunningGuard(&self.running);

        info!(
            "Starting feedback driver over {} record(s)",
            self.dataset.len()
        );

        self.run_until_stopped().await
    }

    /// Run until a shutdown signal arrives
    ///
    /// `next_signal` is polled for each signal. The first one trips the stop
    /// handle so the pass in flight completes; a second one abandons the pass
    /// and returns [`ProbeError::Interrupted`].
    pub async fn run_until_signalled<S, F>(&self, mut next_signal: S) -> Result<u64>
    where
        S: FnMut() -> F,
        F: Future<Output = ()>,
    {
        let run = self.run();
        tokio::pin!(run);

        tokio::select! {
            result = &mut run => return result,
            _ = next_signal() => {
                warn!("Received shutdown signal, stopping after the current pass...");
                self.stop.stop();
            }
        }

        tokio::select! {
            result = &mut run => result,
            _ = next_signal() => {
                warn!("Received second shutdown signal, abandoning the current pass");
                Err(ProbeError::Interrupted)
            }
        }
    }

    async fn run_until_stopped(&self) -> Result<u64> {
        let mut passes = 0u64;

        loop {
            if self.stop.is_stopped() {
                info!("Stopping feedback driver after {} pass(es)", passes);
                break;
            }

            let report = self.run_pass().await?;
            passes += 1;

            // Nothing to send; idle instead of spinning, and say so once
            if report.records == 0 {
                if passes == 1 {
                    warn!("Dataset is empty; idling until stopped");
                }
                sleep(EMPTY_PASS_INTERVAL).await;
                continue;
            }

            info!(
                "Pass {} complete: {} record(s), mean reward {:.4}, min {:.4}, max {:.4}, {} exact match(es), {:?}",
                passes,
                report.records,
                report.mean_reward().unwrap_or(0.0),
                report.min_reward.unwrap_or(0.0),
                report.max_reward.unwrap_or(0.0),
                report.exact_matches,
                report.duration
            );
        }

        Ok(passes)
    }
}
