//! Progress reporting and cancellation support.
//!
//! This module provides [`ProgressCallback`] for monitoring an analysis run,
//! [`CancellationToken`] for cooperative cancellation, and [`ProgressInfo`]
//! for progress snapshots.
//!
//! Percentages delivered to a callback are clamped to `0.0..=100.0` and never
//! decrease within one run, even when the analyzer abandons the learned-model
//! phase and restarts sampling with the heuristic detector.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use shotlens::{AnalysisOptions, CancellationToken, ProgressInfo};
//!
//! let token = CancellationToken::new();
//! let options = AnalysisOptions::new()
//!     .with_progress(Arc::new(|info: &ProgressInfo| {
//!         println!("[{:?}] {:.0}%", info.stage, info.percent);
//!     }))
//!     .with_cancellation(token.clone());
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// Share of the progress range reserved for the learned-model phase.
pub const MODEL_PROGRESS_BUDGET: f32 = 60.0;

/// The phase of an analysis run currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnalysisStage {
    /// Scoring frames with the learned shot-boundary model.
    ModelScoring,
    /// Seeking and extracting features for detection and charting.
    Sampling,
    /// Computing aggregate statistics.
    Finalizing,
}

/// A snapshot of analysis progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What the analyzer is doing.
    pub stage: AnalysisStage,
    /// Completion percentage (0.0 – 100.0), monotonically non-decreasing.
    pub percent: f32,
    /// Wall-clock time elapsed since the run started.
    pub elapsed: Duration,
}

/// Trait for receiving progress updates during analysis.
///
/// Implementations must be [`Send`] and [`Sync`] so a run can be moved onto
/// a blocking thread. Progress callbacks are **infallible**; use
/// [`CancellationToken`] to stop a run.
pub trait ProgressCallback: Send + Sync {
    /// Called after each processed sample.
    fn on_progress(&self, info: &ProgressInfo);
}

impl<F> ProgressCallback for F
where
    F: Fn(&ProgressInfo) + Send + Sync,
{
    fn on_progress(&self, info: &ProgressInfo) {
        self(info)
    }
}

/// Discards all progress notifications. Used when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone the token and share it between threads; call
/// [`cancel`](CancellationToken::cancel) from anywhere to stop the associated
/// run. The analyzer checks the token before every seek and after every
/// feature-extraction round trip.
///
/// # Example
///
/// ```
/// use shotlens::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. All clones observe it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks run timing and forwards clamped, monotonic percentages.
pub(crate) struct ProgressReporter {
    callback: Arc<dyn ProgressCallback>,
    start_time: Instant,
    last_percent: f32,
}

impl ProgressReporter {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>) -> Self {
        Self {
            callback,
            start_time: Instant::now(),
            last_percent: 0.0,
        }
    }

    /// Report `percent` for `stage`. Values below the last reported
    /// percentage are raised to it.
    pub(crate) fn report(&mut self, stage: AnalysisStage, percent: f32) {
        let clamped = if percent.is_finite() {
            percent.clamp(0.0, 100.0)
        } else {
            self.last_percent
        };
        self.last_percent = self.last_percent.max(clamped);

        let info = ProgressInfo {
            stage,
            percent: self.last_percent,
            elapsed: self.start_time.elapsed(),
        };
        self.callback.on_progress(&info);
    }

    /// Report a position `done / total` of the sampling phase.
    pub(crate) fn report_fraction(&mut self, stage: AnalysisStage, done: f64, total: f64) {
        let percent = if total > 0.0 {
            ((done / total) * 100.0).round() as f32
        } else {
            100.0
        };
        self.report(stage, percent.min(100.0));
    }

    /// Report a model-phase position scaled into the model budget.
    pub(crate) fn report_model(&mut self, fraction_percent: f32) {
        let scaled = (fraction_percent.min(99.0) * MODEL_PROGRESS_BUDGET / 100.0).round();
        self.report(AnalysisStage::ModelScoring, scaled.min(MODEL_PROGRESS_BUDGET));
    }
}
