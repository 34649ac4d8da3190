//! Async analysis.
//!
//! [`analyze_file_async`] runs a whole analysis on a Tokio blocking thread
//! and returns an [`AnalysisFuture`], so CPU-heavy decoding never ties up the
//! runtime's cooperative task budget. [`analyze_source_async`] does the same
//! for any owned [`FrameSource`]. [`progress_channel`] turns progress
//! callbacks into a bounded `mpsc` receiver for async consumers.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use shotlens::{AnalysisOptions, AnalysisOutcome, CancellationToken};
//! use shotlens::stream::{analyze_file_async, progress_channel};
//!
//! # async fn example() -> Result<(), shotlens::AnalysisError> {
//! let (callback, mut updates) = progress_channel(16);
//! let token = CancellationToken::new();
//! let options = AnalysisOptions::new()
//!     .with_progress(callback)
//!     .with_cancellation(token.clone());
//!
//! let analysis = analyze_file_async("input.mp4", options, None);
//! tokio::spawn(async move {
//!     while let Some(info) = updates.recv().await {
//!         println!("{:.0}%", info.percent);
//!     }
//! });
//!
//! match analysis.await? {
//!     AnalysisOutcome::Completed(result) => println!("{} shots", result.shots.len()),
//!     AnalysisOutcome::Cancelled => println!("cancelled"),
//! }
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinHandle;

use crate::analysis::{AnalysisOutcome, Analyzer, analyze_file};
use crate::configuration::AnalysisOptions;
use crate::error::AnalysisError;
use crate::progress::{ProgressCallback, ProgressInfo};
use crate::source::FrameSource;

/// A future that resolves to the outcome of a background analysis.
///
/// Dropping the future does not stop the run; use a
/// [`CancellationToken`](crate::CancellationToken) for that.
pub struct AnalysisFuture {
    handle: JoinHandle<Result<AnalysisOutcome, AnalysisError>>,
}

impl Future for AnalysisFuture {
    type Output = Result<AnalysisOutcome, AnalysisError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(|joined| match joined {
            Ok(result) => result,
            Err(error) if error.is_cancelled() => Ok(AnalysisOutcome::Cancelled),
            Err(error) => {
                log::error!("Analysis task panicked: {error}");
                Err(AnalysisError::TaskFailed(error.to_string()))
            }
        })
    }
}

/// Analyze a file on a blocking thread.
///
/// `edl` is the raw content of an edit decision list. Must be called from
/// within a Tokio runtime.
pub fn analyze_file_async<P: Into<PathBuf>>(
    path: P,
    options: AnalysisOptions,
    edl: Option<Vec<u8>>,
) -> AnalysisFuture {
    let path = path.into();
    let handle = tokio::task::spawn_blocking(move || analyze_file(&path, &options, edl.as_deref()));
    AnalysisFuture { handle }
}

/// Analyze an owned frame source on a blocking thread.
pub fn analyze_source_async<S>(
    mut source: S,
    options: AnalysisOptions,
    edl: Option<Vec<u8>>,
) -> AnalysisFuture
where
    S: FrameSource + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(move || {
        Analyzer::new(options).analyze(&mut source, edl.as_deref())
    });
    AnalysisFuture { handle }
}

struct ChannelProgress {
    sender: Sender<ProgressInfo>,
}

impl ProgressCallback for ChannelProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        // Updates are dropped when the consumer lags; the next one supersedes them.
        let _ = self.sender.try_send(info.clone());
    }
}

/// A progress callback that forwards updates into a bounded channel.
pub fn progress_channel(capacity: usize) -> (Arc<dyn ProgressCallback>, Receiver<ProgressInfo>) {
    let (sender, receiver) = tokio::sync::mpsc::channel(capacity.max(1));
    (Arc::new(ChannelProgress { sender }), receiver)
}
