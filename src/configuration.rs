//! Analysis configuration.
//!
//! [`AnalysisOptions`] is a builder that threads progress callbacks,
//! cancellation tokens, sampling overrides and learned-model settings through
//! [`Analyzer`](crate::Analyzer) without polluting every function signature.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use shotlens::{AnalysisOptions, CancellationToken, ModelConfig, ProgressInfo};
//!
//! let token = CancellationToken::new();
//! let options = AnalysisOptions::new()
//!     .with_progress(Arc::new(|info: &ProgressInfo| println!("{:.0}%", info.percent)))
//!     .with_cancellation(token.clone())
//!     .with_model(ModelConfig::from_directory("models/transnetv2"));
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// File names tried, in order, when a model directory is configured.
pub const MODEL_FILE_CANDIDATES: [&str; 3] =
    ["transnetv2.onnx", "model.onnx", "transnetv2_onnx.onnx"];

/// Where to find the learned shot-boundary model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelConfig {
    /// Load exactly this model file.
    File(PathBuf),
    /// Load the first of [`MODEL_FILE_CANDIDATES`] that exists in the directory.
    Directory(PathBuf),
}

impl ModelConfig {
    /// Use a specific model file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Self {
        ModelConfig::File(path.as_ref().to_path_buf())
    }

    /// Search a directory for a model file.
    pub fn from_directory<P: AsRef<Path>>(path: P) -> Self {
        ModelConfig::Directory(path.as_ref().to_path_buf())
    }

    /// Resolve to the model file that should be loaded, if any exists.
    pub fn resolve(&self) -> Option<PathBuf> {
        match self {
            ModelConfig::File(path) => path.is_file().then(|| path.clone()),
            ModelConfig::Directory(directory) => MODEL_FILE_CANDIDATES
                .iter()
                .map(|name| directory.join(name))
                .find(|candidate| candidate.is_file()),
        }
    }
}

/// Configuration for an analysis run.
///
/// All fields have defaults: no progress callback, no cancellation, sample
/// step chosen from the source's size, and no learned model.
#[derive(Clone)]
pub struct AnalysisOptions {
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    /// Fixed sample step in seconds. `None` uses the size-keyed policy.
    pub(crate) sample_step: Option<f64>,
    /// Byte size used by the sampling policy instead of the source's own hint.
    pub(crate) size_hint: Option<u64>,
    pub(crate) model: Option<ModelConfig>,
}

impl Debug for AnalysisOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("AnalysisOptions")
            .field("has_progress", &true)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("sample_step", &self.sample_step)
            .field("size_hint", &self.size_hint)
            .field("model", &self.model)
            .finish()
    }
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            sample_step: None,
            size_hint: None,
            model: None,
        }
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token is cancelled the run stops at the next seek and
    /// returns [`AnalysisOutcome::Cancelled`](crate::AnalysisOutcome::Cancelled).
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Force a sample step in seconds for the linear scan.
    ///
    /// Non-positive or non-finite values are ignored.
    #[must_use]
    pub fn with_sample_step(mut self, seconds: f64) -> Self {
        self.sample_step = (seconds.is_finite() && seconds > 0.0).then_some(seconds);
        self
    }

    /// Override the byte size that drives the sampling policy.
    #[must_use]
    pub fn with_size_hint(mut self, bytes: u64) -> Self {
        self.size_hint = Some(bytes);
        self
    }

    /// Try the learned shot-boundary model before heuristic detection.
    #[must_use]
    pub fn with_model(mut self, model: ModelConfig) -> Self {
        self.model = Some(model);
        self
    }

    /// Skip the learned model and go straight to heuristic detection.
    #[must_use]
    pub fn without_model(mut self) -> Self {
        self.model = None;
        self
    }

    /// Returns `true` if cancellation has been requested.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
