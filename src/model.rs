//! Learned shot-boundary detection.
//!
//! A [`BoundaryModel`] scores windows of 100 tiny frames (48×27 RGB in
//! `[0, 1]`) and returns, per frame, the probability that a shot boundary
//! falls there. Windows advance by 50 frames and only the central 50
//! predictions of each are kept; a frame covered twice keeps the larger
//! score. Local maxima above 0.55 that are at least 0.35 s apart become cuts.
//!
//! The ONNX Runtime backend lives behind the `onnx` feature. Without it,
//! [`load_shared_model`] reports the model as unavailable and the analyzer
//! falls back to heuristic detection.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use once_cell::sync::{Lazy, OnceCell};

use crate::configuration::{AnalysisOptions, ModelConfig};
use crate::error::AnalysisError;
use crate::progress::ProgressReporter;
use crate::source::{FrameSource, MODEL_HEIGHT, MODEL_WIDTH};

/// Frames per inference window.
pub const WINDOW_FRAMES: usize = 100;
/// Frames between the starts of consecutive windows.
pub const WINDOW_STRIDE: usize = 50;
/// First kept prediction within a window.
pub const CENTRAL_START: usize = 25;
/// Number of kept predictions per window.
pub const CENTRAL_LENGTH: usize = 50;
/// Minimum boundary probability for a cut.
pub const BOUNDARY_THRESHOLD: f32 = 0.55;
/// Minimum spacing between detected cuts in seconds.
pub const MIN_CUT_SPACING: f64 = 0.35;
/// Cuts closer than this to their predecessor are dropped after merging.
pub const CUT_MERGE_GAP: f64 = 0.2;
/// Values per frame in the input tensor.
pub const FRAME_VALUES: usize = (MODEL_WIDTH * MODEL_HEIGHT * 3) as usize;

const PROGRESS_INTERVAL: usize = 10;

/// Per-frame outputs of one window. Either head may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelOutput {
    /// Single-frame boundary probabilities.
    pub single_frame: Vec<f32>,
    /// Many-hot boundary probabilities.
    pub many_hot: Vec<f32>,
}

impl ModelOutput {
    /// The larger of the two heads at `index`; a missing value counts as 0.
    pub fn probability(&self, index: usize) -> f32 {
        let a = self.single_frame.get(index).copied().unwrap_or(0.0);
        let b = self.many_hot.get(index).copied().unwrap_or(0.0);
        a.max(b)
    }
}

/// A shot-boundary model that scores one window at a time.
pub trait BoundaryModel: Send {
    /// Score `frames` frames packed as `[frames, 27, 48, 3]` f32 RGB.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::ModelInference`] if inference fails.
    fn predict(&mut self, input: &[f32], frames: usize) -> Result<ModelOutput, AnalysisError>;
}

/// A model shared between runs. Inference is serialized by the mutex.
pub type SharedModel = Arc<Mutex<dyn BoundaryModel>>;

/// Frames per second sampled for the model, by duration tier.
///
/// # Example
///
/// ```
/// use shotlens::model::analysis_fps;
///
/// assert_eq!(analysis_fps(120.0), 8.0);
/// assert_eq!(analysis_fps(20.0 * 60.0), 5.0);
/// assert_eq!(analysis_fps(3.0 * 3600.0), 2.0);
/// ```
pub fn analysis_fps(duration: f64) -> f64 {
    if duration <= 10.0 * 60.0 {
        8.0
    } else if duration <= 30.0 * 60.0 {
        5.0
    } else if duration <= 90.0 * 60.0 {
        3.0
    } else {
        2.0
    }
}

/// Number of model frames covering `duration` at `fps`. Always at least 1.
pub fn total_frames(duration: f64, fps: f64) -> usize {
    ((duration * fps).floor().max(0.0) as usize + 1).max(1)
}

/// Times of local probability maxima above the boundary threshold.
///
/// Only interior frames are considered. A peak must not be lower than
/// either neighbour and must be at least [`MIN_CUT_SPACING`] after the
/// previous accepted peak.
pub fn pick_peaks(predictions: &[f32], fps: f64) -> Vec<f64> {
    let mut cuts = Vec::new();
    let mut last_cut = f64::NEG_INFINITY;
    for index in 1..predictions.len().saturating_sub(1) {
        let p = predictions[index];
        if p < BOUNDARY_THRESHOLD || p < predictions[index - 1] || p < predictions[index + 1] {
            continue;
        }
        let time = index as f64 / fps;
        if time - last_cut < MIN_CUT_SPACING {
            continue;
        }
        cuts.push(time);
        last_cut = time;
    }
    cuts
}

/// Turn raw model cuts into a cut list anchored at 0.
///
/// Prepends 0, keeps `0 ≤ t < duration`, sorts, and drops cuts within
/// [`CUT_MERGE_GAP`] of their predecessor.
pub fn normalize_model_cuts(cuts: &[f64], duration: f64) -> Vec<f64> {
    let mut all: Vec<f64> = std::iter::once(0.0)
        .chain(cuts.iter().copied())
        .filter(|time| *time >= 0.0 && *time < duration)
        .collect();
    all.sort_by(f64::total_cmp);

    let mut normalized: Vec<f64> = Vec::with_capacity(all.len());
    for time in all {
        if normalized
            .last()
            .is_none_or(|last| (time - last).abs() > CUT_MERGE_GAP)
        {
            normalized.push(time);
        }
    }
    normalized
}

fn pack_frame(rgba: &[u8], window: &mut [f32]) {
    for (out, pixel) in window.chunks_exact_mut(3).zip(rgba.chunks_exact(4)) {
        out[0] = f32::from(pixel[0]) / 255.0;
        out[1] = f32::from(pixel[1]) / 255.0;
        out[2] = f32::from(pixel[2]) / 255.0;
    }
}

/// Score every model frame of `source` and return the per-frame maxima.
pub(crate) fn score_frames(
    source: &mut dyn FrameSource,
    model: &SharedModel,
    duration: f64,
    options: &AnalysisOptions,
    reporter: &mut ProgressReporter,
) -> Result<Vec<f32>, AnalysisError> {
    let fps = analysis_fps(duration);
    let total = total_frames(duration, fps);
    let mut predictions = vec![0.0f32; total];
    let mut window = vec![0.0f32; WINDOW_FRAMES * FRAME_VALUES];
    let mut rgba = Vec::with_capacity((MODEL_WIDTH * MODEL_HEIGHT * 4) as usize);

    log::debug!("Scoring {total} frames at {fps} fps with the boundary model");

    for start in (0..total).step_by(WINDOW_STRIDE) {
        for k in 0..WINDOW_FRAMES {
            if options.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }
            let frame_index = (start + k).min(total - 1);
            let time = frame_index as f64 / fps;
            source.capture(time, MODEL_WIDTH, MODEL_HEIGHT, &mut rgba)?;
            pack_frame(
                &rgba,
                &mut window[k * FRAME_VALUES..(k + 1) * FRAME_VALUES],
            );
            if k % PROGRESS_INTERVAL == 0 {
                let percent = (frame_index as f64 / total as f64 * 100.0).round() as f32;
                reporter.report_model(percent);
            }
        }

        let output = {
            let mut guard = model
                .lock()
                .map_err(|_| AnalysisError::ModelInference("model lock poisoned".to_string()))?;
            guard.predict(&window, WINDOW_FRAMES)?
        };

        for offset in 0..CENTRAL_LENGTH {
            let local = CENTRAL_START + offset;
            let global = start + local;
            if global >= total {
                break;
            }
            let p = output.probability(local);
            if p > predictions[global] {
                predictions[global] = p;
            }
        }
    }

    Ok(predictions)
}

/// Run the model over `source` and return a normalized cut list.
///
/// Returns `Ok(None)` when the model finds no cuts.
pub(crate) fn detect_cuts(
    source: &mut dyn FrameSource,
    model: &SharedModel,
    duration: f64,
    options: &AnalysisOptions,
    reporter: &mut ProgressReporter,
) -> Result<Option<Vec<f64>>, AnalysisError> {
    let predictions = score_frames(source, model, duration, options, reporter)?;
    let peaks = pick_peaks(&predictions, analysis_fps(duration));
    if peaks.is_empty() {
        return Ok(None);
    }
    log::debug!("Boundary model found {} cuts", peaks.len());
    Ok(Some(normalize_model_cuts(&peaks, duration)))
}

static MODEL_CACHE: Lazy<Mutex<HashMap<PathBuf, Arc<OnceCell<SharedModel>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Load the model described by `config`, reusing a process-wide instance.
///
/// Each model file is loaded at most once per process; concurrent callers
/// for the same file wait for the first load. A failed load is not cached.
///
/// # Errors
///
/// Returns [`AnalysisError::ModelUnavailable`] if no model file exists or
/// the runtime cannot load it.
pub fn load_shared_model(config: &ModelConfig) -> Result<SharedModel, AnalysisError> {
    let path = config.resolve().ok_or_else(|| {
        AnalysisError::ModelUnavailable(format!("no model file found for {config:?}"))
    })?;

    let cell = {
        let mut cache = MODEL_CACHE
            .lock()
            .map_err(|_| AnalysisError::ModelUnavailable("model cache poisoned".to_string()))?;
        Arc::clone(cache.entry(path.clone()).or_default())
    };

    cell.get_or_try_init(|| load_model_file(&path)).cloned()
}

#[cfg(feature = "onnx")]
fn load_model_file(path: &Path) -> Result<SharedModel, AnalysisError> {
    let model = onnx::OnnxBoundaryModel::from_file(path)?;
    log::info!("Loaded shot-boundary model from {}", path.display());
    Ok(Arc::new(Mutex::new(model)))
}

#[cfg(not(feature = "onnx"))]
fn load_model_file(path: &Path) -> Result<SharedModel, AnalysisError> {
    Err(AnalysisError::ModelUnavailable(format!(
        "{} found, but shotlens was built without the `onnx` feature",
        path.display()
    )))
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxBoundaryModel;

#[cfg(feature = "onnx")]
mod onnx {
    use std::path::Path;

    use ort::session::Session;
    use ort::session::builder::GraphOptimizationLevel;
    use ort::value::{Tensor, Value};

    use super::{BoundaryModel, FRAME_VALUES, ModelOutput};
    use crate::error::AnalysisError;
    use crate::source::{MODEL_HEIGHT, MODEL_WIDTH};

    /// A boundary model executed by ONNX Runtime.
    pub struct OnnxBoundaryModel {
        session: Session,
        output_names: Vec<String>,
    }

    impl OnnxBoundaryModel {
        /// Load a model file.
        ///
        /// # Errors
        ///
        /// Returns [`AnalysisError::ModelUnavailable`] if the file cannot be
        /// read or the session cannot be created.
        pub fn from_file(path: &Path) -> Result<Self, AnalysisError> {
            let model_bytes = std::fs::read(path).map_err(|error| {
                AnalysisError::ModelUnavailable(format!("{}: {error}", path.display()))
            })?;
            let session = Session::builder()
                .map_err(|error| AnalysisError::ModelUnavailable(error.to_string()))?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .map_err(|error| AnalysisError::ModelUnavailable(error.to_string()))?
                .commit_from_memory(&model_bytes)
                .map_err(|error| AnalysisError::ModelUnavailable(error.to_string()))?;
            let output_names = session
                .outputs
                .iter()
                .map(|output| output.name.clone())
                .collect();
            Ok(Self {
                session,
                output_names,
            })
        }
    }

    impl BoundaryModel for OnnxBoundaryModel {
        fn predict(&mut self, input: &[f32], frames: usize) -> Result<ModelOutput, AnalysisError> {
            let shape = vec![
                1usize,
                frames,
                MODEL_HEIGHT as usize,
                MODEL_WIDTH as usize,
                3,
            ];
            let data = input[..frames * FRAME_VALUES].to_vec().into_boxed_slice();
            let tensor = Tensor::from_array((shape, data))
                .map(Value::from)
                .map_err(|error| AnalysisError::ModelInference(format!("tensor: {error}")))?;

            let outputs = self
                .session
                .run(ort::inputs![tensor])
                .map_err(|error| AnalysisError::ModelInference(error.to_string()))?;

            let mut heads = self.output_names.iter().map(|name| {
                outputs
                    .get(name.as_str())
                    .and_then(|value| value.try_extract_tensor::<f32>().ok())
                    .map(|(_, data)| data.to_vec())
                    .unwrap_or_default()
            });
            let single_frame = heads.next().unwrap_or_default();
            let many_hot = heads.next().unwrap_or_default();
            if single_frame.is_empty() && many_hot.is_empty() {
                return Err(AnalysisError::ModelInference(
                    "model returned no boundary scores".to_string(),
                ));
            }
            Ok(ModelOutput {
                single_frame,
                many_hot,
            })
        }
    }
}
