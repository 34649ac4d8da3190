//! The analysis driver.
//!
//! [`Analyzer`] runs one analysis over a [`FrameSource`]:
//!
//! 1. An edit decision list, if supplied and parseable, fixes the cuts.
//! 2. Otherwise the learned model, if configured and loadable, is tried.
//!    Any load or inference failure, or a run with no cuts, falls back to
//!    heuristic detection.
//! 3. The chosen [`CutDetector`] plans the samples. Each one is captured,
//!    turned into a feature on the worker thread, and ingested.
//! 4. The shot and frame lists are aggregated into an [`AnalysisResult`].
//!
//! Cancellation is checked before every capture and after every worker
//! round trip. A cancelled run yields [`AnalysisOutcome::Cancelled`], never
//! a partial result.
//!
//! # Example
//!
//! ```no_run
//! use shotlens::{AnalysisOptions, AnalysisOutcome, Analyzer, MediaFile};
//!
//! let mut media = MediaFile::open("input.mp4")?;
//! let analyzer = Analyzer::new(AnalysisOptions::new());
//! if let AnalysisOutcome::Completed(result) = analyzer.analyze(&mut media, None)? {
//!     println!("{} shots, ASL {:.2}s", result.shots.len(), result.asl);
//! }
//! # Ok::<(), shotlens::AnalysisError>(())
//! ```

use std::path::Path;

use crate::aggregate::{DensityPoint, PaletteEntry, PolarPoint, aggregate};
use crate::configuration::AnalysisOptions;
use crate::detector::{CutDetector, DetectionMethod, Shot};
use crate::edl::EdlCutList;
use crate::error::AnalysisError;
use crate::features::FrameFeature;
use crate::media::MediaFile;
use crate::model::{self, SharedModel};
use crate::progress::{AnalysisStage, ProgressReporter};
use crate::source::{ANALYSIS_HEIGHT, ANALYSIS_WIDTH, FrameSource, SamplingPolicy};
use crate::worker::FeatureWorker;

/// Everything measured about one video.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    /// Display name of the source.
    pub file_name: String,
    /// Shots in time order, tiling `[0, duration)`.
    pub shots: Vec<Shot>,
    /// Sampled (or backfilled) frame features in time order.
    pub frames: Vec<FrameFeature>,
    /// Total duration in seconds.
    pub duration: f64,
    /// Average shot length in seconds.
    pub asl: f64,
    /// Median shot length in seconds (upper middle for even counts).
    pub msl: f64,
    /// Cuts per minute over time.
    pub cutting_density: Vec<DensityPoint>,
    /// Up to ten colors of the longest shots.
    pub palette: Vec<PaletteEntry>,
    /// Hue and saturation per frame.
    pub polar: Vec<PolarPoint>,
    /// Which path produced the shot boundaries.
    pub detection: DetectionMethod,
}

/// How an analysis run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Completed(AnalysisResult),
    /// The cancellation token fired. No partial result is kept.
    Cancelled,
}

impl AnalysisOutcome {
    /// The result, if the run completed.
    pub fn into_result(self) -> Option<AnalysisResult> {
        match self {
            AnalysisOutcome::Completed(result) => Some(result),
            AnalysisOutcome::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, AnalysisOutcome::Cancelled)
    }
}

/// Runs analyses with a fixed set of options.
pub struct Analyzer {
    options: AnalysisOptions,
    model: Option<SharedModel>,
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("options", &self.options)
            .field("has_boundary_model", &self.model.is_some())
            .finish()
    }
}

impl Analyzer {
    pub fn new(options: AnalysisOptions) -> Self {
        Self {
            options,
            model: None,
        }
    }

    /// Use an already loaded boundary model instead of the one named by
    /// [`AnalysisOptions::with_model`].
    #[must_use]
    pub fn with_boundary_model(mut self, model: SharedModel) -> Self {
        self.model = Some(model);
        self
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Analyze `source`, optionally driven by raw edit-decision-list bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the source has an unusable duration, a capture
    /// fails, or the feature worker dies. EDL and model problems are not
    /// errors: they fall back to automatic detection.
    pub fn analyze(
        &self,
        source: &mut dyn FrameSource,
        edl: Option<&[u8]>,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        match self.run(source, edl) {
            Ok(result) => Ok(AnalysisOutcome::Completed(result)),
            Err(AnalysisError::Cancelled) => {
                log::info!("Analysis of {} cancelled", source.name());
                Ok(AnalysisOutcome::Cancelled)
            }
            Err(error) => Err(error),
        }
    }

    fn run(
        &self,
        source: &mut dyn FrameSource,
        edl: Option<&[u8]>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let options = &self.options;
        if options.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }

        let duration = source.duration();
        if !duration.is_finite() || duration <= 0.0 {
            return Err(AnalysisError::InvalidDuration(duration));
        }

        let mut reporter = ProgressReporter::new(options.progress.clone());
        let mut detector = self.choose_detector(source, duration, edl, &mut reporter)?;

        let step = options.sample_step.unwrap_or_else(|| {
            SamplingPolicy::for_size(options.size_hint.unwrap_or_else(|| source.size_hint())).step
        });
        let plan = detector.sample_plan(duration, step);
        log::debug!(
            "Sampling {} points of {} ({duration:.3}s) with {} detection, step {step}s",
            plan.len(),
            source.name(),
            detector.method()
        );

        let mut worker = FeatureWorker::spawn()?;
        let mut pixels = Vec::with_capacity((ANALYSIS_WIDTH * ANALYSIS_HEIGHT * 4) as usize);
        let mut shots = Vec::new();
        let mut frames = Vec::with_capacity(plan.len());

        for point in &plan {
            if options.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }
            source.capture(point.time, ANALYSIS_WIDTH, ANALYSIS_HEIGHT, &mut pixels)?;

            let (feature, returned) =
                worker.extract(point.time, ANALYSIS_WIDTH, ANALYSIS_HEIGHT, pixels)?;
            pixels = returned;
            if options.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }

            let ingested =
                detector.ingest(point, feature, &pixels, ANALYSIS_WIDTH, ANALYSIS_HEIGHT)?;
            shots.extend(ingested.shot);
            frames.extend(ingested.frames);

            reporter.report_fraction(AnalysisStage::Sampling, point.progress_time, duration);
        }
        drop(worker);

        shots.extend(detector.finish(duration)?);
        reporter.report(AnalysisStage::Finalizing, 100.0);

        Ok(aggregate(
            source.name().to_string(),
            shots,
            frames,
            duration,
            detector.method(),
        ))
    }

    fn choose_detector(
        &self,
        source: &mut dyn FrameSource,
        duration: f64,
        edl: Option<&[u8]>,
        reporter: &mut ProgressReporter,
    ) -> Result<CutDetector, AnalysisError> {
        if let Some(bytes) = edl {
            match EdlCutList::parse(bytes) {
                Ok(list) => match CutDetector::from_edl_cuts(&list.cuts, duration) {
                    Some(detector) => return Ok(detector),
                    None => log::warn!(
                        "Edit decision list has no cuts inside the video; detecting automatically"
                    ),
                },
                Err(error) => {
                    log::warn!("Ignoring edit decision list ({error}); detecting automatically")
                }
            }
        }

        let Some(model) = self.resolve_model() else {
            return Ok(CutDetector::heuristic());
        };

        match model::detect_cuts(source, &model, duration, &self.options, reporter) {
            Ok(Some(cuts)) => Ok(CutDetector::from_model_cuts(cuts)),
            Ok(None) => {
                log::info!("Boundary model found no cuts; using heuristic detection");
                Ok(CutDetector::heuristic())
            }
            Err(AnalysisError::Cancelled) => Err(AnalysisError::Cancelled),
            Err(error) => {
                log::info!("Boundary model failed ({error}); using heuristic detection");
                Ok(CutDetector::heuristic())
            }
        }
    }

    fn resolve_model(&self) -> Option<SharedModel> {
        if let Some(model) = &self.model {
            return Some(model.clone());
        }
        let config = self.options.model.as_ref()?;
        match model::load_shared_model(config) {
            Ok(model) => Some(model),
            Err(error) => {
                log::info!("{error}; using heuristic detection");
                None
            }
        }
    }
}

/// Open `path` with FFmpeg and analyze it.
///
/// `edl` is the raw content of an edit decision list, not a path.
///
/// # Errors
///
/// See [`MediaFile::open`] and [`Analyzer::analyze`].
pub fn analyze_file<P: AsRef<Path>>(
    path: P,
    options: &AnalysisOptions,
    edl: Option<&[u8]>,
) -> Result<AnalysisOutcome, AnalysisError> {
    let mut media = MediaFile::open(path)?;
    Analyzer::new(options.clone()).analyze(&mut media, edl)
}
