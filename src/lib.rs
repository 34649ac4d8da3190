//! # shotlens
//!
//! Measure the editing rhythm and color composition of a video.
//!
//! `shotlens` samples a video, finds its shot boundaries, and describes it
//! quantitatively: per-shot dominant color and thumbnail, per-frame hue,
//! saturation and brightness, average and median shot length, a
//! cuts-per-minute curve, a dominant palette, and a polar color series.
//! Decoding is done by FFmpeg through
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next).
//!
//! ## Quick Start
//!
//! ```no_run
//! use shotlens::{AnalysisOptions, AnalysisOutcome, analyze_file};
//!
//! let outcome = analyze_file("input.mp4", &AnalysisOptions::new(), None)?;
//! if let AnalysisOutcome::Completed(result) = outcome {
//!     for shot in &result.shots {
//!         println!("#{} {:.2}s–{:.2}s {}", shot.id, shot.start, shot.end, shot.dominant_color);
//!     }
//!     println!("ASL {:.2}s, MSL {:.2}s", result.asl, result.msl);
//! }
//! # Ok::<(), shotlens::AnalysisError>(())
//! ```
//!
//! ### Driven by an Edit Decision List
//!
//! ```no_run
//! use shotlens::{AnalysisOptions, analyze_file};
//!
//! let edl = std::fs::read("cut.edl")?;
//! let outcome = analyze_file("input.mp4", &AnalysisOptions::new(), Some(&edl))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Detection paths
//!
//! - **Edit decision list**: authoritative cuts parsed from a CMX-3600-style
//!   EDL. An unparseable list falls back to automatic detection.
//! - **Learned model**: a window-based shot-boundary network executed with
//!   ONNX Runtime (feature `onnx`), tried first when configured.
//! - **Heuristic**: histogram, zonal-structure and luma-grid distances with
//!   adaptive thresholds. Always available.
//!
//! The analyzer works on any [`FrameSource`], so synthetic sources can stand
//! in for real media in tests.
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | [`stream::analyze_file_async`] runs an analysis on a Tokio blocking thread |
//! | `onnx` | ONNX Runtime backend for the learned shot-boundary model |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod aggregate;
pub mod analysis;
pub mod configuration;
mod conversion;
pub mod detector;
pub mod edl;
pub mod error;
pub mod features;
pub mod heuristic;
pub mod media;
pub mod model;
pub mod progress;
pub mod source;
#[cfg(feature = "async")]
pub mod stream;
pub mod thumbnail;
pub mod validation;
pub mod worker;

pub use aggregate::{DensityPoint, PaletteEntry, PolarPoint};
pub use analysis::{AnalysisOutcome, AnalysisResult, Analyzer, analyze_file};
pub use configuration::{AnalysisOptions, ModelConfig};
pub use detector::{CutDetector, DetectionMethod, Shot};
pub use edl::{EdlCutList, EdlError};
pub use error::AnalysisError;
pub use features::{FrameFeature, Histogram, Hsb, Rgb, extract_features};
pub use heuristic::{CutThresholds, DetectorTuning, FrameDiff, HeuristicDetector};
pub use media::{FfmpegLogLevel, MediaFile};
pub use model::{BoundaryModel, ModelOutput, SharedModel};
pub use progress::{AnalysisStage, CancellationToken, ProgressCallback, ProgressInfo};
pub use source::{FrameSource, SamplingPolicy, sample_times};
#[cfg(feature = "async")]
pub use stream::{AnalysisFuture, analyze_file_async, analyze_source_async};
pub use thumbnail::Thumbnail;
pub use validation::{ValidationReport, validate_result};
pub use worker::FeatureWorker;
