//! Error types for the `shotlens` crate.
//!
//! This module defines [`AnalysisError`], the error type returned by every
//! fallible analysis operation. Cancellation is modelled as a variant so the
//! sampling loop can propagate it with `?`, but the public entry points turn
//! it into [`AnalysisOutcome::Cancelled`](crate::AnalysisOutcome::Cancelled)
//! before it reaches the caller.
//!
//! Edit-decision-list parse failures use the separate
//! [`EdlError`](crate::edl::EdlError) because they are recoverable: the
//! analyzer falls back to automatic detection instead of aborting.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `shotlens` analysis operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnalysisError {
    /// The media file could not be opened.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::MediaFile::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// Seeking to a sample timestamp failed. Seeks are never retried.
    #[error("Failed to seek to {timestamp:.3}s: {reason}")]
    SeekFailed {
        /// The sample timestamp in seconds.
        timestamp: f64,
        /// Underlying reason the seek failed.
        reason: String,
    },

    /// A captured pixel buffer is smaller than its declared raster.
    #[error("Frame buffer holds {actual} bytes, expected {expected}")]
    InvalidFrameBuffer {
        /// Bytes required for `width × height` RGBA pixels.
        expected: usize,
        /// Bytes actually supplied.
        actual: usize,
    },

    /// The source reported a duration that cannot be analysed.
    #[error("Invalid media duration: {0}")]
    InvalidDuration(f64),

    /// The feature-extraction worker thread stopped responding.
    #[error("Feature extraction worker disconnected")]
    WorkerDisconnected,

    /// A background analysis task panicked before producing an outcome.
    #[error("Analysis task failed: {0}")]
    TaskFailed(String),

    /// The learned shot-boundary model could not be loaded.
    #[error("Shot-boundary model unavailable: {0}")]
    ModelUnavailable(String),

    /// The learned shot-boundary model failed during inference.
    #[error("Shot-boundary model inference failed: {0}")]
    ModelInference(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading input files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while encoding thumbnails.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The run was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Analysis cancelled")]
    Cancelled,
}

impl From<FfmpegError> for AnalysisError {
    fn from(error: FfmpegError) -> Self {
        AnalysisError::FfmpegError(error.to_string())
    }
}
