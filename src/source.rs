//! Frame access and sampling.
//!
//! The analyzer never talks to a decoder directly. It asks a [`FrameSource`]
//! for a downscaled RGBA raster at each sample time, so the same pipeline
//! runs over an FFmpeg-backed [`MediaFile`](crate::MediaFile) or a synthetic
//! source in tests.

use crate::error::AnalysisError;

/// Raster width used by the heuristic and edit-decision-list paths.
pub const ANALYSIS_WIDTH: u32 = 64;
/// Raster height used by the heuristic and edit-decision-list paths.
pub const ANALYSIS_HEIGHT: u32 = 36;
/// Raster width fed to the learned shot-boundary model.
pub const MODEL_WIDTH: u32 = 48;
/// Raster height fed to the learned shot-boundary model.
pub const MODEL_HEIGHT: u32 = 27;

const GIGABYTE: u64 = 1024 * 1024 * 1024;

/// A seekable video that can render downscaled RGBA frames.
///
/// Calls to [`capture`](FrameSource::capture) arrive in non-decreasing
/// timestamp order within one sampling pass, but a run may start a new pass
/// from zero (model scoring followed by the sampling walk).
pub trait FrameSource {
    /// Total duration in seconds.
    fn duration(&self) -> f64;

    /// Display name, usually the file name.
    fn name(&self) -> &str;

    /// Size of the underlying media in bytes, used to pick a sample step.
    fn size_hint(&self) -> u64;

    /// Render the frame shown at `timestamp` into `buffer` as tightly packed
    /// RGBA of exactly `width × height × 4` bytes.
    ///
    /// `buffer` is owned by the caller and reused between calls; it must be
    /// cleared or resized by the implementation.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::SeekFailed`] or a decode error. The analyzer
    /// does not retry.
    fn capture(
        &mut self,
        timestamp: f64,
        width: u32,
        height: u32,
        buffer: &mut Vec<u8>,
    ) -> Result<(), AnalysisError>;
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn duration(&self) -> f64 {
        (**self).duration()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn size_hint(&self) -> u64 {
        (**self).size_hint()
    }

    fn capture(
        &mut self,
        timestamp: f64,
        width: u32,
        height: u32,
        buffer: &mut Vec<u8>,
    ) -> Result<(), AnalysisError> {
        (**self).capture(timestamp, width, height, buffer)
    }
}

/// Sample step for the linear scan, keyed on input size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingPolicy {
    /// Seconds between samples.
    pub step: f64,
}

impl SamplingPolicy {
    /// Step used for inputs up to 2 GB.
    pub const FINE_STEP: f64 = 0.5;
    /// Step used for inputs above 2 GB.
    pub const COARSE_STEP: f64 = 1.0;

    /// Pick the step for a file of `bytes` bytes.
    ///
    /// # Example
    ///
    /// ```
    /// use shotlens::SamplingPolicy;
    ///
    /// assert_eq!(SamplingPolicy::for_size(100 * 1024 * 1024).step, 0.5);
    /// assert_eq!(SamplingPolicy::for_size(3 * 1024 * 1024 * 1024).step, 1.0);
    /// ```
    pub fn for_size(bytes: u64) -> Self {
        let step = if bytes > 2 * GIGABYTE {
            Self::COARSE_STEP
        } else {
            Self::FINE_STEP
        };
        Self { step }
    }
}

/// Sample times `0, step, 2·step, …` strictly below `duration`.
///
/// Times are computed by multiplication rather than accumulation so long
/// inputs do not drift.
pub fn sample_times(duration: f64, step: f64) -> Vec<f64> {
    if !duration.is_finite() || !step.is_finite() || duration <= 0.0 || step <= 0.0 {
        return Vec::new();
    }
    let mut times = Vec::with_capacity((duration / step).ceil() as usize);
    let mut index = 0u64;
    loop {
        let time = index as f64 * step;
        if time >= duration {
            break;
        }
        times.push(time);
        index += 1;
    }
    times
}
