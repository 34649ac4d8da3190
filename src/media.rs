//! FFmpeg-backed [`FrameSource`].
//!
//! [`MediaFile`] opens a container, picks the best video stream, and renders
//! downscaled RGBA frames at arbitrary timestamps: it seeks to the nearest
//! preceding keyframe, decodes forward to the frame on screen at the target,
//! and scales it with a cached `swscale` context.
//!
//! # Example
//!
//! ```no_run
//! use shotlens::{FrameSource, MediaFile};
//!
//! let mut media = MediaFile::open("input.mp4")?;
//! let mut rgba = Vec::new();
//! media.capture(1.5, 64, 36, &mut rgba)?;
//! assert_eq!(rgba.len(), 64 * 36 * 4);
//! # Ok::<(), shotlens::AnalysisError>(())
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
    util::log::Level,
};

use crate::conversion::{clamp_seek_target, copy_frame_into, pts_to_seconds, seconds_to_seek_timestamp};
use crate::error::AnalysisError;
use crate::source::FrameSource;

/// FFmpeg's own console verbosity.
///
/// This does not affect the `log` output of this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    Quiet,
    Fatal,
    Error,
    Warning,
    Info,
    Verbose,
    Debug,
}

impl FfmpegLogLevel {
    fn to_ffmpeg_level(self) -> Level {
        match self {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Fatal => Level::Fatal,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Verbose => Level::Verbose,
            FfmpegLogLevel::Debug => Level::Debug,
        }
    }
}

impl FromStr for FfmpegLogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "quiet" => Ok(FfmpegLogLevel::Quiet),
            "fatal" => Ok(FfmpegLogLevel::Fatal),
            "error" => Ok(FfmpegLogLevel::Error),
            "warning" | "warn" => Ok(FfmpegLogLevel::Warning),
            "info" => Ok(FfmpegLogLevel::Info),
            "verbose" => Ok(FfmpegLogLevel::Verbose),
            "debug" => Ok(FfmpegLogLevel::Debug),
            other => Err(format!("unknown FFmpeg log level `{other}`")),
        }
    }
}

struct CachedScaler {
    key: (Pixel, u32, u32, u32, u32),
    context: ScalingContext,
}

/// An opened media file that renders frames for analysis.
pub struct MediaFile {
    input_context: Input,
    decoder: VideoDecoder,
    video_stream_index: usize,
    time_base: Rational,
    duration: f64,
    frames_per_second: f64,
    file_size: u64,
    name: String,
    path: PathBuf,
    scaler: Option<CachedScaler>,
    decoded: VideoFrame,
    scaled: VideoFrame,
}

impl Debug for MediaFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MediaFile")
            .field("path", &self.path)
            .field("video_stream_index", &self.video_stream_index)
            .field("duration", &self.duration)
            .field("frames_per_second", &self.frames_per_second)
            .field("file_size", &self.file_size)
            .finish_non_exhaustive()
    }
}

impl MediaFile {
    /// Open a media file.
    ///
    /// Initializes FFmpeg (idempotent), opens the container, and prepares a
    /// decoder for the best video stream.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::FileOpen`] if the file cannot be opened or
    /// its decoder cannot be created, and [`AnalysisError::NoVideoStream`]
    /// if it has no video.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        let path = path.as_ref().to_path_buf();
        log::debug!("Opening media file: {}", path.display());

        let open_error = |reason: String| AnalysisError::FileOpen {
            path: path.clone(),
            reason,
        };

        ffmpeg_next::init()
            .map_err(|error| open_error(format!("FFmpeg initialisation failed: {error}")))?;
        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| open_error(error.to_string()))?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(AnalysisError::NoVideoStream)?;
        let video_stream_index = stream.index();
        let time_base = stream.time_base();

        let frame_rate = stream.avg_frame_rate();
        let frames_per_second = if frame_rate.denominator() != 0 {
            frame_rate.numerator() as f64 / frame_rate.denominator() as f64
        } else {
            let rate = stream.rate();
            if rate.denominator() != 0 {
                rate.numerator() as f64 / rate.denominator() as f64
            } else {
                0.0
            }
        };

        let container_duration = input_context.duration();
        let duration = if container_duration > 0 {
            container_duration as f64 / 1_000_000.0
        } else if stream.duration() > 0 {
            pts_to_seconds(stream.duration(), time_base)
        } else {
            0.0
        };

        let decoder = CodecContext::from_parameters(stream.parameters())
            .and_then(|context| context.decoder().video())
            .map_err(|error| open_error(format!("Failed to create video decoder: {error}")))?;

        let file_size = std::fs::metadata(&path).map(|meta| meta.len()).unwrap_or(0);
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        log::debug!(
            "Video stream {video_stream_index}: {}x{} @ {frames_per_second:.3} fps, {duration:.3}s, {file_size} bytes",
            decoder.width(),
            decoder.height()
        );

        Ok(Self {
            input_context,
            decoder,
            video_stream_index,
            time_base,
            duration,
            frames_per_second,
            file_size,
            name,
            path,
            scaler: None,
            decoded: VideoFrame::empty(),
            scaled: VideoFrame::empty(),
        })
    }

    /// Set FFmpeg's own console verbosity for the whole process.
    pub fn set_log_level(level: FfmpegLogLevel) {
        ffmpeg_next::util::log::set_level(level.to_ffmpeg_level());
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Average frame rate of the video stream, or 0 if unknown.
    pub fn frames_per_second(&self) -> f64 {
        self.frames_per_second
    }

    /// Decode forward until `self.decoded` holds the frame shown at `target`.
    fn decode_to(&mut self, target: f64) -> Result<bool, AnalysisError> {
        let tolerance = if self.frames_per_second > 0.0 {
            0.5 / self.frames_per_second
        } else {
            0.0
        };
        let mut have_frame = false;

        for (stream, packet) in self.input_context.packets() {
            if stream.index() != self.video_stream_index {
                continue;
            }
            self.decoder.send_packet(&packet)?;
            while self.decoder.receive_frame(&mut self.decoded).is_ok() {
                have_frame = true;
                let pts = self
                    .decoded
                    .timestamp()
                    .or_else(|| self.decoded.pts())
                    .unwrap_or(0);
                if pts_to_seconds(pts, self.time_base) + tolerance >= target {
                    return Ok(true);
                }
            }
        }

        self.decoder.send_eof()?;
        while self.decoder.receive_frame(&mut self.decoded).is_ok() {
            have_frame = true;
            let pts = self
                .decoded
                .timestamp()
                .or_else(|| self.decoded.pts())
                .unwrap_or(0);
            if pts_to_seconds(pts, self.time_base) + tolerance >= target {
                return Ok(true);
            }
        }

        // Past the last frame: keep the final decoded one.
        Ok(have_frame)
    }

    fn scale_into(&mut self, width: u32, height: u32, buffer: &mut Vec<u8>) -> Result<(), AnalysisError> {
        let key = (
            self.decoded.format(),
            self.decoded.width(),
            self.decoded.height(),
            width,
            height,
        );
        if self.scaler.as_ref().is_none_or(|cached| cached.key != key) {
            let context = ScalingContext::get(
                key.0,
                key.1,
                key.2,
                Pixel::RGBA,
                width,
                height,
                ScalingFlags::BILINEAR,
            )?;
            self.scaler = Some(CachedScaler { key, context });
        }
        if let Some(cached) = self.scaler.as_mut() {
            cached.context.run(&self.decoded, &mut self.scaled)?;
        }
        copy_frame_into(&self.scaled, width, height, 4, buffer);
        Ok(())
    }
}

impl FrameSource for MediaFile {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn size_hint(&self) -> u64 {
        self.file_size
    }

    fn capture(
        &mut self,
        timestamp: f64,
        width: u32,
        height: u32,
        buffer: &mut Vec<u8>,
    ) -> Result<(), AnalysisError> {
        let target = clamp_seek_target(timestamp, self.duration);
        let seek_timestamp = seconds_to_seek_timestamp(target);
        self.input_context
            .seek(seek_timestamp, ..seek_timestamp)
            .map_err(|error| AnalysisError::SeekFailed {
                timestamp: target,
                reason: error.to_string(),
            })?;
        self.decoder.flush();

        if !self.decode_to(target)? {
            return Err(AnalysisError::VideoDecodeError(format!(
                "no frame decoded at {target:.3}s"
            )));
        }
        self.scale_into(width, height, buffer)
    }
}
