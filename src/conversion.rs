//! Internal conversion helpers.
//!
//! Pixel-data copying out of FFmpeg frames and timestamp conversions shared
//! by [`MediaFile`](crate::MediaFile) and the sampling driver.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Seek targets are kept this far before the end of the stream.
pub(crate) const END_OF_STREAM_MARGIN: f64 = 0.001;

/// Copy plane 0 of an FFmpeg video frame into `buffer`, removing row padding.
///
/// `buffer` is cleared and refilled so its allocation can be reused across
/// captures. `bytes_per_pixel` is 4 for RGBA.
pub(crate) fn copy_frame_into(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
    buffer: &mut Vec<u8>,
) {
    let stride = video_frame.stride(0);
    let row_bytes = (width as usize) * bytes_per_pixel;
    let rows = height as usize;
    let data = video_frame.data(0);

    buffer.clear();
    if stride == row_bytes {
        buffer.extend_from_slice(&data[..row_bytes * rows]);
    } else {
        buffer.reserve(row_bytes * rows);
        for row in 0..rows {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_bytes]);
        }
    }
}

/// Rescale a PTS value from stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Convert seconds to a seek timestamp in AV_TIME_BASE (microseconds).
///
/// `input_context.seek()` with no stream index expects container time.
pub(crate) fn seconds_to_seek_timestamp(seconds: f64) -> i64 {
    (seconds * 1_000_000.0) as i64
}

/// Clamp a sample time to `[0, duration - 0.001]`.
pub(crate) fn clamp_seek_target(timestamp: f64, duration: f64) -> f64 {
    let last = (duration - END_OF_STREAM_MARGIN).max(0.0);
    timestamp.clamp(0.0, last)
}
