//! Edit decision list parsing.
//!
//! Reads a CMX-3600-style EDL into a sorted, deduplicated list of cut times
//! in seconds, relative to the first event's record-in.
//!
//! ```text
//! TITLE: REEL ONE
//! FCM: NON-DROP FRAME
//!
//! 001  AX       V     C        01:00:00:00 01:00:04:10 01:00:00:00 01:00:04:10
//! 002  AX       V     C        01:00:10:00 01:00:12:00 01:00:04:10 01:00:06:10
//! ```
//!
//! The frame rate is inferred: 24 fps by default, 29.97 when the `FCM:` line
//! announces drop frame, then raised to 25, 30, 50 or 60 if any timecode's
//! frame field is too large for the current rate.
//!
//! # Example
//!
//! ```
//! use shotlens::edl::EdlCutList;
//!
//! let edl = b"001  AX  V  C  01:00:00:00 01:00:02:00 01:00:00:00 01:00:02:00\n\
//!             002  AX  V  C  01:00:05:00 01:00:07:12 01:00:02:00 01:00:04:12\n";
//! let list = EdlCutList::parse(edl)?;
//! assert_eq!(list.frame_rate, 24.0);
//! assert_eq!(list.cuts, vec![0.0, 2.0, 4.5]);
//! # Ok::<(), shotlens::edl::EdlError>(())
//! ```

use std::path::Path;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use thiserror::Error;

/// Frame rate assumed when nothing in the file says otherwise.
pub const DEFAULT_FRAME_RATE: f64 = 24.0;
/// Frame rate assumed for drop-frame timecode.
pub const DROP_FRAME_RATE: f64 = 29.97;
/// Cuts closer than this are merged.
pub const DEDUP_EPSILON: f64 = 0.001;

static FCM_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*FCM:\s*(.*)$").expect("FCM pattern is valid"));

static TIMECODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2}):(\d{2}):(\d{2})[:;](\d{2})").expect("timecode pattern is valid")
});

static EVENT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^\s*\d+\s+\S+\s+\S+\s+\S+(?:\s+\d+)?",
        r"\s+(\d{2}:\d{2}:\d{2}[:;]\d{2})",
        r"\s+(\d{2}:\d{2}:\d{2}[:;]\d{2})",
        r"\s+(\d{2}:\d{2}:\d{2}[:;]\d{2})",
        r"\s+(\d{2}:\d{2}:\d{2}[:;]\d{2})",
    ))
    .expect("event pattern is valid")
});

/// Errors from reading an edit decision list.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EdlError {
    /// No line matched the event pattern.
    #[error("No edit events found in decision list")]
    NoEvents,

    /// The file could not be read.
    #[error("Failed to read decision list: {0}")]
    Io(#[from] std::io::Error),
}

/// A parsed cut list.
#[derive(Debug, Clone, PartialEq)]
pub struct EdlCutList {
    /// Strictly increasing cut times in seconds, at least 1 ms apart.
    pub cuts: Vec<f64>,
    /// Frame rate used to convert frame fields to seconds.
    pub frame_rate: f64,
    /// Whether the `FCM:` line announced drop-frame timecode.
    pub drop_frame: bool,
    /// Number of event lines matched.
    pub event_count: usize,
}

#[derive(Debug, Clone, Copy)]
struct Timecode {
    hours: u32,
    minutes: u32,
    seconds: u32,
    frames: u32,
}

impl Timecode {
    fn from_captures(captures: &Captures<'_>) -> Option<Self> {
        let field = |index: usize| captures.get(index)?.as_str().parse::<u32>().ok();
        Some(Self {
            hours: field(1)?,
            minutes: field(2)?,
            seconds: field(3)?,
            frames: field(4)?,
        })
    }

    fn parse(text: &str) -> Option<Self> {
        TIMECODE
            .captures(text)
            .and_then(|captures| Self::from_captures(&captures))
    }

    fn to_seconds(self, frame_rate: f64) -> f64 {
        f64::from(self.hours) * 3600.0
            + f64::from(self.minutes) * 60.0
            + f64::from(self.seconds)
            + f64::from(self.frames) / frame_rate
    }
}

/// The smallest standard rate that can hold frame numbers up to `max_frame`.
///
/// # Example
///
/// ```
/// use shotlens::edl::rate_for_max_frame;
///
/// assert_eq!(rate_for_max_frame(10), 24.0);
/// assert_eq!(rate_for_max_frame(26), 30.0);
/// assert_eq!(rate_for_max_frame(31), 50.0);
/// ```
pub fn rate_for_max_frame(max_frame: u32) -> f64 {
    match max_frame {
        50.. => 60.0,
        30.. => 50.0,
        25.. => 30.0,
        24 => 25.0,
        _ => DEFAULT_FRAME_RATE,
    }
}

fn is_drop_frame_marker(value: &str) -> bool {
    let value = value.to_ascii_uppercase();
    value.contains("DROP") && !value.contains("NON-DROP") && !value.contains("NON DROP")
}

impl EdlCutList {
    /// Parse raw EDL bytes. Invalid UTF-8 is replaced, not rejected.
    ///
    /// # Errors
    ///
    /// Returns [`EdlError::NoEvents`] if no event line is found.
    pub fn parse(bytes: &[u8]) -> Result<Self, EdlError> {
        let text = String::from_utf8_lossy(bytes);
        let lines: Vec<&str> = text.lines().collect();

        let drop_frame = lines
            .iter()
            .filter_map(|line| FCM_LINE.captures(line))
            .filter_map(|captures| captures.get(1))
            .any(|value| is_drop_frame_marker(value.as_str()));
        let mut frame_rate = if drop_frame {
            DROP_FRAME_RATE
        } else {
            DEFAULT_FRAME_RATE
        };

        let max_frame = lines
            .iter()
            .flat_map(|line| TIMECODE.captures_iter(line))
            .filter_map(|captures| Timecode::from_captures(&captures))
            .map(|timecode| timecode.frames)
            .max();
        if let Some(max_frame) = max_frame {
            let refined = rate_for_max_frame(max_frame);
            // 30 over 29.97 is the same family, not a refinement.
            if refined - frame_rate > 0.1 {
                frame_rate = refined;
            }
        }

        let mut origin: Option<f64> = None;
        let mut times = Vec::new();
        let mut event_count = 0;
        for line in &lines {
            let trimmed = line.trim_start();
            if trimmed.starts_with('*')
                || trimmed.to_ascii_uppercase().starts_with("TITLE:")
                || FCM_LINE.is_match(line)
            {
                continue;
            }
            let Some(captures) = EVENT_LINE.captures(line) else {
                continue;
            };
            let (Some(record_in), Some(record_out)) = (
                captures.get(3).and_then(|m| Timecode::parse(m.as_str())),
                captures.get(4).and_then(|m| Timecode::parse(m.as_str())),
            ) else {
                continue;
            };
            event_count += 1;

            let record_in = record_in.to_seconds(frame_rate);
            let record_out = record_out.to_seconds(frame_rate);
            let origin = *origin.get_or_insert(record_in);
            times.push(record_in - origin);
            times.push(record_out - origin);
        }

        if event_count == 0 {
            return Err(EdlError::NoEvents);
        }

        times.retain(|time| *time >= 0.0);
        times.sort_by(f64::total_cmp);
        let mut cuts: Vec<f64> = Vec::with_capacity(times.len());
        for time in times {
            if cuts.last().is_none_or(|last| time - last > DEDUP_EPSILON) {
                cuts.push(time);
            }
        }

        log::debug!(
            "Parsed {event_count} EDL events into {} cuts at {frame_rate} fps (drop frame: {drop_frame})",
            cuts.len()
        );

        Ok(Self {
            cuts,
            frame_rate,
            drop_frame,
            event_count,
        })
    }

    /// Read and parse an EDL file.
    ///
    /// # Errors
    ///
    /// Returns [`EdlError::Io`] if the file cannot be read, or
    /// [`EdlError::NoEvents`] if it holds no events.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, EdlError> {
        let bytes = std::fs::read(path)?;
        Self::parse(&bytes)
    }
}
