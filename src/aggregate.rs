//! Editing-rhythm and color statistics.
//!
//! Everything here is a pure function of the finished shot list and frame
//! list. [`aggregate`] assembles them into an [`AnalysisResult`].

use crate::analysis::AnalysisResult;
use crate::detector::{DetectionMethod, Shot};
use crate::features::FrameFeature;
use crate::thumbnail::Thumbnail;

/// Width of the cutting-density window in seconds.
pub const DENSITY_WINDOW: f64 = 20.0;
/// Spacing of cutting-density points in seconds.
pub const DENSITY_STEP: f64 = 2.0;
/// Maximum number of palette entries.
pub const PALETTE_SIZE: usize = 10;
/// Shots must be longer than this to enter the palette.
pub const PALETTE_MIN_DURATION: f64 = 1.0;

/// Cuts per minute around `time`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityPoint {
    pub time: f64,
    pub density: f64,
}

/// One color of the dominant palette.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteEntry {
    pub color: String,
    pub thumbnail: Option<Thumbnail>,
}

/// Hue and saturation of one frame, for polar plots.
#[derive(Debug, Clone, PartialEq)]
pub struct PolarPoint {
    pub time: f64,
    pub hue: f64,
    pub saturation: f64,
    pub color: String,
}

/// Average shot length: `duration / shots`, or 0 with no shots.
pub fn average_shot_length(shots: &[Shot], duration: f64) -> f64 {
    if shots.is_empty() {
        0.0
    } else {
        duration / shots.len() as f64
    }
}

/// Median shot length.
///
/// For an even number of shots this is the upper of the two middle values.
///
/// # Example
///
/// ```
/// use shotlens::aggregate::median_of;
///
/// assert_eq!(median_of(&[1.0, 2.0, 3.0, 4.0]), 3.0);
/// assert_eq!(median_of(&[5.0, 1.0, 3.0]), 3.0);
/// assert_eq!(median_of(&[]), 0.0);
/// ```
pub fn median_of(durations: &[f64]) -> f64 {
    let mut sorted = durations.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.get(sorted.len() / 2).copied().unwrap_or(0.0)
}

/// Median shot length over `shots`. See [`median_of`].
pub fn median_shot_length(shots: &[Shot]) -> f64 {
    let durations: Vec<f64> = shots.iter().map(|shot| shot.duration).collect();
    median_of(&durations)
}

/// Windowed cuts-per-minute curve.
///
/// A point every 2 s over `[0, duration)`; each counts shot ends strictly
/// inside a 20 s window centred on it, clipped to the video.
pub fn cutting_density(shots: &[Shot], duration: f64) -> Vec<DensityPoint> {
    let half = DENSITY_WINDOW / 2.0;
    let mut points = Vec::new();
    let mut step = 0u32;
    loop {
        let time = f64::from(step) * DENSITY_STEP;
        if time >= duration {
            break;
        }
        let window_start = (time - half).max(0.0);
        let window_end = (time + half).min(duration);
        let window = window_end - window_start;
        let density = if window > 0.0 {
            let cuts = shots
                .iter()
                .filter(|shot| shot.end > window_start && shot.end < window_end)
                .count();
            cuts as f64 / window * 60.0
        } else {
            0.0
        };
        points.push(DensityPoint { time, density });
        step += 1;
    }
    points
}

/// Colors of the longest shots over one second, longest first.
pub fn dominant_palette(shots: &[Shot]) -> Vec<PaletteEntry> {
    let mut long: Vec<&Shot> = shots
        .iter()
        .filter(|shot| shot.duration > PALETTE_MIN_DURATION)
        .collect();
    long.sort_by(|a, b| b.duration.total_cmp(&a.duration));
    long.into_iter()
        .take(PALETTE_SIZE)
        .map(|shot| PaletteEntry {
            color: shot.dominant_color.clone(),
            thumbnail: shot.thumbnail.clone(),
        })
        .collect()
}

/// One polar point per frame.
pub fn polar_series(frames: &[FrameFeature]) -> Vec<PolarPoint> {
    frames
        .iter()
        .map(|frame| PolarPoint {
            time: frame.timestamp,
            hue: frame.hsb.hue,
            saturation: frame.hsb.saturation,
            color: frame.hex.clone(),
        })
        .collect()
}

/// Compute every statistic and assemble the final result.
pub fn aggregate(
    file_name: String,
    shots: Vec<Shot>,
    frames: Vec<FrameFeature>,
    duration: f64,
    detection: DetectionMethod,
) -> AnalysisResult {
    let asl = average_shot_length(&shots, duration);
    let msl = median_shot_length(&shots);
    let cutting_density = cutting_density(&shots, duration);
    let palette = dominant_palette(&shots);
    let polar = polar_series(&frames);

    log::info!(
        "{file_name}: {} shots over {duration:.2}s, ASL {asl:.2}s, MSL {msl:.2}s ({detection})",
        shots.len()
    );

    AnalysisResult {
        file_name,
        shots,
        frames,
        duration,
        asl,
        msl,
        cutting_density,
        palette,
        polar,
        detection,
    }
}
