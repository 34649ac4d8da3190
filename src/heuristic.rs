//! Multi-signal heuristic shot-boundary detection.
//!
//! [`HeuristicDetector`] compares each sampled [`FrameFeature`] with the one
//! before it using three normalized distances:
//!
//! - **histogram**: Σ|Δbin| over the R, G and B histograms / (pixels × 6)
//! - **structure**: Σ|ΔRGB| over the nine zones / (9 × 3 × 255)
//! - **luma**: Σ|Δblock| over the 48 luma blocks / (48 × 255)
//!
//! Thresholds tighten for a short while after each cut, loosen for dark or
//! washed-out footage, and a rolling average of the luma distance catches
//! slow dissolves that never produce one large jump.
//!
//! The detector also tracks the most saturated frame of the open shot; its
//! color and raster become the shot's dominant color and thumbnail.

use std::collections::VecDeque;

use crate::detector::Shot;
use crate::error::AnalysisError;
use crate::features::{FrameFeature, LUMA_BLOCKS, STRUCTURE_ZONES};
use crate::thumbnail::Thumbnail;

/// Color used for a shot that never saw a frame.
pub const FALLBACK_COLOR: &str = "#000000";

/// Cut thresholds for the three frame distances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutThresholds {
    pub histogram: f64,
    pub structure: f64,
    pub luma: f64,
}

impl CutThresholds {
    /// Thresholds once the last cut is at least 1.5 s behind.
    pub const BASE: CutThresholds = CutThresholds {
        histogram: 0.32,
        structure: 0.26,
        luma: 0.14,
    };

    /// Thresholds less than 1.0 s after a cut.
    pub const SETTLING: CutThresholds = CutThresholds {
        histogram: 0.55,
        structure: 0.50,
        luma: 0.22,
    };

    /// Thresholds between 1.0 s and 1.5 s after a cut.
    pub const RECOVERING: CutThresholds = CutThresholds {
        histogram: 0.48,
        structure: 0.42,
        luma: 0.18,
    };
}

/// Constants that shape the detector beyond the raw thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorTuning {
    /// Below this time since the last cut, [`CutThresholds::SETTLING`] applies.
    pub settling_window: f64,
    /// Below this time since the last cut, [`CutThresholds::RECOVERING`] applies.
    pub recovering_window: f64,
    /// Frames with brightness under this are dark.
    pub dark_brightness: f64,
    /// Frames with saturation under this are washed out.
    pub low_saturation: f64,
    /// Histogram threshold floor for dark or washed-out pairs.
    pub dim_histogram_floor: f64,
    /// Structure threshold floor for dark or washed-out pairs.
    pub dim_structure_floor: f64,
    /// Luma threshold ceiling for dark or washed-out pairs.
    pub dim_luma_ceiling: f64,
    /// Samples kept in the rolling luma window.
    pub dissolve_window: usize,
    /// Minimum time since the last cut before a dissolve can fire.
    pub dissolve_min_gap: f64,
    /// Rolling luma average above which a dissolve is in progress.
    pub dissolve_luma_average: f64,
    /// Histogram distance that confirms a dissolve.
    pub dissolve_histogram: f64,
    /// Structure distance that confirms a dissolve.
    pub dissolve_structure: f64,
    /// Structure threshold multiplier for the structure-led rule.
    pub structure_emphasis: f64,
    /// Histogram threshold multiplier for the structure-led rule.
    pub histogram_relief: f64,
}

impl Default for DetectorTuning {
    fn default() -> Self {
        Self {
            settling_window: 1.0,
            recovering_window: 1.5,
            dark_brightness: 18.0,
            low_saturation: 12.0,
            dim_histogram_floor: 0.45,
            dim_structure_floor: 0.28,
            dim_luma_ceiling: 0.11,
            dissolve_window: 6,
            dissolve_min_gap: 2.0,
            dissolve_luma_average: 0.11,
            dissolve_histogram: 0.20,
            dissolve_structure: 0.16,
            structure_emphasis: 1.25,
            histogram_relief: 0.85,
        }
    }
}

impl DetectorTuning {
    /// Thresholds for a frame pair `time_since_cut` seconds after the last cut.
    ///
    /// `dim` is true when both frames are dark or both are washed out.
    pub fn thresholds(&self, time_since_cut: f64, dim: bool) -> CutThresholds {
        let mut thresholds = if time_since_cut < self.settling_window {
            CutThresholds::SETTLING
        } else if time_since_cut < self.recovering_window {
            CutThresholds::RECOVERING
        } else {
            CutThresholds::BASE
        };

        if dim {
            thresholds.histogram = thresholds.histogram.max(self.dim_histogram_floor);
            thresholds.structure = thresholds.structure.max(self.dim_structure_floor);
            thresholds.luma = thresholds.luma.min(self.dim_luma_ceiling);
        }
        thresholds
    }
}

/// Normalized distances between two consecutive features, each in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameDiff {
    pub histogram: f64,
    pub structure: f64,
    pub luma: f64,
}

struct BestFrame {
    saturation: f64,
    color: String,
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

enum DetectorState {
    Idle,
    Tracking { previous: FrameFeature },
}

/// Streaming heuristic cut detector. One instance per run.
pub struct HeuristicDetector {
    tuning: DetectorTuning,
    state: DetectorState,
    last_cut: f64,
    next_id: u32,
    luma_history: VecDeque<f64>,
    best: Option<BestFrame>,
    last_thumbnail: Option<Thumbnail>,
}

impl std::fmt::Debug for HeuristicDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeuristicDetector")
            .field("tuning", &self.tuning)
            .field("tracking", &matches!(self.state, DetectorState::Tracking { .. }))
            .field("last_cut", &self.last_cut)
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl Default for HeuristicDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl HeuristicDetector {
    pub fn new() -> Self {
        Self::with_tuning(DetectorTuning::default())
    }

    pub fn with_tuning(tuning: DetectorTuning) -> Self {
        let capacity = tuning.dissolve_window;
        Self {
            tuning,
            state: DetectorState::Idle,
            last_cut: 0.0,
            next_id: 1,
            luma_history: VecDeque::with_capacity(capacity),
            best: None,
            last_thumbnail: None,
        }
    }

    pub fn tuning(&self) -> &DetectorTuning {
        &self.tuning
    }

    /// Start time of the currently open shot.
    pub fn last_cut(&self) -> f64 {
        self.last_cut
    }

    /// Distances between two features.
    pub fn frame_diff(previous: &FrameFeature, current: &FrameFeature) -> FrameDiff {
        let pixels = f64::from(current.pixel_count.max(1));
        let histogram = previous.histogram.absolute_difference(&current.histogram) as f64
            / (pixels * 6.0);

        let structure_sum: u32 = previous
            .structure
            .iter()
            .zip(&current.structure)
            .map(|(a, b)| {
                u32::from(a.r.abs_diff(b.r))
                    + u32::from(a.g.abs_diff(b.g))
                    + u32::from(a.b.abs_diff(b.b))
            })
            .sum();
        let structure = f64::from(structure_sum) / (STRUCTURE_ZONES as f64 * 3.0 * 255.0);

        let luma_sum: f64 = previous
            .luma_blocks
            .iter()
            .zip(&current.luma_blocks)
            .map(|(a, b)| (a - b).abs())
            .sum();
        let luma = luma_sum / (LUMA_BLOCKS as f64 * 255.0);

        FrameDiff {
            histogram,
            structure,
            luma,
        }
    }

    /// Feed the next sampled feature and the raster it was computed from.
    ///
    /// Returns the shot closed by this frame, if it is a cut.
    ///
    /// # Errors
    ///
    /// Returns an error only if the closed shot's thumbnail cannot be encoded.
    pub fn ingest(
        &mut self,
        feature: &FrameFeature,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Option<Shot>, AnalysisError> {
        let time = feature.timestamp;
        let state = std::mem::replace(&mut self.state, DetectorState::Idle);
        let is_cut = match state {
            DetectorState::Idle => false,
            DetectorState::Tracking { previous } => {
                let diff = Self::frame_diff(&previous, feature);
                let cut = self.evaluate(&previous, feature, diff);
                log::trace!(
                    "t={time:.2}s hist={:.3} struct={:.3} luma={:.3} cut={cut}",
                    diff.histogram,
                    diff.structure,
                    diff.luma
                );
                cut
            }
        };
        self.state = DetectorState::Tracking {
            previous: feature.clone(),
        };

        let closed = if is_cut && time > self.last_cut {
            let shot = self.close_shot(time)?;
            self.last_cut = time;
            self.luma_history.clear();
            Some(shot)
        } else {
            None
        };

        self.track_best(feature, pixels, width, height);
        Ok(closed)
    }

    /// Close the open shot at `duration`.
    ///
    /// Returns `None` if the last cut is already at or beyond `duration`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the thumbnail cannot be encoded.
    pub fn finish(&mut self, duration: f64) -> Result<Option<Shot>, AnalysisError> {
        if self.last_cut >= duration {
            return Ok(None);
        }
        let shot = self.close_shot(duration)?;
        self.last_cut = duration;
        Ok(Some(shot))
    }

    fn evaluate(&mut self, previous: &FrameFeature, current: &FrameFeature, diff: FrameDiff) -> bool {
        let tuning = &self.tuning;
        let time_since_cut = current.timestamp - self.last_cut;

        let dark = previous.hsb.brightness < tuning.dark_brightness
            && current.hsb.brightness < tuning.dark_brightness;
        let washed_out = previous.hsb.saturation < tuning.low_saturation
            && current.hsb.saturation < tuning.low_saturation;
        let thresholds = tuning.thresholds(time_since_cut, dark || washed_out);

        if self.luma_history.len() == tuning.dissolve_window {
            self.luma_history.pop_front();
        }
        self.luma_history.push_back(diff.luma);
        let recent_average =
            self.luma_history.iter().sum::<f64>() / self.luma_history.len() as f64;

        let luma_jump = diff.luma > thresholds.luma;
        let color_and_layout =
            diff.histogram > thresholds.histogram && diff.structure > thresholds.structure;
        let layout_led = diff.structure > thresholds.structure * tuning.structure_emphasis
            && diff.histogram > thresholds.histogram * tuning.histogram_relief;
        let dissolve = time_since_cut > tuning.dissolve_min_gap
            && recent_average > tuning.dissolve_luma_average
            && (diff.histogram > tuning.dissolve_histogram
                || diff.structure > tuning.dissolve_structure);

        luma_jump || color_and_layout || layout_led || dissolve
    }

    fn track_best(&mut self, feature: &FrameFeature, pixels: &[u8], width: u32, height: u32) {
        let saturation = feature.hsb.saturation;
        match &mut self.best {
            Some(best) if saturation <= best.saturation => {}
            Some(best) => {
                best.saturation = saturation;
                best.color.clone_from(&feature.hex);
                best.pixels.clear();
                best.pixels.extend_from_slice(pixels);
                best.width = width;
                best.height = height;
            }
            None => {
                self.best = Some(BestFrame {
                    saturation,
                    color: feature.hex.clone(),
                    pixels: pixels.to_vec(),
                    width,
                    height,
                });
            }
        }
    }

    fn close_shot(&mut self, end: f64) -> Result<Shot, AnalysisError> {
        let (dominant_color, thumbnail) = match self.best.take() {
            Some(best) => {
                let thumbnail = Thumbnail::from_rgba(&best.pixels, best.width, best.height)?;
                (best.color, Some(thumbnail))
            }
            None => (FALLBACK_COLOR.to_string(), self.last_thumbnail.clone()),
        };
        if thumbnail.is_some() {
            self.last_thumbnail.clone_from(&thumbnail);
        }

        let start = self.last_cut;
        let shot = Shot {
            id: self.next_id,
            start,
            end,
            duration: end - start,
            dominant_color,
            thumbnail,
        };
        self.next_id += 1;
        Ok(shot)
    }
}
