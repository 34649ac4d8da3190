//! Detector-agnostic driving of a run.
//!
//! [`CutDetector`] puts the three ways of finding shot boundaries behind one
//! interface. The analyzer asks it for a [`SamplePoint`] plan, feeds it one
//! feature per point, and finally asks it to close the last shot.
//!
//! - [`CutDetector::Heuristic`] scans linearly at the sample step and decides
//!   cuts itself.
//! - [`CutDetector::LearnedModel`] and [`CutDetector::Edl`] already know the
//!   cuts. They sample each segment once at its midpoint and backfill the
//!   frame list so charts keep one point per second.

use crate::error::AnalysisError;
use crate::features::FrameFeature;
use crate::heuristic::HeuristicDetector;
use crate::source::sample_times;
use crate::thumbnail::Thumbnail;

/// Segments shorter than this are merged into a neighbour instead of sampled.
pub const MIN_SEGMENT_DURATION: f64 = 0.01;
/// Spacing of backfilled frames within a cut-list segment.
pub const BACKFILL_INTERVAL: f64 = 1.0;
/// An external cut list whose first cut is later than this gets a cut at 0.
pub const LEADING_CUT_TOLERANCE: f64 = 0.1;

/// A contiguous run of frames between two cuts.
#[derive(Debug, Clone, PartialEq)]
pub struct Shot {
    /// 1-based, increasing in time.
    pub id: u32,
    /// Start in seconds.
    pub start: f64,
    /// End in seconds (exclusive).
    pub end: f64,
    /// `end - start`, always positive.
    pub duration: f64,
    /// Hex color of the shot's representative frame.
    pub dominant_color: String,
    /// JPEG of the representative frame.
    pub thumbnail: Option<Thumbnail>,
}

/// Which path produced the shot boundaries of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectionMethod {
    Heuristic,
    LearnedModel,
    EditDecisionList,
}

impl DetectionMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            DetectionMethod::Heuristic => "heuristic",
            DetectionMethod::LearnedModel => "learned-model",
            DetectionMethod::EditDecisionList => "edl",
        }
    }
}

impl std::fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A segment of an authoritative cut list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Position of the segment in the plan; the shot id is this plus one.
    pub index: usize,
    pub start: f64,
    pub end: f64,
}

/// One timestamp the analyzer must capture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    /// Time to capture, in seconds.
    pub time: f64,
    /// Position reported as progress once this point is processed.
    pub progress_time: f64,
    /// The segment this point represents, for cut-list detectors.
    pub segment: Option<Segment>,
}

/// What one ingested sample contributes to the result.
#[derive(Debug, Default)]
pub struct Ingested {
    /// A shot closed by this sample.
    pub shot: Option<Shot>,
    /// Features to append to the frame list, in time order.
    pub frames: Vec<FrameFeature>,
}

/// The shot-boundary strategy for one run.
#[derive(Debug)]
pub enum CutDetector {
    Heuristic(Box<HeuristicDetector>),
    /// Normalized cuts from the learned model, starting at 0.
    LearnedModel(Vec<f64>),
    /// Normalized cuts from an edit decision list, starting at 0.
    Edl(Vec<f64>),
}

impl CutDetector {
    pub fn heuristic() -> Self {
        CutDetector::Heuristic(Box::default())
    }

    /// Build a detector from learned-model cuts that are already
    /// post-processed (start at 0, sorted, spaced).
    pub fn from_model_cuts(cuts: Vec<f64>) -> Self {
        CutDetector::LearnedModel(cuts)
    }

    /// Build a detector from parsed edit-decision-list cuts.
    ///
    /// Cuts at or past `duration` are dropped and the rest sorted. The list
    /// is anchored at 0: a first cut later than 0.1 s gets a 0 in front of
    /// it, an earlier one is moved to 0. Returns `None` if nothing is left.
    pub fn from_edl_cuts(cuts: &[f64], duration: f64) -> Option<Self> {
        let mut normalized: Vec<f64> = cuts
            .iter()
            .copied()
            .filter(|cut| cut.is_finite() && *cut >= 0.0 && *cut < duration)
            .collect();
        normalized.sort_by(f64::total_cmp);

        let first = *normalized.first()?;
        if first > LEADING_CUT_TOLERANCE {
            normalized.insert(0, 0.0);
        } else {
            normalized[0] = 0.0;
        }
        Some(CutDetector::Edl(normalized))
    }

    pub fn method(&self) -> DetectionMethod {
        match self {
            CutDetector::Heuristic(_) => DetectionMethod::Heuristic,
            CutDetector::LearnedModel(_) => DetectionMethod::LearnedModel,
            CutDetector::Edl(_) => DetectionMethod::EditDecisionList,
        }
    }

    /// Timestamps to capture, in order.
    ///
    /// `step` only applies to the heuristic scan.
    pub fn sample_plan(&self, duration: f64, step: f64) -> Vec<SamplePoint> {
        match self {
            CutDetector::Heuristic(_) => sample_times(duration, step)
                .into_iter()
                .map(|time| SamplePoint {
                    time,
                    progress_time: time,
                    segment: None,
                })
                .collect(),
            CutDetector::LearnedModel(cuts) | CutDetector::Edl(cuts) => {
                segment_plan(cuts, duration)
            }
        }
    }

    /// Feed the feature captured at `point`, with the raster it came from.
    ///
    /// # Errors
    ///
    /// Returns an error if a shot thumbnail cannot be encoded.
    pub fn ingest(
        &mut self,
        point: &SamplePoint,
        feature: FrameFeature,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Ingested, AnalysisError> {
        match self {
            CutDetector::Heuristic(detector) => {
                let shot = detector.ingest(&feature, pixels, width, height)?;
                Ok(Ingested {
                    shot,
                    frames: vec![feature],
                })
            }
            CutDetector::LearnedModel(_) | CutDetector::Edl(_) => {
                let Some(segment) = point.segment else {
                    return Ok(Ingested::default());
                };
                let thumbnail = Thumbnail::from_rgba(pixels, width, height)?;
                let frames = backfill(&feature, segment.start, segment.end);
                let shot = Shot {
                    id: segment.index as u32 + 1,
                    start: segment.start,
                    end: segment.end,
                    duration: segment.end - segment.start,
                    dominant_color: feature.hex.clone(),
                    thumbnail: Some(thumbnail),
                };
                Ok(Ingested {
                    shot: Some(shot),
                    frames,
                })
            }
        }
    }

    /// Close whatever shot is still open at `duration`.
    ///
    /// # Errors
    ///
    /// Returns an error if the shot thumbnail cannot be encoded.
    pub fn finish(&mut self, duration: f64) -> Result<Option<Shot>, AnalysisError> {
        match self {
            CutDetector::Heuristic(detector) => detector.finish(duration),
            CutDetector::LearnedModel(_) | CutDetector::Edl(_) => Ok(None),
        }
    }
}

fn segment_plan(cuts: &[f64], duration: f64) -> Vec<SamplePoint> {
    merged_segments(cuts, duration)
        .into_iter()
        .enumerate()
        .map(|(index, (start, end))| SamplePoint {
            time: start + (end - start) / 2.0,
            progress_time: end,
            segment: Some(Segment { index, start, end }),
        })
        .collect()
}

/// Split `[0, duration)` at `cuts`, folding slivers into a neighbour.
///
/// A segment shorter than [`MIN_SEGMENT_DURATION`] extends the one before
/// it; a leading sliver is carried into the next segment. The result always
/// tiles `[cuts[0], duration)`.
fn merged_segments(cuts: &[f64], duration: f64) -> Vec<(f64, f64)> {
    let mut segments: Vec<(f64, f64)> = Vec::with_capacity(cuts.len());
    let mut carried_start = None;
    for (index, &cut) in cuts.iter().enumerate() {
        if cut >= duration {
            break;
        }
        let end = cuts
            .get(index + 1)
            .copied()
            .unwrap_or(duration)
            .min(duration);
        let start = carried_start.take().unwrap_or(cut);
        if end - start < MIN_SEGMENT_DURATION {
            match segments.last_mut() {
                Some(previous) => previous.1 = previous.1.max(end),
                None => carried_start = Some(start),
            }
            continue;
        }
        segments.push((start, end));
    }
    // Every segment was a sliver.
    if let Some(start) = carried_start {
        segments.push((start, duration));
    }
    segments
}

fn backfill(feature: &FrameFeature, start: f64, end: f64) -> Vec<FrameFeature> {
    let mut frames = Vec::new();
    let mut step = 0u32;
    loop {
        let time = start + f64::from(step) * BACKFILL_INTERVAL;
        if time >= end {
            break;
        }
        frames.push(feature.retimed(time));
        step += 1;
    }
    frames
}
