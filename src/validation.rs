//! Result validation.
//!
//! [`validate_result`] checks an [`AnalysisResult`] against the properties
//! every run should satisfy and returns a [`ValidationReport`] describing
//! anything that does not hold.
//!
//! # Example
//!
//! ```no_run
//! use shotlens::{AnalysisOptions, analyze_file, validate_result};
//!
//! let outcome = analyze_file("input.mp4", &AnalysisOptions::new(), None)?;
//! if let Some(result) = outcome.into_result() {
//!     let report = validate_result(&result);
//!     if !report.is_valid() {
//!         eprintln!("{report}");
//!     }
//! }
//! # Ok::<(), shotlens::AnalysisError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::aggregate::PALETTE_SIZE;
use crate::analysis::AnalysisResult;

/// Boundaries closer than this are treated as equal.
const TIME_EPSILON: f64 = 1e-6;

/// Findings from [`validate_result`].
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Informational notices (not problems).
    pub info: Vec<String>,
    /// Tolerated irregularities, such as a result without shots.
    pub warnings: Vec<String>,
    /// Broken invariants.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// Returns `true` if no errors were found. Warnings do not count.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of findings (info + warnings + errors).
    pub fn issue_count(&self) -> usize {
        self.info.len() + self.warnings.len() + self.errors.len()
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for item in &self.info {
            writeln!(f, "[INFO] {item}")?;
        }
        for item in &self.warnings {
            writeln!(f, "[WARN] {item}")?;
        }
        for item in &self.errors {
            writeln!(f, "[ERROR] {item}")?;
        }
        if self.issue_count() == 0 {
            writeln!(f, "No issues found.")?;
        }
        Ok(())
    }
}

/// Check the structural invariants of a finished result.
pub fn validate_result(result: &AnalysisResult) -> ValidationReport {
    let mut report = ValidationReport::default();
    let shots = &result.shots;

    // ── Duration ───────────────────────────────────────────────────
    if !result.duration.is_finite() || result.duration <= 0.0 {
        report
            .errors
            .push(format!("Duration is not positive: {}", result.duration));
    }

    // ── Shot tiling ────────────────────────────────────────────────
    match (shots.first(), shots.last()) {
        (Some(first), Some(last)) => {
            if first.start.abs() > TIME_EPSILON {
                report
                    .errors
                    .push(format!("First shot starts at {:.3}s, not 0", first.start));
            }
            if (last.end - result.duration).abs() > TIME_EPSILON {
                report.errors.push(format!(
                    "Last shot ends at {:.3}s, duration is {:.3}s",
                    last.end, result.duration
                ));
            }
        }
        _ => report.warnings.push("Result has no shots".to_string()),
    }

    for pair in shots.windows(2) {
        let (previous, next) = (&pair[0], &pair[1]);
        let gap = next.start - previous.end;
        if gap < -TIME_EPSILON {
            report.errors.push(format!(
                "Shots {} and {} overlap by {:.3}s",
                previous.id, next.id, -gap
            ));
        } else if gap > TIME_EPSILON {
            report.errors.push(format!(
                "Gap of {gap:.4}s between shots {} and {}",
                previous.id, next.id
            ));
        }
        if next.id <= previous.id {
            report.errors.push(format!(
                "Shot ids not increasing: {} then {}",
                previous.id, next.id
            ));
        }
    }

    for shot in shots {
        if shot.duration.is_nan() || shot.duration <= 0.0 {
            report
                .errors
                .push(format!("Shot {} has non-positive duration", shot.id));
        }
        if (shot.duration - (shot.end - shot.start)).abs() > TIME_EPSILON {
            report.errors.push(format!(
                "Shot {} duration {:.3}s does not match its bounds",
                shot.id, shot.duration
            ));
        }
    }
    if shots.first().is_some_and(|shot| shot.id != 1) {
        report.errors.push("First shot id is not 1".to_string());
    }

    // ── Statistics ─────────────────────────────────────────────────
    if !shots.is_empty() {
        let covered = result.asl * shots.len() as f64;
        if (covered - result.duration).abs() > 1e-6 * result.duration.max(1.0) {
            report.errors.push(format!(
                "ASL × shot count is {covered:.3}s, duration is {:.3}s",
                result.duration
            ));
        }
    }
    if result.palette.len() > PALETTE_SIZE {
        report
            .errors
            .push(format!("Palette has {} entries", result.palette.len()));
    }

    // ── Frames ─────────────────────────────────────────────────────
    if result
        .frames
        .windows(2)
        .any(|pair| pair[1].timestamp < pair[0].timestamp)
    {
        report
            .errors
            .push("Frame timestamps are not in order".to_string());
    }
    if result.polar.len() != result.frames.len() {
        report.errors.push(format!(
            "{} polar points for {} frames",
            result.polar.len(),
            result.frames.len()
        ));
    }

    report.info.push(format!(
        "{} shots, {} frames, detected by {}",
        shots.len(),
        result.frames.len(),
        result.detection
    ));

    report
}
