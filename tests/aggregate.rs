//! Statistics and result validation tests.

mod common;

use common::flat_raster;
use shotlens::aggregate::{
    aggregate, average_shot_length, cutting_density, dominant_palette, median_of,
    median_shot_length, polar_series,
};
use shotlens::{DetectionMethod, Shot, Thumbnail, extract_features, validate_result};

fn shot(id: u32, start: f64, end: f64, color: &str) -> Shot {
    Shot {
        id,
        start,
        end,
        duration: end - start,
        dominant_color: color.to_string(),
        thumbnail: None,
    }
}

/// Shots tiling `[0, bounds.last())` with one color per shot.
fn tiled(bounds: &[f64]) -> Vec<Shot> {
    bounds
        .windows(2)
        .enumerate()
        .map(|(index, pair)| shot(index as u32 + 1, pair[0], pair[1], &format!("#0000{index:02x}")))
        .collect()
}

// ── Shot lengths ───────────────────────────────────────────────────

#[test]
fn average_shot_length_divides_duration() {
    let shots = tiled(&[0.0, 2.0, 5.0, 12.0]);
    assert_eq!(average_shot_length(&shots, 12.0), 4.0);
    assert_eq!(average_shot_length(&[], 12.0), 0.0);
}

#[test]
fn median_of_odd_count_is_the_middle() {
    let shots = tiled(&[0.0, 1.0, 4.0, 6.0]);
    // durations 1, 3, 2
    assert_eq!(median_shot_length(&shots), 2.0);
}

#[test]
fn median_of_even_count_is_the_upper_middle() {
    let shots = tiled(&[0.0, 1.0, 3.0, 6.0, 10.0]);
    // durations 1, 2, 3, 4
    assert_eq!(median_shot_length(&shots), 3.0);
    assert_eq!(median_of(&[7.0, 1.0]), 7.0);
    assert_eq!(median_of(&[]), 0.0);
}

// ── Cutting density ────────────────────────────────────────────────

#[test]
fn density_counts_cuts_inside_the_window() {
    let shots = tiled(&[0.0, 5.0, 10.0]);
    let points = cutting_density(&shots, 10.0);
    assert_eq!(points.len(), 5);
    // One interior cut in a 10 s window: 6 per minute. The final shot end
    // sits on the window edge and does not count.
    assert!(points.iter().all(|point| point.density == 6.0));
}

#[test]
fn density_window_is_centered_and_clipped() {
    let shots = tiled(&[0.0, 2.0, 4.0, 30.0, 40.0]);
    let points = cutting_density(&shots, 40.0);
    assert_eq!(points.len(), 20);

    // t=0: window [0, 10], cuts at 2 and 4.
    assert_eq!(points[0].time, 0.0);
    assert_eq!(points[0].density, 2.0 / 10.0 * 60.0);
    // t=20: window [10, 30], no cut strictly inside.
    assert_eq!(points[10].time, 20.0);
    assert_eq!(points[10].density, 0.0);
    // t=22: window [12, 32], cut at 30.
    assert_eq!(points[11].density, 1.0 / 20.0 * 60.0);
    // t=38: window [28, 40], cut at 30; 40 is the edge.
    assert_eq!(points[19].time, 38.0);
    assert_eq!(points[19].density, 1.0 / 12.0 * 60.0);
}

#[test]
fn density_of_short_video_has_one_point() {
    let shots = tiled(&[0.0, 1.5]);
    let points = cutting_density(&shots, 1.5);
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].density, 0.0);
}

// ── Palette and polar series ───────────────────────────────────────

#[test]
fn palette_keeps_longest_shots_over_one_second() {
    let mut bounds = vec![0.0];
    // Durations 0.5, 1.0, then 2..=13 seconds.
    let mut end = 0.0;
    for duration in [0.5, 1.0] {
        end += duration;
        bounds.push(end);
    }
    for duration in 2..=13 {
        end += f64::from(duration);
        bounds.push(end);
    }
    let shots = tiled(&bounds);
    let palette = dominant_palette(&shots);

    assert_eq!(palette.len(), 10);
    // The 13 s shot has index 13 in the list.
    assert_eq!(palette[0].color, "#00000d");
    assert_eq!(palette[9].color, "#000004");
    assert!(palette.iter().all(|entry| entry.color != "#000000"));
    assert!(palette.iter().all(|entry| entry.color != "#000001"));
}

#[test]
fn palette_ties_keep_time_order() {
    let shots = vec![
        shot(1, 0.0, 3.0, "#aa0000"),
        shot(2, 3.0, 6.0, "#00aa00"),
        shot(3, 6.0, 9.0, "#0000aa"),
    ];
    let colors: Vec<String> = dominant_palette(&shots)
        .into_iter()
        .map(|entry| entry.color)
        .collect();
    assert_eq!(colors, vec!["#aa0000", "#00aa00", "#0000aa"]);
}

#[test]
fn palette_carries_thumbnails() {
    let pixels = flat_raster(8, 8, [10, 200, 10]);
    let mut long = shot(1, 0.0, 4.0, "#0ac80a");
    long.thumbnail = Some(Thumbnail::from_rgba(&pixels, 8, 8).unwrap());
    let palette = dominant_palette(&[long.clone()]);
    assert_eq!(palette[0].thumbnail, long.thumbnail);
}

#[test]
fn polar_series_mirrors_frames() {
    let frames: Vec<_> = [[255, 0, 0], [0, 0, 255]]
        .into_iter()
        .enumerate()
        .map(|(index, color)| {
            let pixels = flat_raster(64, 36, color);
            extract_features(&pixels, 64, 36, index as f64).unwrap()
        })
        .collect();
    let polar = polar_series(&frames);
    assert_eq!(polar.len(), 2);
    assert_eq!(polar[0].hue, 0.0);
    assert_eq!(polar[0].saturation, 100.0);
    assert_eq!(polar[0].color, "#ff0000");
    assert!((polar[1].hue - 240.0).abs() < 1e-9);
    assert_eq!(polar[1].time, 1.0);
}

// ── Validation ─────────────────────────────────────────────────────

#[test]
fn aggregated_tiling_is_valid() {
    let result = aggregate(
        "clip.mp4".to_string(),
        tiled(&[0.0, 3.0, 7.0, 10.0]),
        Vec::new(),
        10.0,
        DetectionMethod::EditDecisionList,
    );
    let report = validate_result(&result);
    assert!(report.is_valid(), "{report}");
    assert!(report.warnings.is_empty());
    assert_eq!(report.info.len(), 1);
    assert!(report.to_string().contains("[INFO]"));
}

#[test]
fn even_a_tiny_gap_is_an_error() {
    let mut shots = tiled(&[0.0, 3.0, 10.0]);
    shots[1].start = 3.005;
    shots[1].duration = shots[1].end - shots[1].start;
    let result = aggregate(
        "clip.mp4".to_string(),
        shots,
        Vec::new(),
        10.0,
        DetectionMethod::LearnedModel,
    );
    let report = validate_result(&result);
    assert!(!report.is_valid());
    assert!(report.warnings.is_empty());
    assert!(report.to_string().contains("Gap of 0.0050s between shots 1 and 2"));
}

#[test]
fn gaps_overlaps_and_ids_are_errors() {
    let shots = vec![
        shot(1, 0.0, 4.0, "#111111"),
        shot(3, 3.0, 6.0, "#222222"),
        shot(2, 7.0, 9.0, "#333333"),
    ];
    let result = aggregate(
        "broken.mp4".to_string(),
        shots,
        Vec::new(),
        10.0,
        DetectionMethod::Heuristic,
    );
    let report = validate_result(&result);
    assert!(!report.is_valid());
    let text = report.to_string();
    assert!(text.contains("overlap"));
    assert!(text.contains("Gap"));
    assert!(text.contains("not increasing"));
    assert!(text.contains("ends at"));
}

#[test]
fn empty_result_is_only_a_warning() {
    let result = aggregate(
        "empty.mp4".to_string(),
        Vec::new(),
        Vec::new(),
        5.0,
        DetectionMethod::Heuristic,
    );
    let report = validate_result(&result);
    assert!(report.is_valid());
    assert_eq!(report.warnings, vec!["Result has no shots".to_string()]);
    assert_eq!(result.asl, 0.0);
    assert_eq!(result.msl, 0.0);
}
