//! FFmpeg-backed media tests.
//!
//! Fixture tests need `tests/fixtures/sample_video.mp4` and are skipped
//! without it. Any short clip works, for example:
//!
//! ```text
//! ffmpeg -f lavfi -i testsrc=duration=5:size=320x240:rate=30 \
//!        -f lavfi -i color=c=blue:duration=5:size=320x240:rate=30 \
//!        -filter_complex "[0:v][1:v]concat=n=2:v=1" tests/fixtures/sample_video.mp4
//! ```

use std::path::Path;

use shotlens::source::{ANALYSIS_HEIGHT, ANALYSIS_WIDTH, MODEL_HEIGHT, MODEL_WIDTH};
use shotlens::{
    AnalysisOptions, AnalysisOutcome, FfmpegLogLevel, FrameSource, MediaFile, analyze_file,
    validate_result,
};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

// ── Opening ────────────────────────────────────────────────────────

#[test]
fn open_nonexistent_file() {
    let result = MediaFile::open("this_file_does_not_exist.mp4");
    let error_message = result.unwrap_err().to_string();
    assert!(
        error_message.contains("Failed to open media file"),
        "Error message should mention file open failure: {error_message}",
    );
}

#[test]
fn open_invalid_file() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid_file_path = temporary_directory.path().join("invalid.mp4");
    std::fs::write(&invalid_file_path, b"this is not a media file")
        .expect("Failed to write invalid file");

    assert!(MediaFile::open(&invalid_file_path).is_err());
}

#[test]
fn analyze_file_propagates_open_errors() {
    let result = analyze_file("missing/clip.mp4", &AnalysisOptions::new(), None);
    assert!(result.is_err());
}

#[test]
fn ffmpeg_log_level_parses() {
    assert_eq!("error".parse::<FfmpegLogLevel>(), Ok(FfmpegLogLevel::Error));
    assert_eq!("WARN".parse::<FfmpegLogLevel>(), Ok(FfmpegLogLevel::Warning));
    assert_eq!("quiet".parse::<FfmpegLogLevel>(), Ok(FfmpegLogLevel::Quiet));
    assert!("loud".parse::<FfmpegLogLevel>().is_err());
}

// ── Capture ────────────────────────────────────────────────────────

#[test]
fn fixture_metadata() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let media = MediaFile::open(path).expect("Failed to open fixture");
    assert!(media.duration() > 0.0);
    assert!(media.frames_per_second() > 0.0);
    assert!(media.size_hint() > 0);
    assert_eq!(media.name(), "sample_video.mp4");
    assert_eq!(media.path(), Path::new(path));
}

#[test]
fn capture_fills_requested_raster() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut media = MediaFile::open(path).expect("Failed to open fixture");
    let mut rgba = Vec::new();
    media
        .capture(1.0, ANALYSIS_WIDTH, ANALYSIS_HEIGHT, &mut rgba)
        .expect("Failed to capture");
    assert_eq!(rgba.len(), (ANALYSIS_WIDTH * ANALYSIS_HEIGHT * 4) as usize);

    media
        .capture(0.5, MODEL_WIDTH, MODEL_HEIGHT, &mut rgba)
        .expect("Failed to capture");
    assert_eq!(rgba.len(), (MODEL_WIDTH * MODEL_HEIGHT * 4) as usize);
}

#[test]
fn capture_clamps_out_of_range_timestamps() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut media = MediaFile::open(path).expect("Failed to open fixture");
    let mut rgba = Vec::new();
    let past_end = media.duration() + 60.0;
    media
        .capture(past_end, ANALYSIS_WIDTH, ANALYSIS_HEIGHT, &mut rgba)
        .expect("Capture past the end should clamp");
    media
        .capture(-3.0, ANALYSIS_WIDTH, ANALYSIS_HEIGHT, &mut rgba)
        .expect("Capture before the start should clamp");
    assert_eq!(rgba.len(), (ANALYSIS_WIDTH * ANALYSIS_HEIGHT * 4) as usize);
}

#[test]
fn capture_is_repeatable() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut media = MediaFile::open(path).expect("Failed to open fixture");
    let mut first = Vec::new();
    let mut second = Vec::new();
    media
        .capture(2.0, ANALYSIS_WIDTH, ANALYSIS_HEIGHT, &mut first)
        .expect("Failed to capture");
    media
        .capture(0.0, ANALYSIS_WIDTH, ANALYSIS_HEIGHT, &mut second)
        .expect("Failed to capture");
    media
        .capture(2.0, ANALYSIS_WIDTH, ANALYSIS_HEIGHT, &mut second)
        .expect("Failed to capture");
    assert_eq!(first, second);
}

// ── Full analysis ──────────────────────────────────────────────────

#[test]
fn fixture_analysis_is_valid() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let outcome = analyze_file(path, &AnalysisOptions::new(), None).expect("Failed to analyze");
    let AnalysisOutcome::Completed(result) = outcome else {
        panic!("analysis was cancelled");
    };
    assert!(!result.shots.is_empty());
    assert!(!result.frames.is_empty());
    let report = validate_result(&result);
    assert!(report.is_valid(), "{report}");
}
