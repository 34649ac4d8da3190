//! Frame feature extraction tests.

mod common;

use common::flat_raster;
use shotlens::features::{LUMA_BLOCKS, luma};
use shotlens::{AnalysisError, FeatureWorker, Rgb, extract_features};

const WIDTH: u32 = 64;
const HEIGHT: u32 = 36;

/// Top `rows` rows white, the rest black.
fn banded_raster(rows: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((WIDTH * HEIGHT * 4) as usize);
    for y in 0..HEIGHT {
        let value = if y < rows { 255 } else { 0 };
        for _ in 0..WIDTH {
            pixels.extend_from_slice(&[value, value, value, 255]);
        }
    }
    pixels
}

// ── Color conversion ───────────────────────────────────────────────

#[test]
fn hex_is_lowercase_and_padded() {
    assert_eq!(Rgb::new(255, 0, 0).to_hex(), "#ff0000");
    assert_eq!(Rgb::new(1, 10, 171).to_hex(), "#010aab");
    assert_eq!(Rgb::new(0, 0, 0).to_hex(), "#000000");
}

#[test]
fn hsb_of_primaries() {
    let red = Rgb::new(255, 0, 0).to_hsb();
    assert_eq!(red.hue, 0.0);
    assert_eq!(red.saturation, 100.0);
    assert_eq!(red.brightness, 100.0);

    let green = Rgb::new(0, 255, 0).to_hsb();
    assert!((green.hue - 120.0).abs() < 1e-9);

    let blue = Rgb::new(0, 0, 255).to_hsb();
    assert!((blue.hue - 240.0).abs() < 1e-9);
}

#[test]
fn hsb_hue_wraps_for_magenta_side() {
    // max is red and green < blue: hue lands in the 300s.
    let hsb = Rgb::new(255, 0, 128).to_hsb();
    assert!(hsb.hue > 300.0 && hsb.hue < 360.0, "hue {}", hsb.hue);
}

#[test]
fn hsb_of_gray_and_black() {
    let gray = Rgb::new(128, 128, 128).to_hsb();
    assert_eq!(gray.hue, 0.0);
    assert_eq!(gray.saturation, 0.0);
    assert!((gray.brightness - 128.0 / 255.0 * 100.0).abs() < 1e-9);

    let black = Rgb::new(0, 0, 0).to_hsb();
    assert_eq!(black.saturation, 0.0);
    assert_eq!(black.brightness, 0.0);
}

#[test]
fn luma_uses_fixed_point_weights() {
    assert_eq!(luma(255, 255, 255), 255);
    assert_eq!(luma(0, 0, 0), 0);
    assert_eq!(luma(255, 0, 0), (54 * 255) >> 8);
    assert_eq!(luma(0, 255, 0), (183 * 255) >> 8);
}

// ── Single-pass extraction ─────────────────────────────────────────

#[test]
fn flat_frame_features() {
    let pixels = flat_raster(WIDTH, HEIGHT, [255, 0, 0]);
    let feature = extract_features(&pixels, WIDTH, HEIGHT, 1.5).unwrap();

    assert_eq!(feature.timestamp, 1.5);
    assert_eq!(feature.pixel_count, WIDTH * HEIGHT);
    assert_eq!(feature.hex, "#ff0000");
    assert_eq!(feature.average, Rgb::new(255, 0, 0));
    assert_eq!(feature.histogram.red[15], WIDTH * HEIGHT);
    assert_eq!(feature.histogram.green[0], WIDTH * HEIGHT);
    assert_eq!(feature.histogram.blue[0], WIDTH * HEIGHT);
    assert!(feature.structure.iter().all(|zone| *zone == Rgb::new(255, 0, 0)));

    let expected_luma = f64::from(luma(255, 0, 0));
    assert!(feature.luma_blocks.iter().all(|block| *block == expected_luma));
}

#[test]
fn histogram_bins_are_sixteen_wide() {
    let pixels = flat_raster(WIDTH, HEIGHT, [15, 16, 255]);
    let feature = extract_features(&pixels, WIDTH, HEIGHT, 0.0).unwrap();
    assert_eq!(feature.histogram.red[0], WIDTH * HEIGHT);
    assert_eq!(feature.histogram.green[1], WIDTH * HEIGHT);
    assert_eq!(feature.histogram.blue[15], WIDTH * HEIGHT);

    let total: u32 = feature.histogram.red.iter().sum();
    assert_eq!(total, WIDTH * HEIGHT);
}

#[test]
fn banded_frame_structure_and_luma() {
    // 12 white rows fill exactly the top row of zones and two rows of luma blocks.
    let pixels = banded_raster(12);
    let feature = extract_features(&pixels, WIDTH, HEIGHT, 0.0).unwrap();

    for zone in 0..3 {
        assert_eq!(feature.structure[zone], Rgb::new(255, 255, 255));
    }
    for zone in 3..9 {
        assert_eq!(feature.structure[zone], Rgb::new(0, 0, 0));
    }

    for block in 0..16 {
        assert_eq!(feature.luma_blocks[block], 255.0, "block {block}");
    }
    for block in 16..LUMA_BLOCKS {
        assert_eq!(feature.luma_blocks[block], 0.0, "block {block}");
    }

    assert_eq!(feature.histogram.red[15], 12 * WIDTH);
    assert_eq!(feature.histogram.red[0], 24 * WIDTH);
    assert_eq!(feature.average, Rgb::new(85, 85, 85));
    assert_eq!(feature.hex, "#555555");
}

#[test]
fn average_is_floored() {
    // 1 white row out of 36: 64 * 255 / 2304 = 7.08
    let pixels = banded_raster(1);
    let feature = extract_features(&pixels, WIDTH, HEIGHT, 0.0).unwrap();
    assert_eq!(feature.average, Rgb::new(7, 7, 7));
}

#[test]
fn tiny_raster_buckets_every_pixel() {
    let pixels = flat_raster(4, 3, [100, 100, 100]);
    let feature = extract_features(&pixels, 4, 3, 0.0).unwrap();
    assert_eq!(feature.pixel_count, 12);

    let total: u32 = feature.histogram.green.iter().sum();
    assert_eq!(total, 12);
    assert!(feature.luma_blocks.iter().any(|block| *block > 0.0));
}

#[test]
fn alpha_is_ignored() {
    let mut pixels = flat_raster(WIDTH, HEIGHT, [10, 20, 30]);
    for alpha in pixels.iter_mut().skip(3).step_by(4) {
        *alpha = 0;
    }
    let feature = extract_features(&pixels, WIDTH, HEIGHT, 0.0).unwrap();
    assert_eq!(feature.average, Rgb::new(10, 20, 30));
}

#[test]
fn short_buffer_is_rejected() {
    let pixels = vec![0u8; 100];
    let error = extract_features(&pixels, WIDTH, HEIGHT, 0.0).unwrap_err();
    assert!(matches!(
        error,
        AnalysisError::InvalidFrameBuffer {
            expected: 9216,
            actual: 100
        }
    ));
}

#[test]
fn empty_raster_is_rejected() {
    assert!(extract_features(&[], 0, 0, 0.0).is_err());
}

#[test]
fn retimed_copies_everything_but_time() {
    let pixels = flat_raster(WIDTH, HEIGHT, [12, 34, 56]);
    let feature = extract_features(&pixels, WIDTH, HEIGHT, 2.0).unwrap();
    let copy = feature.retimed(7.0);
    assert_eq!(copy.timestamp, 7.0);
    assert_eq!(copy.histogram, feature.histogram);
    assert_eq!(copy.hex, feature.hex);
}

// ── Worker thread ──────────────────────────────────────────────────

#[test]
fn worker_returns_feature_and_buffer() {
    let mut worker = FeatureWorker::spawn().unwrap();
    let pixels = flat_raster(WIDTH, HEIGHT, [0, 255, 0]);
    let length = pixels.len();

    let (feature, returned) = worker.extract(3.0, WIDTH, HEIGHT, pixels).unwrap();
    assert_eq!(feature.timestamp, 3.0);
    assert_eq!(feature.hex, "#00ff00");
    assert_eq!(returned.len(), length);
}

#[test]
fn worker_matches_direct_extraction() {
    let mut worker = FeatureWorker::spawn().unwrap();
    let pixels = banded_raster(20);
    let direct = extract_features(&pixels, WIDTH, HEIGHT, 1.0).unwrap();
    let (threaded, _) = worker.extract(1.0, WIDTH, HEIGHT, pixels).unwrap();
    assert_eq!(direct, threaded);
}

#[test]
fn worker_handles_sequential_requests() {
    let mut worker = FeatureWorker::spawn().unwrap();
    for step in 0..20u8 {
        let pixels = flat_raster(WIDTH, HEIGHT, [step * 10, 0, 0]);
        let (feature, returned) = worker
            .extract(f64::from(step), WIDTH, HEIGHT, pixels)
            .unwrap();
        assert_eq!(feature.average.r, step * 10);
        assert_eq!(returned.len(), (WIDTH * HEIGHT * 4) as usize);
    }
}

#[test]
fn worker_reports_bad_buffers_and_keeps_running() {
    let mut worker = FeatureWorker::spawn().unwrap();
    assert!(worker.extract(0.0, WIDTH, HEIGHT, vec![0; 8]).is_err());

    let pixels = flat_raster(WIDTH, HEIGHT, [1, 2, 3]);
    assert!(worker.extract(0.5, WIDTH, HEIGHT, pixels).is_ok());
}
