//! Per-frame color and luma signatures.
//!
//! [`extract_features`] turns one downscaled RGBA raster into a
//! [`FrameFeature`]: a 16-bin histogram per channel, a 3×3 grid of zonal
//! average colors, an 8×6 grid of average luma, the global average color and
//! its HSB form. Everything is computed in a single pass over the pixels.
//!
//! # Example
//!
//! ```
//! use shotlens::features::extract_features;
//!
//! let width = 64;
//! let height = 36;
//! let red: Vec<u8> = [255, 0, 0, 255].repeat((width * height) as usize);
//! let feature = extract_features(&red, width, height, 0.0)?;
//! assert_eq!(feature.hex, "#ff0000");
//! assert_eq!(feature.hsb.hue, 0.0);
//! # Ok::<(), shotlens::AnalysisError>(())
//! ```

use crate::error::AnalysisError;

/// Number of histogram bins per channel.
pub const HISTOGRAM_BINS: usize = 16;
/// Width of one histogram bin in 8-bit channel values.
pub const HISTOGRAM_BIN_WIDTH: u8 = 16;
/// Columns and rows of the zonal structure grid.
pub const STRUCTURE_GRID: usize = 3;
/// Number of zones in the structure grid.
pub const STRUCTURE_ZONES: usize = STRUCTURE_GRID * STRUCTURE_GRID;
/// Columns of the luma block grid.
pub const LUMA_COLUMNS: usize = 8;
/// Rows of the luma block grid.
pub const LUMA_ROWS: usize = 6;
/// Number of blocks in the luma grid.
pub const LUMA_BLOCKS: usize = LUMA_COLUMNS * LUMA_ROWS;

/// An 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Lowercase `#rrggbb` encoding.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Convert to hue (degrees), saturation and brightness (percent).
    pub fn to_hsb(self) -> Hsb {
        let r = self.r as f64 / 255.0;
        let g = self.g as f64 / 255.0;
        let b = self.b as f64 / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let saturation = if max == 0.0 { 0.0 } else { delta / max };

        let hue = if delta == 0.0 {
            0.0
        } else if max == r {
            (g - b) / delta + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / delta + 2.0
        } else {
            (r - g) / delta + 4.0
        };

        Hsb {
            hue: hue / 6.0 * 360.0,
            saturation: saturation * 100.0,
            brightness: max * 100.0,
        }
    }
}

/// Hue in degrees (0–360), saturation and brightness in percent (0–100).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hsb {
    pub hue: f64,
    pub saturation: f64,
    pub brightness: f64,
}

/// Per-channel 16-bin histograms.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Histogram {
    pub red: [u32; HISTOGRAM_BINS],
    pub green: [u32; HISTOGRAM_BINS],
    pub blue: [u32; HISTOGRAM_BINS],
}

impl Histogram {
    /// Sum of absolute per-bin differences across all three channels.
    pub fn absolute_difference(&self, other: &Histogram) -> u64 {
        let channel = |a: &[u32; HISTOGRAM_BINS], b: &[u32; HISTOGRAM_BINS]| -> u64 {
            a.iter()
                .zip(b)
                .map(|(&x, &y)| u64::from(x.abs_diff(y)))
                .sum()
        };
        channel(&self.red, &other.red)
            + channel(&self.green, &other.green)
            + channel(&self.blue, &other.blue)
    }
}

/// The color and luma signature of one sampled frame.
///
/// Produced once per sample and never mutated; [`retimed`](FrameFeature::retimed)
/// makes a copy at another timestamp for chart backfill.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameFeature {
    /// Sample time in seconds.
    pub timestamp: f64,
    pub histogram: Histogram,
    /// Average color of each zone of the 3×3 grid, row-major.
    pub structure: [Rgb; STRUCTURE_ZONES],
    /// Average luma of each block of the 8×6 grid, row-major.
    pub luma_blocks: [f64; LUMA_BLOCKS],
    /// Floored mean color over all pixels.
    pub average: Rgb,
    pub hsb: Hsb,
    /// `average` as `#rrggbb`.
    pub hex: String,
    /// Pixels in the raster this feature was computed from.
    pub pixel_count: u32,
}

impl FrameFeature {
    /// Copy this feature to a different timestamp.
    pub fn retimed(&self, timestamp: f64) -> FrameFeature {
        FrameFeature {
            timestamp,
            ..self.clone()
        }
    }
}

/// Fixed-point BT.601-style luma.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u32 {
    (54 * u32::from(r) + 183 * u32::from(g) + 19 * u32::from(b)) >> 8
}

#[derive(Clone, Copy, Default)]
struct ZoneSum {
    r: u64,
    g: u64,
    b: u64,
    count: u64,
}

/// Compute the [`FrameFeature`] of a tightly packed RGBA raster.
///
/// Alpha is ignored. The buffer may be longer than `width × height × 4`;
/// trailing bytes are not read.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidFrameBuffer`] if the buffer is too short
/// or the raster is empty.
pub fn extract_features(
    rgba: &[u8],
    width: u32,
    height: u32,
    timestamp: f64,
) -> Result<FrameFeature, AnalysisError> {
    let width_px = width as usize;
    let height_px = height as usize;
    let pixel_count = width_px * height_px;
    let expected = pixel_count * 4;
    if pixel_count == 0 || rgba.len() < expected {
        return Err(AnalysisError::InvalidFrameBuffer {
            expected,
            actual: rgba.len(),
        });
    }

    let mut histogram = Histogram::default();
    let mut zones = [ZoneSum::default(); STRUCTURE_ZONES];
    let mut luma_sums = [0u64; LUMA_BLOCKS];
    let mut luma_counts = [0u64; LUMA_BLOCKS];
    let (mut r_sum, mut g_sum, mut b_sum) = (0u64, 0u64, 0u64);

    let zone_width = width as f64 / STRUCTURE_GRID as f64;
    let zone_height = height as f64 / STRUCTURE_GRID as f64;
    let block_width = (width_px / LUMA_COLUMNS).max(1);
    let block_height = (height_px / LUMA_ROWS).max(1);
    let bin_width = usize::from(HISTOGRAM_BIN_WIDTH);

    for (index, pixel) in rgba[..expected].chunks_exact(4).enumerate() {
        let (r, g, b) = (pixel[0], pixel[1], pixel[2]);
        let x = index % width_px;
        let y = index / width_px;

        r_sum += u64::from(r);
        g_sum += u64::from(g);
        b_sum += u64::from(b);

        histogram.red[usize::from(r) / bin_width] += 1;
        histogram.green[usize::from(g) / bin_width] += 1;
        histogram.blue[usize::from(b) / bin_width] += 1;

        let column = ((x as f64 / zone_width) as usize).min(STRUCTURE_GRID - 1);
        let row = ((y as f64 / zone_height) as usize).min(STRUCTURE_GRID - 1);
        let zone = &mut zones[row * STRUCTURE_GRID + column];
        zone.r += u64::from(r);
        zone.g += u64::from(g);
        zone.b += u64::from(b);
        zone.count += 1;

        let block_x = (x / block_width).min(LUMA_COLUMNS - 1);
        let block_y = (y / block_height).min(LUMA_ROWS - 1);
        let block = block_y * LUMA_COLUMNS + block_x;
        luma_sums[block] += u64::from(luma(r, g, b));
        luma_counts[block] += 1;
    }

    let pixels = pixel_count as u64;
    let average = Rgb::new(
        (r_sum / pixels) as u8,
        (g_sum / pixels) as u8,
        (b_sum / pixels) as u8,
    );

    let structure = zones.map(|zone| {
        if zone.count == 0 {
            Rgb::default()
        } else {
            Rgb::new(
                (zone.r / zone.count) as u8,
                (zone.g / zone.count) as u8,
                (zone.b / zone.count) as u8,
            )
        }
    });

    let mut luma_blocks = [0.0; LUMA_BLOCKS];
    for (block, value) in luma_blocks.iter_mut().enumerate() {
        if luma_counts[block] > 0 {
            *value = luma_sums[block] as f64 / luma_counts[block] as f64;
        }
    }

    Ok(FrameFeature {
        timestamp,
        histogram,
        structure,
        luma_blocks,
        average,
        hsb: average.to_hsb(),
        hex: average.to_hex(),
        pixel_count: pixel_count as u32,
    })
}
