//! Synthetic frame sources shared by the integration tests.

#![allow(dead_code)]

use shotlens::{AnalysisError, FrameSource};

/// A video made of flat-colored scenes.
///
/// `scenes` holds `(start_time, [r, g, b])` pairs in time order; the frame
/// at `t` takes the color of the last scene starting at or before `t`.
pub struct SyntheticVideo {
    pub duration: f64,
    pub name: String,
    pub size: u64,
    pub scenes: Vec<(f64, [u8; 3])>,
    /// Every timestamp passed to `capture`, with the requested width.
    pub captures: Vec<(f64, u32)>,
    /// Fail the capture at this index.
    pub fail_at: Option<usize>,
}

impl SyntheticVideo {
    pub fn new(duration: f64, scenes: Vec<(f64, [u8; 3])>) -> Self {
        Self {
            duration,
            name: "synthetic.mp4".to_string(),
            size: 50 * 1024 * 1024,
            scenes,
            captures: Vec::new(),
            fail_at: None,
        }
    }

    /// Ten seconds with a hard cut from red to blue at 5.0 s.
    pub fn hard_cut() -> Self {
        Self::new(10.0, vec![(0.0, RED), (5.0, BLUE)])
    }

    pub fn color_at(&self, time: f64) -> [u8; 3] {
        self.scenes
            .iter()
            .rev()
            .find(|(start, _)| *start <= time + 1e-9)
            .map(|(_, color)| *color)
            .unwrap_or([0, 0, 0])
    }

    /// Timestamps captured at a given raster width.
    pub fn capture_times(&self, width: u32) -> Vec<f64> {
        self.captures
            .iter()
            .filter(|(_, w)| *w == width)
            .map(|(t, _)| *t)
            .collect()
    }
}

impl FrameSource for SyntheticVideo {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn size_hint(&self) -> u64 {
        self.size
    }

    fn capture(
        &mut self,
        timestamp: f64,
        width: u32,
        height: u32,
        buffer: &mut Vec<u8>,
    ) -> Result<(), AnalysisError> {
        if self.fail_at == Some(self.captures.len()) {
            return Err(AnalysisError::SeekFailed {
                timestamp,
                reason: "synthetic failure".to_string(),
            });
        }
        self.captures.push((timestamp, width));
        let [r, g, b] = self.color_at(timestamp);
        buffer.clear();
        for _ in 0..(width * height) {
            buffer.extend_from_slice(&[r, g, b, 255]);
        }
        Ok(())
    }
}

pub const RED: [u8; 3] = [200, 40, 40];
pub const BLUE: [u8; 3] = [30, 60, 200];
pub const GREEN: [u8; 3] = [40, 180, 60];
pub const YELLOW: [u8; 3] = [220, 200, 30];

/// A flat RGBA raster.
pub fn flat_raster(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let [r, g, b] = color;
    [r, g, b, 255].repeat((width * height) as usize)
}
