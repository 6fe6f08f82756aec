//! Frame signal analysis: complexity and pairwise similarity
//!
//! Both measures run on a `PixelSampleBuffer` and inspect every
//! `stride`-th pixel in row-major order.

use crate::{ExtractionConfig, PixelSampleBuffer};

/// Scores sample buffers for visual complexity and similarity
#[derive(Debug, Clone)]
pub struct FrameSignalAnalyzer {
    complexity_threshold: f64,
    noise_floor: u32,
    stride: usize,
}

impl FrameSignalAnalyzer {
    /// Creates an analyzer; a zero stride is treated as 1
    pub fn new(complexity_threshold: f64, noise_floor: u32, stride: usize) -> Self {
        Self {
            complexity_threshold,
            noise_floor,
            stride: stride.max(1),
        }
    }

    /// Creates an analyzer from the extraction settings
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(
            config.complexity_threshold,
            config.noise_floor,
            config.sample_stride,
        )
    }

    /// Standard deviation of the sampled colors around their mean color.
    ///
    /// 0 for a single-color buffer, about 127.5 for a black/white checkerboard.
    pub fn complexity(&self, buffer: &PixelSampleBuffer) -> f64 {
        let mut sum = [0u64; 3];
        let mut count: u64 = 0;
        for px in sampled_pixels(buffer.as_raw(), self.stride) {
            sum[0] += px[0] as u64;
            sum[1] += px[1] as u64;
            sum[2] += px[2] as u64;
            count += 1;
        }
        if count == 0 {
            return 0.0;
        }

        let n = count as f64;
        let mean = [sum[0] as f64 / n, sum[1] as f64 / n, sum[2] as f64 / n];

        let mut squared = 0.0;
        for px in sampled_pixels(buffer.as_raw(), self.stride) {
            let dr = px[0] as f64 - mean[0];
            let dg = px[1] as f64 - mean[1];
            let db = px[2] as f64 - mean[2];
            squared += (dr * dr + dg * dg + db * db) / 3.0;
        }

        (squared / n).sqrt()
    }

    /// Checks if the buffer carries too little visual information to keep
    /// (solid color, blank loading screen, a lone spinner)
    pub fn is_low_complexity(&self, buffer: &PixelSampleBuffer) -> bool {
        self.complexity(buffer) < self.complexity_threshold
    }

    /// Fraction of sampled pixels that did not change, in [0, 1].
    ///
    /// Buffers of different resolution are treated as completely different.
    pub fn similarity(&self, a: &PixelSampleBuffer, b: &PixelSampleBuffer) -> f64 {
        self.similarity_within(a, b, None)
    }

    /// Like `similarity`, but gives up and returns 0 as soon as more than
    /// `max_changed` pixels differ.
    pub fn similarity_within(
        &self,
        a: &PixelSampleBuffer,
        b: &PixelSampleBuffer,
        max_changed: Option<usize>,
    ) -> f64 {
        if !a.same_size(b) {
            return 0.0;
        }

        let mut sampled: usize = 0;
        let mut changed: usize = 0;
        for (pa, pb) in sampled_pixels(a.as_raw(), self.stride).zip(sampled_pixels(b.as_raw(), self.stride)) {
            sampled += 1;
            if pixel_difference(pa, pb) > self.noise_floor {
                changed += 1;
                if max_changed.is_some_and(|budget| changed > budget) {
                    return 0.0;
                }
            }
        }

        if sampled == 0 {
            return 1.0;
        }
        1.0 - changed as f64 / sampled as f64
    }

    /// Largest number of changed pixels for which the similarity of two
    /// buffers like `buffer` still reaches `threshold`
    pub fn change_budget(&self, buffer: &PixelSampleBuffer, threshold: f64) -> usize {
        let sampled = buffer.pixel_count().div_ceil(self.stride);
        ((1.0 - threshold).max(0.0) * sampled as f64).floor() as usize
    }
}

/// Every `stride`-th RGBA pixel of a raw buffer
fn sampled_pixels(raw: &[u8], stride: usize) -> impl Iterator<Item = &[u8]> {
    raw.chunks_exact(4).step_by(stride)
}

/// Summed absolute RGB difference between two pixels (0 - 765)
fn pixel_difference(a: &[u8], b: &[u8]) -> u32 {
    let dr = (a[0] as i32 - b[0] as i32).unsigned_abs();
    let dg = (a[1] as i32 - b[1] as i32).unsigned_abs();
    let db = (a[2] as i32 - b[2] as i32).unsigned_abs();
    dr + dg + db
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn analyzer() -> FrameSignalAnalyzer {
        FrameSignalAnalyzer::from_config(&ExtractionConfig::default())
    }

    fn checkerboard(size: u32) -> PixelSampleBuffer {
        PixelSampleBuffer::from_image(RgbaImage::from_fn(size, size, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        }))
    }

    #[test]
    fn test_uniform_buffers_are_low_complexity() {
        let analyzer = analyzer();
        for color in [[0, 0, 0], [255, 255, 255], [12, 200, 87], [128, 128, 128]] {
            let buffer = PixelSampleBuffer::uniform(128, Rgba([color[0], color[1], color[2], 255]));
            assert_eq!(analyzer.complexity(&buffer), 0.0);
            assert!(analyzer.is_low_complexity(&buffer));
        }
    }

    #[test]
    fn test_checkerboard_is_not_low_complexity() {
        for stride in [1, 2, 3, 4] {
            let analyzer = FrameSignalAnalyzer::new(12.0, 48, stride);
            let buffer = checkerboard(128);
            assert!(analyzer.complexity(&buffer) > 100.0);
            assert!(!analyzer.is_low_complexity(&buffer));
        }
    }

    #[test]
    fn test_small_spinner_is_low_complexity() {
        // A 4x4 dark blob on a white 128x128 screen.
        let buffer = PixelSampleBuffer::from_image(RgbaImage::from_fn(128, 128, |x, y| {
            if (62..66).contains(&x) && (62..66).contains(&y) {
                Rgba([40, 40, 40, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        }));
        assert!(analyzer().is_low_complexity(&buffer));
    }

    #[test]
    fn test_identical_buffers_are_fully_similar() {
        let a = checkerboard(64);
        let b = a.clone();
        assert_eq!(analyzer().similarity(&a, &b), 1.0);
    }

    #[test]
    fn test_completely_different_buffers() {
        let black = PixelSampleBuffer::uniform(64, Rgba([0, 0, 0, 255]));
        let white = PixelSampleBuffer::uniform(64, Rgba([255, 255, 255, 255]));
        assert_eq!(analyzer().similarity(&black, &white), 0.0);
    }

    #[test]
    fn test_noise_below_floor_is_ignored() {
        let a = PixelSampleBuffer::uniform(64, Rgba([100, 100, 100, 255]));
        // 15 + 15 + 15 = 45, below the default floor of 48.
        let b = PixelSampleBuffer::uniform(64, Rgba([115, 115, 115, 255]));
        assert_eq!(analyzer().similarity(&a, &b), 1.0);
    }

    #[test]
    fn test_partial_change() {
        let analyzer = FrameSignalAnalyzer::new(12.0, 48, 1);
        let a = PixelSampleBuffer::uniform(10, Rgba([255, 255, 255, 255]));
        // Top quarter of the rows turns black.
        let b = PixelSampleBuffer::from_image(RgbaImage::from_fn(10, 10, |_, y| {
            if y < 3 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        }));
        assert!((analyzer.similarity(&a, &b) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_early_exit_over_budget() {
        let analyzer = FrameSignalAnalyzer::new(12.0, 48, 1);
        let a = PixelSampleBuffer::uniform(10, Rgba([255, 255, 255, 255]));
        let b = PixelSampleBuffer::from_image(RgbaImage::from_fn(10, 10, |_, y| {
            if y < 3 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        }));

        let budget = analyzer.change_budget(&a, 0.95);
        assert_eq!(budget, 5);
        assert_eq!(analyzer.similarity_within(&a, &b, Some(budget)), 0.0);
        assert!((analyzer.similarity_within(&a, &b, Some(30)) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_different_sizes_are_dissimilar() {
        let a = PixelSampleBuffer::uniform(32, Rgba([0, 0, 0, 255]));
        let b = PixelSampleBuffer::uniform(16, Rgba([0, 0, 0, 255]));
        assert_eq!(analyzer().similarity(&a, &b), 0.0);
    }
}
