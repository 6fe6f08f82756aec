//! Downscaled comparison buffers

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

/// A small fixed-resolution RGBA copy of a single video instant.
///
/// Only used for numeric comparison; never shown or stored.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelSampleBuffer {
    image: RgbaImage,
}

impl PixelSampleBuffer {
    /// Downscales a decoded frame to a `size` x `size` buffer
    pub fn from_frame(frame: &RgbaImage, size: u32) -> Self {
        let image = if frame.width() == size && frame.height() == size {
            frame.clone()
        } else {
            imageops::resize(frame, size, size, FilterType::Triangle)
        };
        Self { image }
    }

    /// Wraps an already downscaled image
    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    /// A buffer filled with a single color
    pub fn uniform(size: u32, color: Rgba<u8>) -> Self {
        Self {
            image: RgbaImage::from_pixel(size, size, color),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Number of pixels in the buffer
    pub fn pixel_count(&self) -> usize {
        self.image.width() as usize * self.image.height() as usize
    }

    /// Raw RGBA bytes in row-major order
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Checks if both buffers have the same resolution
    pub fn same_size(&self, other: &Self) -> bool {
        self.image.dimensions() == other.image.dimensions()
    }
}
