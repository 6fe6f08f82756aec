//! Full-resolution capture of kept frames

use crate::{CaptureFormat, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbaImage};
use screenflow_core::{CapturedFrame, ImageEncoding};
use std::io::Cursor;

/// Downscales `frame` so its longer side is at most `max_dimension`,
/// preserving the aspect ratio. Smaller frames are returned untouched.
pub fn fit_within(frame: RgbaImage, max_dimension: Option<u32>) -> RgbaImage {
    let Some(max_dimension) = max_dimension else {
        return frame;
    };
    let (width, height) = frame.dimensions();
    let longest = width.max(height);
    if longest <= max_dimension {
        return frame;
    }

    let scale = max_dimension as f64 / longest as f64;
    let new_width = ((width as f64 * scale).round() as u32).max(1);
    let new_height = ((height as f64 * scale).round() as u32).max(1);
    imageops::resize(&frame, new_width, new_height, FilterType::Triangle)
}

/// Encodes an RGBA frame in the requested format
pub fn encode_frame(frame: &RgbaImage, format: CaptureFormat) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    match format {
        CaptureFormat::Jpeg { quality } => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgba8(frame.clone()).to_rgb8();
            JpegEncoder::new_with_quality(&mut data, quality).encode_image(&rgb)?;
        }
        CaptureFormat::Png => {
            frame.write_to(&mut Cursor::new(&mut data), ImageFormat::Png)?;
        }
    }
    Ok(data)
}

/// Turns a decoded frame into a `CapturedFrame` at `time`
pub fn capture_frame(
    frame: RgbaImage,
    time: f64,
    max_dimension: Option<u32>,
    format: CaptureFormat,
) -> Result<CapturedFrame> {
    let frame = fit_within(frame, max_dimension);
    let data = encode_frame(&frame, format)?;
    let encoding = match format {
        CaptureFormat::Jpeg { .. } => ImageEncoding::Jpeg,
        CaptureFormat::Png => ImageEncoding::Png,
    };
    Ok(CapturedFrame::new(time, frame.width(), frame.height(), encoding, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_fit_within_preserves_aspect() {
        let frame = RgbaImage::new(1920, 1080);
        let fitted = fit_within(frame, Some(1280));
        assert_eq!(fitted.dimensions(), (1280, 720));
    }

    #[test]
    fn test_fit_within_leaves_small_frames() {
        let frame = RgbaImage::new(640, 480);
        assert_eq!(fit_within(frame.clone(), Some(1280)).dimensions(), (640, 480));
        assert_eq!(fit_within(frame, None).dimensions(), (640, 480));
    }

    #[test]
    fn test_capture_png_decodes_back() {
        let frame = RgbaImage::from_pixel(40, 20, Rgba([1, 2, 3, 255]));
        let captured = capture_frame(frame, 2.5, Some(20), CaptureFormat::Png).unwrap();

        assert_eq!(captured.time, 2.5);
        assert_eq!((captured.width, captured.height), (20, 10));
        assert_eq!(captured.encoding, ImageEncoding::Png);

        let decoded = image::load_from_memory(&captured.data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (20, 10));
    }

    #[test]
    fn test_capture_jpeg_signature() {
        let frame = RgbaImage::from_pixel(16, 16, Rgba([200, 10, 10, 255]));
        let captured = capture_frame(frame, 0.0, None, CaptureFormat::Jpeg { quality: 80 }).unwrap();

        assert_eq!(captured.encoding, ImageEncoding::Jpeg);
        assert_eq!(&captured.data[..2], &[0xFF, 0xD8]);
    }
}
