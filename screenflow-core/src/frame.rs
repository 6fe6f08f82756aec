//! Captured keyframe data structures

use serde::{Deserialize, Serialize};

/// Encoding of a captured frame's image bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageEncoding {
    Jpeg,
    Png,
}

impl ImageEncoding {
    /// MIME type for this encoding
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageEncoding::Jpeg => "image/jpeg",
            ImageEncoding::Png => "image/png",
        }
    }

    /// Conventional file extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            ImageEncoding::Jpeg => "jpg",
            ImageEncoding::Png => "png",
        }
    }
}

/// A checkpoint that was accepted into the keyframe sequence.
///
/// Frames are addressed by their position in the sequence; downstream
/// consumers (`ScreenNode::frame_index`) rely on that position being stable.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// Timestamp of the frame in seconds
    pub time: f64,
    /// Width of the encoded image in pixels
    pub width: u32,
    /// Height of the encoded image in pixels
    pub height: u32,
    /// Encoding of `data`
    pub encoding: ImageEncoding,
    /// Encoded image bytes
    pub data: Vec<u8>,
}

impl CapturedFrame {
    /// Creates a new captured frame
    pub fn new(time: f64, width: u32, height: u32, encoding: ImageEncoding, data: Vec<u8>) -> Self {
        Self {
            time,
            width,
            height,
            encoding,
            data,
        }
    }

    /// Returns the size of the encoded image in bytes
    pub fn data_size(&self) -> usize {
        self.data.len()
    }
}
