//! Screenflow Extraction Library
//!
//! This library reduces a screen recording to a short, chronologically ordered
//! list of keyframes showing distinct UI states. Transitions, blank loading
//! screens and near-duplicates are discarded.

pub mod capture;
pub mod checkpoint;
pub mod pipeline;
pub mod progress_tracker;
pub mod sample;
pub mod signal;
pub mod video_reader;

pub use checkpoint::CheckpointScheduler;
pub use pipeline::{
    CheckpointState, Decision, DiscardReason, ExtractionPipeline, ExtractionReport, ExtractionStats,
    KeepReason, ScanCursor,
};
pub use sample::PixelSampleBuffer;
pub use signal::FrameSignalAnalyzer;
pub use video_reader::{FrameSource, VideoReader};

use serde::{Deserialize, Serialize};

/// Result type for screenflow-extract operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for screenflow-extract operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Screenflow core error: {0}")]
    Core(#[from] screenflow_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("FFmpeg error: {0}")]
    Ffmpeg(#[from] ffmpeg_next::Error),

    #[error("Invalid media: {0}")]
    InvalidMedia(String),

    #[error("Media decode error at {time:.2}s: {reason}")]
    MediaDecode { time: f64, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Extraction cancelled")]
    Cancelled,
}

/// What to do with the forced final checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LastFramePolicy {
    /// Keep the final frame no matter what it looks like
    AlwaysKeep,
    /// Drop the final frame when its similarity to the last kept frame is
    /// above `threshold`
    SkipIfDuplicate { threshold: f64 },
}

impl Default for LastFramePolicy {
    fn default() -> Self {
        LastFramePolicy::AlwaysKeep
    }
}

/// Image encoding used for kept frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum CaptureFormat {
    /// JPEG with quality 1-100
    Jpeg { quality: u8 },
    Png,
}

impl Default for CaptureFormat {
    fn default() -> Self {
        CaptureFormat::Jpeg { quality: 85 }
    }
}

/// Extraction configuration
///
/// Every tuning knob of the pipeline lives here. Unknown fields in a config
/// file fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Seconds between regular checkpoints (0.05 - 60)
    pub scan_interval: f64,
    /// Maximum number of kept frames (None = unlimited)
    pub max_frames: Option<usize>,
    /// Maximum number of scheduled checkpoints, at least 2 (None = unlimited)
    pub max_checkpoints: Option<usize>,
    /// Side length of the square comparison buffer in pixels (64 - 320)
    pub sample_size: u32,
    /// Every n-th pixel of the comparison buffer is inspected (>= 1)
    pub sample_stride: usize,
    /// Color standard deviation below which a frame counts as blank (0 - 255)
    pub complexity_threshold: f64,
    /// Summed RGB difference above which a pixel counts as changed (0 - 765)
    pub noise_floor: u32,
    /// Similarity above which a frame duplicates the last kept one (0.5 - 1.0)
    pub duplicate_threshold: f64,
    /// Handling of the forced final checkpoint
    pub last_frame: LastFramePolicy,
    /// Longest side of kept frames in pixels (None = native resolution)
    pub max_dimension: Option<u32>,
    /// Encoding of kept frames
    pub capture_format: CaptureFormat,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            scan_interval: 1.0,
            max_frames: Some(40),
            max_checkpoints: None,
            sample_size: 128,
            sample_stride: 2,
            complexity_threshold: 12.0,
            noise_floor: 48,
            duplicate_threshold: 0.95,
            last_frame: LastFramePolicy::AlwaysKeep,
            max_dimension: Some(1280),
            capture_format: CaptureFormat::default(),
        }
    }
}

impl ExtractionConfig {
    /// Checks every field against its valid range
    pub fn validate(&self) -> Result<()> {
        fn invalid(msg: String) -> Result<()> {
            Err(Error::InvalidConfig(msg))
        }

        if !self.scan_interval.is_finite() || !(0.05..=60.0).contains(&self.scan_interval) {
            return invalid(format!("scan_interval {} outside 0.05..=60", self.scan_interval));
        }
        if self.max_frames == Some(0) {
            return invalid("max_frames must be at least 1".into());
        }
        if matches!(self.max_checkpoints, Some(n) if n < 2) {
            return invalid("max_checkpoints must be at least 2".into());
        }
        if !(64..=320).contains(&self.sample_size) {
            return invalid(format!("sample_size {} outside 64..=320", self.sample_size));
        }
        if self.sample_stride == 0 {
            return invalid("sample_stride must be at least 1".into());
        }
        if !(0.0..=255.0).contains(&self.complexity_threshold) {
            return invalid(format!(
                "complexity_threshold {} outside 0..=255",
                self.complexity_threshold
            ));
        }
        if self.noise_floor > 765 {
            return invalid(format!("noise_floor {} above 765", self.noise_floor));
        }
        if !(0.5..=1.0).contains(&self.duplicate_threshold) {
            return invalid(format!(
                "duplicate_threshold {} outside 0.5..=1.0",
                self.duplicate_threshold
            ));
        }
        if let LastFramePolicy::SkipIfDuplicate { threshold } = self.last_frame {
            if !(0.5..=1.0).contains(&threshold) {
                return invalid(format!("last frame threshold {threshold} outside 0.5..=1.0"));
            }
        }
        if self.max_dimension == Some(0) {
            return invalid("max_dimension must be at least 1".into());
        }
        if let CaptureFormat::Jpeg { quality } = self.capture_format {
            if !(1..=100).contains(&quality) {
                return invalid(format!("JPEG quality {quality} outside 1..=100"));
            }
        }
        Ok(())
    }
}
