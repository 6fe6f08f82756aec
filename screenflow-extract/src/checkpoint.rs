//! Checkpoint scheduling
//!
//! A checkpoint is a timestamp at which the video is sampled for a keep or
//! discard decision. The schedule always starts at 0 and always ends close to
//! the true end of the video so the terminal UI state is never missed.

use crate::{Error, ExtractionConfig, Result};

/// Distance kept from the true end of the video. Seeking to the exact end
/// tends to hit end-of-stream instead of a frame.
pub const END_MARGIN: f64 = 0.05;

/// Minimum distance between the forced final checkpoint and its predecessor
pub const END_TOLERANCE: f64 = 0.1;

/// Builds the ordered list of timestamps to sample
#[derive(Debug, Clone)]
pub struct CheckpointScheduler {
    scan_interval: f64,
    max_checkpoints: Option<usize>,
}

impl CheckpointScheduler {
    /// Creates a scheduler
    pub fn new(scan_interval: f64, max_checkpoints: Option<usize>) -> Self {
        Self {
            scan_interval,
            max_checkpoints,
        }
    }

    /// Creates a scheduler from the extraction settings
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.scan_interval, config.max_checkpoints)
    }

    /// Computes the checkpoints for a video of the given duration.
    ///
    /// The result is strictly increasing, starts at 0 and ends at
    /// `max(0, duration - END_MARGIN)` unless that instant is already within
    /// `END_TOLERANCE` of the first checkpoint.
    pub fn schedule(&self, duration: Option<f64>) -> Result<Vec<f64>> {
        let duration = match duration {
            None => return Err(Error::InvalidMedia("duration unavailable".into())),
            Some(d) if !d.is_finite() || d <= 0.0 => {
                return Err(Error::InvalidMedia(format!("invalid duration {d}")))
            }
            Some(d) => d,
        };
        if !self.scan_interval.is_finite() || self.scan_interval <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "scan interval {} must be a positive number",
                self.scan_interval
            )));
        }

        // Leave room for the forced final checkpoint.
        let regular_cap = self.max_checkpoints.map(|n| n.saturating_sub(1).max(1));

        let mut checkpoints = Vec::new();
        let mut i: u64 = 0;
        loop {
            let t = i as f64 * self.scan_interval;
            if t >= duration || regular_cap.is_some_and(|cap| checkpoints.len() >= cap) {
                break;
            }
            checkpoints.push(t);
            i += 1;
        }

        let end = (duration - END_MARGIN).max(0.0);
        while checkpoints.len() > 1 && checkpoints.last().is_some_and(|&t| t >= end - END_TOLERANCE) {
            checkpoints.pop();
        }
        // Only the checkpoint at 0 is left and it already covers the end.
        let start_covers_end = checkpoints.len() == 1 && end < END_TOLERANCE;
        if !start_covers_end {
            checkpoints.push(end);
        }

        Ok(checkpoints)
    }
}
