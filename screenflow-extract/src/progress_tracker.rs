//! Progress reporting with ETA estimation

use log::info;
use std::time::Instant;

/// Logs checkpoint progress with an ETA every `report_interval` steps
pub struct ProgressTracker {
    total: u64,
    processed: u64,
    report_interval: u64,
    start_time: Instant,
    label: String,
}

impl ProgressTracker {
    /// Creates a new progress tracker
    pub fn new(total: u64, report_interval: u64, label: &str) -> Self {
        Self {
            total,
            processed: 0,
            report_interval: report_interval.max(1),
            start_time: Instant::now(),
            label: label.to_string(),
        }
    }

    /// Number of steps recorded so far
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Records one finished step and logs progress when due
    pub fn increment_and_report(&mut self) {
        self.processed += 1;
        if self.processed % self.report_interval == 0 || self.processed == self.total {
            self.report();
        }
    }

    fn report(&self) {
        let elapsed_secs = self.start_time.elapsed().as_secs_f64();
        let current = self.processed;

        if current < self.total {
            let percent = current as f64 / self.total as f64 * 100.0;
            let rate = current as f64 / elapsed_secs.max(f64::EPSILON);
            let remaining = (self.total - current) as f64 / rate;
            info!(
                "{} {}/{} ({:.1}%) - elapsed: {} - ETA: {}",
                self.label,
                current,
                self.total,
                percent,
                format_duration(elapsed_secs),
                format_duration(remaining),
            );
        } else {
            info!(
                "{} {}/{} (100.0%) - completed in {}",
                self.label,
                current,
                self.total,
                format_duration(elapsed_secs),
            );
        }
    }
}

/// Formats seconds into a human-readable duration string
pub fn format_duration(secs: f64) -> String {
    if secs < 60.0 {
        return format!("{secs:.1}s");
    }
    let whole = secs.round() as u64;
    let (hours, mins, rest) = (whole / 3600, (whole % 3600) / 60, whole % 60);
    if hours == 0 {
        format!("{mins}m {rest}s")
    } else {
        format!("{hours}h {mins}m {rest}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(12.34), "12.3s");
        assert_eq!(format_duration(125.0), "2m 5s");
        assert_eq!(format_duration(3725.0), "1h 2m 5s");
    }

    #[test]
    fn test_counts_steps() {
        let mut tracker = ProgressTracker::new(3, 10, "Scanning");
        tracker.increment_and_report();
        tracker.increment_and_report();
        assert_eq!(tracker.processed(), 2);
    }
}
