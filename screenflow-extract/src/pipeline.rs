//! Keyframe extraction pipeline
//!
//! Every scheduled checkpoint goes through seek, analysis and a keep/discard
//! decision, strictly one after the other: a video exposes a single playback
//! position, so the next seek is only issued once the previous checkpoint is
//! decided.
//!
//! Decision policy, applied in order:
//! 1. the first checkpoint is always kept, there is nothing to compare it to;
//! 2. the last checkpoint is kept according to the `LastFramePolicy`;
//! 3. any other checkpoint is kept when it is neither low-complexity nor a
//!    near-duplicate of the most recently *kept* frame.

use crate::capture::capture_frame;
use crate::progress_tracker::ProgressTracker;
use crate::{
    CheckpointScheduler, Error, ExtractionConfig, FrameSignalAnalyzer, FrameSource,
    LastFramePolicy, PixelSampleBuffer, Result,
};
use log::{debug, info};
use screenflow_core::CapturedFrame;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

/// Why a checkpoint was kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepReason {
    First,
    Last,
    Distinct,
}

/// Why a checkpoint was discarded
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiscardReason {
    LowComplexity,
    Duplicate { similarity: f64 },
    DuplicateFinal { similarity: f64 },
}

/// Outcome for a single checkpoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    Keep(KeepReason),
    Discard(DiscardReason),
}

impl Decision {
    pub fn is_keep(&self) -> bool {
        matches!(self, Decision::Keep(_))
    }
}

/// Where the current checkpoint is in its seek/analyze/decide cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CheckpointState {
    PendingSeek,
    Analyzing,
    Kept(KeepReason),
    Discarded(DiscardReason),
}

/// Counters describing one extraction run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionStats {
    /// Checkpoints scheduled
    pub checkpoints: usize,
    /// Checkpoints actually decoded and decided
    pub scanned: usize,
    pub kept: usize,
    pub low_complexity: usize,
    pub duplicates: usize,
    /// Whether the run stopped early because `max_frames` was reached
    pub reached_frame_cap: bool,
}

/// Result of a successful extraction run
#[derive(Debug, Clone)]
pub struct ExtractionReport {
    /// Kept frames in checkpoint order
    pub frames: Vec<CapturedFrame>,
    pub stats: ExtractionStats,
}

/// Scan state of one run: the checkpoint being processed, the similarity
/// baseline and the frames accepted so far.
pub struct ScanCursor {
    checkpoints: Vec<f64>,
    position: usize,
    state: CheckpointState,
    baseline: Option<PixelSampleBuffer>,
    frames: Vec<CapturedFrame>,
    stats: ExtractionStats,
}

impl ScanCursor {
    /// Creates a cursor positioned at the first checkpoint
    pub fn new(checkpoints: Vec<f64>) -> Self {
        let stats = ExtractionStats {
            checkpoints: checkpoints.len(),
            ..Default::default()
        };
        Self {
            checkpoints,
            position: 0,
            state: CheckpointState::PendingSeek,
            baseline: None,
            frames: Vec::new(),
            stats,
        }
    }

    pub fn checkpoints(&self) -> &[f64] {
        &self.checkpoints
    }

    /// Index of the checkpoint to process next
    pub fn position(&self) -> usize {
        self.position
    }

    /// Timestamp of the checkpoint to process next
    pub fn current_time(&self) -> Option<f64> {
        self.checkpoints.get(self.position).copied()
    }

    pub fn is_exhausted(&self) -> bool {
        self.position >= self.checkpoints.len()
    }

    pub fn is_first(&self) -> bool {
        self.position == 0
    }

    pub fn is_last(&self) -> bool {
        self.position + 1 == self.checkpoints.len()
    }

    pub fn state(&self) -> CheckpointState {
        self.state
    }

    /// Sample buffer of the most recently kept frame
    pub fn baseline(&self) -> Option<&PixelSampleBuffer> {
        self.baseline.as_ref()
    }

    pub fn frames(&self) -> &[CapturedFrame] {
        &self.frames
    }

    pub fn stats(&self) -> &ExtractionStats {
        &self.stats
    }

    fn accept(&mut self, frame: CapturedFrame, sample: PixelSampleBuffer, reason: KeepReason) {
        self.frames.push(frame);
        self.baseline = Some(sample);
        self.stats.kept += 1;
        self.state = CheckpointState::Kept(reason);
    }

    fn reject(&mut self, reason: DiscardReason) {
        match reason {
            DiscardReason::LowComplexity => self.stats.low_complexity += 1,
            DiscardReason::Duplicate { .. } | DiscardReason::DuplicateFinal { .. } => {
                self.stats.duplicates += 1
            }
        }
        self.state = CheckpointState::Discarded(reason);
    }

    fn advance(&mut self) {
        self.stats.scanned += 1;
        self.position += 1;
    }

    /// Consumes the cursor, yielding the frames and counters
    pub fn into_report(self) -> ExtractionReport {
        ExtractionReport {
            frames: self.frames,
            stats: self.stats,
        }
    }
}

/// Drives checkpoint scheduling, analysis and capture for one video
pub struct ExtractionPipeline {
    config: ExtractionConfig,
    analyzer: FrameSignalAnalyzer,
    scheduler: CheckpointScheduler,
}

impl ExtractionPipeline {
    /// Creates a pipeline, rejecting out-of-range settings
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            analyzer: FrameSignalAnalyzer::from_config(&config),
            scheduler: CheckpointScheduler::from_config(&config),
            config,
        })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Checkpoints for a video of the given duration
    pub fn schedule(&self, duration: Option<f64>) -> Result<Vec<f64>> {
        self.scheduler.schedule(duration)
    }

    /// Decides whether the checkpoint under the cursor, sampled as `sample`,
    /// is kept
    pub fn decide(&self, cursor: &ScanCursor, sample: &PixelSampleBuffer) -> Decision {
        let baseline = match cursor.baseline() {
            Some(baseline) if !cursor.is_first() => baseline,
            _ => return Decision::Keep(KeepReason::First),
        };

        if cursor.is_last() {
            return match self.config.last_frame {
                LastFramePolicy::AlwaysKeep => Decision::Keep(KeepReason::Last),
                LastFramePolicy::SkipIfDuplicate { threshold } => {
                    let similarity = self.bounded_similarity(baseline, sample, threshold);
                    if similarity > threshold {
                        Decision::Discard(DiscardReason::DuplicateFinal { similarity })
                    } else {
                        Decision::Keep(KeepReason::Last)
                    }
                }
            };
        }

        if self.analyzer.is_low_complexity(sample) {
            return Decision::Discard(DiscardReason::LowComplexity);
        }

        let threshold = self.config.duplicate_threshold;
        let similarity = self.bounded_similarity(baseline, sample, threshold);
        if similarity > threshold {
            Decision::Discard(DiscardReason::Duplicate { similarity })
        } else {
            Decision::Keep(KeepReason::Distinct)
        }
    }

    /// Similarity that stops counting once it can no longer exceed `threshold`
    fn bounded_similarity(
        &self,
        baseline: &PixelSampleBuffer,
        sample: &PixelSampleBuffer,
        threshold: f64,
    ) -> f64 {
        let budget = self.analyzer.change_budget(sample, threshold);
        self.analyzer.similarity_within(baseline, sample, Some(budget))
    }

    /// Seeks, analyzes and decides the checkpoint under the cursor, then
    /// advances it. Returns `None` once the checkpoints are exhausted.
    pub fn step<S: FrameSource>(
        &self,
        source: &mut S,
        cursor: &mut ScanCursor,
    ) -> Result<Option<Decision>> {
        let Some(time) = cursor.current_time() else {
            return Ok(None);
        };

        cursor.state = CheckpointState::PendingSeek;
        let frame = source.frame_at(time).map_err(|e| match e {
            Error::MediaDecode { .. } => e,
            other => Error::MediaDecode {
                time,
                reason: other.to_string(),
            },
        })?;

        cursor.state = CheckpointState::Analyzing;
        let sample = PixelSampleBuffer::from_frame(&frame, self.config.sample_size);
        let decision = self.decide(cursor, &sample);
        debug!("checkpoint {} at {:.2}s: {:?}", cursor.position(), time, decision);

        match decision {
            Decision::Keep(reason) => {
                let captured = capture_frame(
                    frame,
                    time,
                    self.config.max_dimension,
                    self.config.capture_format,
                )?;
                cursor.accept(captured, sample, reason);
            }
            Decision::Discard(reason) => cursor.reject(reason),
        }

        cursor.advance();
        Ok(Some(decision))
    }

    /// Runs the whole extraction over `source`.
    ///
    /// `cancel` is checked before every seek. On cancellation or any error
    /// the partial output is discarded. The source is dropped on return,
    /// whatever the outcome.
    pub fn run<S: FrameSource>(&self, mut source: S, cancel: &AtomicBool) -> Result<ExtractionReport> {
        let checkpoints = self.schedule(source.duration())?;
        let (width, height) = source.dimensions();
        info!(
            "Scanning {} checkpoints of a {}x{} video every {:.2}s",
            checkpoints.len(),
            width,
            height,
            self.config.scan_interval
        );

        let mut tracker = ProgressTracker::new(checkpoints.len() as u64, 25, "Checkpoints");
        let mut cursor = ScanCursor::new(checkpoints);

        while !cursor.is_exhausted() {
            if cancel.load(Ordering::SeqCst) {
                info!("Extraction cancelled at checkpoint {}", cursor.position());
                return Err(Error::Cancelled);
            }

            self.step(&mut source, &mut cursor)?;
            tracker.increment_and_report();

            if let Some(max_frames) = self.config.max_frames {
                if cursor.frames().len() >= max_frames && !cursor.is_exhausted() {
                    info!(
                        "Reached {} kept frames, stopping before checkpoint {}",
                        max_frames,
                        cursor.position()
                    );
                    cursor.stats.reached_frame_cap = true;
                    break;
                }
            }
        }

        let report = cursor.into_report();
        info!(
            "Kept {} of {} scanned checkpoints ({} low-complexity, {} duplicates)",
            report.stats.kept,
            report.stats.scanned,
            report.stats.low_complexity,
            report.stats.duplicates
        );
        Ok(report)
    }
}
