//! Seekable video access using FFmpeg

use crate::{Error, Result};
use ffmpeg_next as ffmpeg;
use image::RgbaImage;
use std::path::Path;
use std::sync::OnceLock;

static FFMPEG_INIT: OnceLock<std::result::Result<(), ffmpeg::Error>> = OnceLock::new();

/// Initialize FFmpeg (once per process)
fn init_ffmpeg() -> Result<()> {
    (*FFMPEG_INIT.get_or_init(ffmpeg::init))?;
    Ok(())
}

/// A video that can be sampled at arbitrary instants.
///
/// Implementations expose a single playback position: each `frame_at` call
/// seeks and decodes before returning, and calls never overlap.
pub trait FrameSource {
    /// Total duration in seconds, if known
    fn duration(&self) -> Option<f64>;

    /// Native frame size (width, height)
    fn dimensions(&self) -> (u32, u32);

    /// Seeks to `time` (seconds) and returns the decoded frame shown there
    fn frame_at(&mut self, time: f64) -> Result<RgbaImage>;
}

/// Video reader that decodes frames at requested timestamps
pub struct VideoReader {
    input: ffmpeg::format::context::Input,
    video_stream_index: usize,
    time_base: f64,
    frame_rate: (u32, u32),
    decoder: ffmpeg::codec::decoder::Video,
    scaler: Option<ffmpeg::software::scaling::Context>,
}

impl VideoReader {
    /// Opens a video file
    pub fn open(path: &Path) -> Result<Self> {
        init_ffmpeg()?;

        let input = ffmpeg::format::input(&path)?;

        let video_stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| Error::InvalidMedia(format!("no video stream in {}", path.display())))?;

        let video_stream_index = video_stream.index();
        let time_base = f64::from(video_stream.time_base());
        let rate = video_stream.avg_frame_rate();
        let frame_rate = (rate.numerator().max(0) as u32, rate.denominator().max(0) as u32);

        let context = ffmpeg::codec::context::Context::from_parameters(video_stream.parameters())?;
        let decoder = context.decoder().video()?;

        Ok(Self {
            input,
            video_stream_index,
            time_base,
            frame_rate,
            decoder,
            scaler: None,
        })
    }

    /// Gets the video width
    pub fn width(&self) -> u32 {
        self.decoder.width()
    }

    /// Gets the video height
    pub fn height(&self) -> u32 {
        self.decoder.height()
    }

    /// Gets the frame rate as a rational number (numerator, denominator)
    pub fn frame_rate(&self) -> (u32, u32) {
        self.frame_rate
    }

    /// Gets the total duration in seconds, from the stream or else the container
    pub fn duration_secs(&self) -> Option<f64> {
        let stream_duration = self
            .input
            .stream(self.video_stream_index)
            .map(|s| s.duration())
            .filter(|&d| d > 0)
            .map(|d| d as f64 * self.time_base);

        stream_duration.or_else(|| {
            let duration = self.input.duration();
            (duration > 0).then(|| duration as f64 / ffmpeg::ffi::AV_TIME_BASE as f64)
        })
    }

    /// Seeks to `time` and decodes the first frame at or after it.
    ///
    /// Near the end of the stream the last decodable frame is returned.
    pub fn seek_frame(&mut self, time: f64) -> Result<RgbaImage> {
        let target = (time * ffmpeg::ffi::AV_TIME_BASE as f64) as i64;
        self.input.seek(target, ..target)?;
        self.decoder.flush();

        // Half a frame of slack so rounding in pts never skips the target.
        let slack = match self.frame_rate {
            (num, den) if num > 0 && den > 0 => 0.5 * den as f64 / num as f64,
            _ => 0.0,
        };

        let mut last: Option<ffmpeg::frame::Video> = None;

        for (stream, packet) in self.input.packets() {
            if stream.index() != self.video_stream_index {
                continue;
            }
            self.decoder.send_packet(&packet)?;

            let mut decoded = ffmpeg::frame::Video::empty();
            while self.decoder.receive_frame(&mut decoded).is_ok() {
                let frame_time = decoded
                    .timestamp()
                    .or_else(|| decoded.pts())
                    .map(|pts| pts as f64 * self.time_base);

                if frame_time.map_or(true, |t| t + slack >= time) {
                    return to_rgba(&mut self.scaler, &decoded);
                }
                last = Some(decoded);
                decoded = ffmpeg::frame::Video::empty();
            }
        }

        // Drain whatever the decoder still buffers.
        self.decoder.send_eof()?;
        let mut decoded = ffmpeg::frame::Video::empty();
        while self.decoder.receive_frame(&mut decoded).is_ok() {
            last = Some(decoded);
            decoded = ffmpeg::frame::Video::empty();
        }

        match last {
            Some(frame) => to_rgba(&mut self.scaler, &frame),
            None => Err(Error::MediaDecode {
                time,
                reason: "no frame could be decoded".into(),
            }),
        }
    }
}

impl FrameSource for VideoReader {
    fn duration(&self) -> Option<f64> {
        self.duration_secs()
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn frame_at(&mut self, time: f64) -> Result<RgbaImage> {
        self.seek_frame(time)
    }
}

/// Converts a decoded frame to a tightly packed RGBA image
fn to_rgba(
    scaler: &mut Option<ffmpeg::software::scaling::Context>,
    frame: &ffmpeg::frame::Video,
) -> Result<RgbaImage> {
    let width = frame.width();
    let height = frame.height();

    if scaler.is_none() {
        *scaler = Some(ffmpeg::software::scaling::Context::get(
            frame.format(),
            width,
            height,
            ffmpeg::format::Pixel::RGBA,
            width,
            height,
            ffmpeg::software::scaling::Flags::BILINEAR,
        )?);
    }
    let Some(scaler) = scaler.as_mut() else {
        return Err(Error::InvalidMedia("scaler unavailable".into()));
    };

    let mut rgba = ffmpeg::frame::Video::empty();
    scaler.run(frame, &mut rgba)?;

    // Rows may be padded beyond width * 4.
    let stride = rgba.stride(0);
    let row_bytes = width as usize * 4;
    let src = rgba.data(0);
    let mut data = Vec::with_capacity(row_bytes * height as usize);
    for y in 0..height as usize {
        let offset = y * stride;
        data.extend_from_slice(&src[offset..offset + row_bytes]);
    }

    RgbaImage::from_raw(width, height, data)
        .ok_or_else(|| Error::InvalidMedia(format!("bad RGBA buffer for {width}x{height} frame")))
}
