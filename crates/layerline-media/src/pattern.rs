//! Generated video source: scrolling color bars with an optional tone.
//!
//! Stands in for a decoded video file. Every frame is distinct (the bars
//! shift by `speed` columns per frame), which makes it useful for checking
//! frame mapping.

use layerline_core::{Frame, FrameRate, ImageBuffer, Reader, ReaderInfo, Result, SharedFrame};
use tracing::debug;

use crate::tone::Tone;
use crate::{ensure_in_range, ensure_open};

/// Color-bar video reader.
pub struct PatternReader {
    name: String,
    width: u32,
    height: u32,
    frame_rate: FrameRate,
    frame_count: i64,
    speed: u32,
    tone: Option<Tone>,
    open: bool,
}

impl PatternReader {
    pub fn new(
        name: impl Into<String>,
        width: u32,
        height: u32,
        frame_rate: FrameRate,
        frame_count: i64,
    ) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            frame_rate,
            frame_count,
            speed: 1,
            tone: None,
            open: false,
        }
    }

    /// Columns the bars move per frame.
    pub fn with_speed(mut self, speed: u32) -> Self {
        self.speed = speed;
        self
    }

    /// Attach an audio track.
    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = Some(tone);
        self
    }

    /// Get the video dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Presentation time of `frame` in seconds.
    pub fn pts(&self, frame: i64) -> f64 {
        frame as f64 / self.frame_rate.to_fps_f64()
    }

    /// Column offset of the bars in `frame`.
    pub fn offset(&self, frame: i64) -> u32 {
        if self.width == 0 {
            return 0;
        }
        let shift = frame as u64 * self.speed as u64;
        (shift % self.width as u64) as u32
    }
}

impl Reader for PatternReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<()> {
        debug!(
            reader = %self.name,
            width = self.width,
            height = self.height,
            frames = self.frame_count,
            "opening pattern source"
        );
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn info(&self) -> ReaderInfo {
        ReaderInfo {
            width: self.width,
            height: self.height,
            frame_rate: self.frame_rate,
            has_video: true,
            has_audio: self.tone.is_some(),
            sample_rate: self.tone.map_or(0, |t| t.sample_rate),
            channels: self.tone.map_or(0, |t| t.channels),
            duration_frames: self.frame_count,
        }
    }

    fn frame(&mut self, number: i64) -> Result<SharedFrame> {
        ensure_open(self.open, &self.name)?;
        ensure_in_range(number, self.frame_count, &self.name)?;

        let image = ImageBuffer::test_pattern(self.width, self.height, self.offset(number));
        let mut frame = Frame::new(number).with_image(image);
        if let Some(tone) = &self.tone {
            frame = frame.with_audio(tone.block(number, self.frame_rate)?);
        }
        Ok(frame.into_shared())
    }
}
