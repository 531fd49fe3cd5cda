//! Output format of a timeline.

use serde::{Deserialize, Serialize};

use crate::audio::SampleFormat;
use crate::error::{LayerlineError, Result};
use crate::frame::PixelFormat;
use crate::time::FrameRate;

/// Format every composited frame conforms to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputFormat {
    pub width: u32,
    pub height: u32,
    pub frame_rate: FrameRate,
    pub sample_rate: u32,
    pub channels: u16,
    pub pixel_format: PixelFormat,
    pub sample_format: SampleFormat,
}

impl OutputFormat {
    /// Create a format with RGBA8 pixels and float samples.
    pub fn new(
        width: u32,
        height: u32,
        frame_rate: FrameRate,
        sample_rate: u32,
        channels: u16,
    ) -> Self {
        Self {
            width,
            height,
            frame_rate,
            sample_rate,
            channels,
            pixel_format: PixelFormat::Rgba8,
            sample_format: SampleFormat::F32,
        }
    }

    pub fn with_pixel_format(mut self, pixel_format: PixelFormat) -> Self {
        self.pixel_format = pixel_format;
        self
    }

    pub fn with_sample_format(mut self, sample_format: SampleFormat) -> Self {
        self.sample_format = sample_format;
        self
    }

    /// Reject zero dimensions, rates or channel counts.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(LayerlineError::invalid_config(format!(
                "output dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if !self.frame_rate.is_valid() {
            return Err(LayerlineError::invalid_config(format!(
                "invalid frame rate {}/{}",
                self.frame_rate.numerator, self.frame_rate.denominator
            )));
        }
        if self.sample_rate == 0 || self.channels == 0 {
            return Err(LayerlineError::invalid_config(format!(
                "audio layout must be positive, got {} Hz x {} channels",
                self.sample_rate, self.channels
            )));
        }
        Ok(())
    }

    /// Audio samples per channel in frame `frame`.
    pub fn samples_per_frame(&self, frame: i64) -> usize {
        self.frame_rate.samples_per_frame(frame, self.sample_rate)
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(1920, 1080, FrameRate::FPS_24, 48000, 2)
    }
}
