//! Solid color reader.

use layerline_core::{
    Color, Frame, FrameRate, ImageBuffer, LayerlineError, PixelFormat, Reader, ReaderInfo, Result,
    SharedFrame,
};

use crate::{ensure_in_range, ensure_open};

/// Produces the same solid-color image for every frame.
pub struct ColorReader {
    name: String,
    color: Color,
    width: u32,
    height: u32,
    frame_rate: FrameRate,
    duration_frames: i64,
    frame: Option<SharedFrame>,
}

impl ColorReader {
    pub fn new(
        name: impl Into<String>,
        color: Color,
        width: u32,
        height: u32,
        frame_rate: FrameRate,
        duration_frames: i64,
    ) -> Self {
        Self {
            name: name.into(),
            color,
            width,
            height,
            frame_rate,
            duration_frames,
            frame: None,
        }
    }
}

impl Reader for ColorReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<()> {
        if self.frame.is_none() {
            let image = ImageBuffer::filled(self.width, self.height, PixelFormat::Rgba8, self.color);
            self.frame = Some(Frame::new(0).with_image(image).into_shared());
        }
        Ok(())
    }

    fn close(&mut self) {
        self.frame = None;
    }

    fn is_open(&self) -> bool {
        self.frame.is_some()
    }

    fn info(&self) -> ReaderInfo {
        ReaderInfo {
            width: self.width,
            height: self.height,
            frame_rate: self.frame_rate,
            has_video: true,
            has_audio: false,
            sample_rate: 0,
            channels: 0,
            duration_frames: self.duration_frames,
        }
    }

    fn frame(&mut self, number: i64) -> Result<SharedFrame> {
        ensure_open(self.is_open(), &self.name)?;
        ensure_in_range(number, self.duration_frames, &self.name)?;
        self.frame
            .clone()
            .ok_or_else(|| LayerlineError::not_open(format!("reader '{}'", self.name)))
    }
}
