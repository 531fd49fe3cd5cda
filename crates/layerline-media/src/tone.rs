//! Audio-only sine tone reader.

use layerline_core::{
    AudioBuffer, Frame, FrameRate, LayerlineError, Reader, ReaderInfo, Result, SharedFrame,
};
use std::f64::consts::TAU;

use crate::{ensure_in_range, ensure_open};

/// Sine tone parameters shared by the tone and pattern readers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency: f64,
    pub amplitude: f32,
    pub sample_rate: u32,
    pub channels: u16,
}

impl Tone {
    pub fn new(frequency: f64, amplitude: f32, sample_rate: u32, channels: u16) -> Self {
        Self {
            frequency,
            amplitude,
            sample_rate,
            channels,
        }
    }

    /// The block of samples belonging to `frame` at `rate`.
    ///
    /// Phase is derived from the absolute sample index, so consecutive
    /// frames join without discontinuities regardless of request order.
    pub fn block(&self, frame: i64, rate: FrameRate) -> Result<AudioBuffer> {
        let first = rate.first_sample(frame, self.sample_rate);
        let len = rate.samples_per_frame(frame, self.sample_rate);
        let step = TAU * self.frequency / self.sample_rate as f64;
        let samples: Vec<f32> = (0..len as i64)
            .map(|i| ((first + i) as f64 * step).sin() as f32 * self.amplitude)
            .collect();
        AudioBuffer::from_f32(self.sample_rate, vec![samples; self.channels as usize])
    }
}

/// Produces frames that carry only audio.
pub struct ToneReader {
    name: String,
    tone: Tone,
    frame_rate: FrameRate,
    duration_frames: i64,
    open: bool,
}

impl ToneReader {
    pub fn new(
        name: impl Into<String>,
        tone: Tone,
        frame_rate: FrameRate,
        duration_frames: i64,
    ) -> Self {
        Self {
            name: name.into(),
            tone,
            frame_rate,
            duration_frames,
            open: false,
        }
    }
}

impl Reader for ToneReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<()> {
        if self.tone.sample_rate == 0 || self.tone.channels == 0 {
            return Err(LayerlineError::resource(
                &self.name,
                "tone needs a sample rate and at least one channel",
            ));
        }
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
            width: 0,
            height: 0,
            frame_rate: self.frame_rate,
            has_video: false,
            has_audio: true,
            sample_rate: self.tone.sample_rate,
            channels: self.tone.channels,
            duration_frames: self.duration_frames,
        }
    }

    fn frame(&mut self, number: i64) -> Result<SharedFrame> {
        ensure_open(self.open, &self.name)?;
        ensure_in_range(number, self.duration_frames, &self.name)?;
        let audio = self.tone.block(number, self.frame_rate)?;
        Ok(Frame::new(number).with_audio(audio).into_shared())
    }
}
