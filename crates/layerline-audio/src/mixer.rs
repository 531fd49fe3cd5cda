//! Audio mixer: sums conformed sources into one output block.
//!
//! Mixing is plain per-sample addition (not averaging). Float output is
//! left unclamped; 16-bit output saturates at the type bounds instead of
//! wrapping.

use layerline_core::audio::f32_to_i16;
use layerline_core::{AudioBuffer, Result, SampleData, SampleFormat};
use tracing::trace;

use crate::resample::conform_channels;

/// Accumulates audio sources for one output frame.
pub struct Mixer {
    output: AudioBuffer,
    sources: usize,
}

impl Mixer {
    /// Start a silent block of `samples` samples per channel.
    pub fn new(sample_rate: u32, channels: u16, samples: usize, format: SampleFormat) -> Self {
        Self {
            output: AudioBuffer::silent(sample_rate, channels, samples, format),
            sources: 0,
        }
    }

    /// Number of sources mixed so far.
    pub fn source_count(&self) -> usize {
        self.sources
    }

    /// Conform `source` to the output layout, scale it by `gain` and add it.
    pub fn add(&mut self, source: &AudioBuffer, gain: f32) -> Result<()> {
        let samples = self.output.samples_per_channel();
        let conformed = conform_channels(
            source,
            self.output.sample_rate(),
            self.output.channel_count(),
            samples,
        )?;

        match self.output.data_mut() {
            SampleData::F32(out) => {
                for (dst, src) in out.iter_mut().zip(conformed.iter()) {
                    for (d, s) in dst.iter_mut().zip(src.iter()) {
                        *d += s * gain;
                    }
                }
            }
            SampleData::I16(out) => {
                for (dst, src) in out.iter_mut().zip(conformed.iter()) {
                    for (d, s) in dst.iter_mut().zip(src.iter()) {
                        *d = d.saturating_add(f32_to_i16(s * gain));
                    }
                }
            }
        }
        self.sources += 1;
        trace!(sources = self.sources, samples, "mixed audio source");
        Ok(())
    }

    /// The mixed block.
    pub fn finish(self) -> AudioBuffer {
        self.output
    }
}
