//! Planar audio sample blocks carried by frames.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{LayerlineError, Result};

/// Sample storage format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SampleFormat {
    /// Signed 16-bit integer samples. Mixing saturates at the type bounds.
    I16,
    /// 32-bit float samples, nominally in `-1.0..=1.0`.
    #[default]
    F32,
}

impl SampleFormat {
    pub fn bytes_per_sample(self) -> usize {
        match self {
            Self::I16 => 2,
            Self::F32 => 4,
        }
    }
}

/// Per-channel sample vectors. Stereo stays inline.
pub type Channels<T> = SmallVec<[Vec<T>; 2]>;

/// Planar sample data in one of the supported formats.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleData {
    I16(Channels<i16>),
    F32(Channels<f32>),
}

/// A block of audio for one time slice.
///
/// Every channel holds the same number of samples.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    data: SampleData,
}

impl AudioBuffer {
    /// Silence of `samples` samples per channel.
    pub fn silent(sample_rate: u32, channels: u16, samples: usize, format: SampleFormat) -> Self {
        let data = match format {
            SampleFormat::I16 => {
                SampleData::I16((0..channels).map(|_| vec![0i16; samples]).collect())
            }
            SampleFormat::F32 => {
                SampleData::F32((0..channels).map(|_| vec![0f32; samples]).collect())
            }
        };
        Self { sample_rate, data }
    }

    /// Build float audio from per-channel vectors of equal length.
    pub fn from_f32(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self> {
        check_layout(sample_rate, channels.iter().map(Vec::len))?;
        Ok(Self {
            sample_rate,
            data: SampleData::F32(channels.into_iter().collect()),
        })
    }

    /// Build 16-bit audio from per-channel vectors of equal length.
    pub fn from_i16(sample_rate: u32, channels: Vec<Vec<i16>>) -> Result<Self> {
        check_layout(sample_rate, channels.iter().map(Vec::len))?;
        Ok(Self {
            sample_rate,
            data: SampleData::I16(channels.into_iter().collect()),
        })
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn format(&self) -> SampleFormat {
        match self.data {
            SampleData::I16(_) => SampleFormat::I16,
            SampleData::F32(_) => SampleFormat::F32,
        }
    }

    pub fn channel_count(&self) -> u16 {
        match &self.data {
            SampleData::I16(ch) => ch.len() as u16,
            SampleData::F32(ch) => ch.len() as u16,
        }
    }

    pub fn samples_per_channel(&self) -> usize {
        match &self.data {
            SampleData::I16(ch) => ch.first().map_or(0, Vec::len),
            SampleData::F32(ch) => ch.first().map_or(0, Vec::len),
        }
    }

    pub fn data(&self) -> &SampleData {
        &self.data
    }

    /// Mutable samples; only reachable on a buffer the caller owns.
    pub fn data_mut(&mut self) -> &mut SampleData {
        &mut self.data
    }

    /// Sample `index` of `channel` as float.
    pub fn sample_f32(&self, channel: u16, index: usize) -> Result<f32> {
        let value = match &self.data {
            SampleData::I16(ch) => ch
                .get(channel as usize)
                .and_then(|c| c.get(index))
                .map(|&s| i16_to_f32(s)),
            SampleData::F32(ch) => ch.get(channel as usize).and_then(|c| c.get(index)).copied(),
        };
        value.ok_or_else(|| {
            LayerlineError::out_of_range(format!(
                "sample {} of channel {} outside {}x{} block",
                index,
                channel,
                self.channel_count(),
                self.samples_per_channel()
            ))
        })
    }

    /// Copy of one channel as float samples.
    pub fn channel_f32(&self, channel: u16) -> Result<Vec<f32>> {
        let samples = match &self.data {
            SampleData::I16(ch) => ch
                .get(channel as usize)
                .map(|c| c.iter().map(|&s| i16_to_f32(s)).collect()),
            SampleData::F32(ch) => ch.get(channel as usize).cloned(),
        };
        samples.ok_or_else(|| {
            LayerlineError::out_of_range(format!(
                "channel {} outside {}-channel block",
                channel,
                self.channel_count()
            ))
        })
    }

    /// Bytes held by the sample data.
    pub fn memory_size(&self) -> usize {
        self.channel_count() as usize
            * self.samples_per_channel()
            * self.format().bytes_per_sample()
    }
}

fn check_layout(sample_rate: u32, mut lengths: impl Iterator<Item = usize>) -> Result<()> {
    if sample_rate == 0 {
        return Err(LayerlineError::invalid_config("sample rate must be positive"));
    }
    if let Some(first) = lengths.next() {
        if lengths.any(|len| len != first) {
            return Err(LayerlineError::invalid_config(
                "all audio channels must hold the same number of samples",
            ));
        }
    }
    Ok(())
}

/// Convert a 16-bit sample to float in `-1.0..1.0`.
#[inline]
pub fn i16_to_f32(sample: i16) -> f32 {
    sample as f32 / 32768.0
}

/// Convert a float sample to 16-bit, saturating outside the representable range.
#[inline]
pub fn f32_to_i16(sample: f32) -> i16 {
    (sample * 32768.0).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}
