//! Sample-rate and channel-layout conforming.

use layerline_core::audio::Channels;
use layerline_core::{AudioBuffer, Result};

/// Convert `source` into exactly `samples` float samples per channel at
/// `sample_rate` with `channels` channels.
///
/// Channel mapping: a mono source feeds every output channel; otherwise
/// channel `n` feeds channel `n` and surplus source channels are dropped.
/// Output channels with no source, and samples past the end of the
/// source, are silent. Rate conversion is linear interpolation.
pub fn conform_channels(
    source: &AudioBuffer,
    sample_rate: u32,
    channels: u16,
    samples: usize,
) -> Result<Channels<f32>> {
    let src_channels = source.channel_count();
    let mut out = Channels::with_capacity(channels as usize);
    for ch in 0..channels {
        let mapped = match src_channels {
            0 => None,
            1 => Some(0),
            n if ch < n => Some(ch),
            _ => None,
        };
        let conformed = match mapped {
            Some(src_ch) => {
                let input = source.channel_f32(src_ch)?;
                resample_linear(&input, source.sample_rate(), sample_rate, samples)
            }
            None => vec![0.0; samples],
        };
        out.push(conformed);
    }
    Ok(out)
}

/// Linearly resample `input` from `from_rate` to `to_rate`, producing
/// `len` samples.
pub fn resample_linear(input: &[f32], from_rate: u32, to_rate: u32, len: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; len];
    if input.is_empty() || from_rate == 0 || to_rate == 0 {
        return out;
    }
    if from_rate == to_rate {
        let n = len.min(input.len());
        out[..n].copy_from_slice(&input[..n]);
        return out;
    }

    let step = from_rate as f64 / to_rate as f64;
    let last = input.len() - 1;
    for (i, sample) in out.iter_mut().enumerate() {
        let pos = i as f64 * step;
        let i0 = pos.floor() as usize;
        if i0 > last {
            break;
        }
        let i1 = (i0 + 1).min(last);
        let frac = (pos - i0 as f64) as f32;
        let (v0, v1) = (input[i0], input[i1]);
        *sample = v0 + (v1 - v0) * frac;
    }
    out
}
