//! Builds one output frame from the clips active at it.

use layerline_audio::Mixer;
use layerline_core::{Color, Frame, ImageBuffer, OutputFormat, Result};
use layerline_raster::{blend_over, conform};
use tracing::{debug, trace};

use crate::cancel::CancelToken;
use crate::clip::Clip;

/// Composite `layers` (bottom first) over `background` at `format`.
///
/// The accumulator is private to this call; source frames are only read.
/// Cancellation is checked between layers and any reader failure aborts
/// the whole frame.
pub(crate) fn compose(
    number: i64,
    format: &OutputFormat,
    background: Color,
    layers: &[&Clip],
    cancel: &CancelToken,
) -> Result<Frame> {
    let mut canvas =
        ImageBuffer::filled(format.width, format.height, format.pixel_format, background);
    let mut mixer = Mixer::new(
        format.sample_rate,
        format.channels,
        format.samples_per_frame(number),
        format.sample_format,
    );

    if layers.is_empty() {
        trace!(frame = number, "no active clips, background frame");
    }

    for clip in layers {
        cancel.check(number)?;
        let source = clip.frame(number)?;

        if let Some(image) = source.image() {
            let conformed = conform(
                image,
                format.width,
                format.height,
                format.pixel_format,
                clip.scale(),
            );
            blend_over(&mut canvas, &conformed, clip.opacity())?;
        }
        if clip.volume() > 0.0 {
            if let Some(audio) = clip.audio(number, &source)? {
                mixer.add(&audio, clip.volume())?;
            }
        }
    }

    debug!(frame = number, layers = layers.len(), "composited frame");
    Ok(Frame::new(number).with_image(canvas).with_audio(mixer.finish()))
}
