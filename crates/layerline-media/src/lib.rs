//! Layerline Media - Concrete readers
//!
//! Every reader implements `layerline_core::Reader`:
//! - `ColorReader`: a solid color
//! - `PatternReader`: scrolling color bars with an optional tone (stands in
//!   for a decoded video file)
//! - `ImageReader`: a still image decoded with the `image` crate
//! - `ToneReader`: audio-only sine tone

pub mod color;
pub mod pattern;
pub mod still;
pub mod tone;

pub use color::ColorReader;
pub use pattern::PatternReader;
pub use still::ImageReader;
pub use tone::{Tone, ToneReader};

use layerline_core::{LayerlineError, Result};

/// Fail with `NotOpen` unless the reader is open.
pub(crate) fn ensure_open(open: bool, name: &str) -> Result<()> {
    if open {
        Ok(())
    } else {
        Err(LayerlineError::not_open(format!("reader '{}'", name)))
    }
}

/// Fail with `OutOfRange` unless `0 <= frame < duration`.
pub(crate) fn ensure_in_range(frame: i64, duration: i64, name: &str) -> Result<()> {
    if frame < 0 || frame >= duration {
        return Err(LayerlineError::out_of_range(format!(
            "frame {} outside '{}' (0-{})",
            frame,
            name,
            duration - 1
        )));
    }
    Ok(())
}
