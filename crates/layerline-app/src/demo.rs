//! The demo timeline.

use anyhow::Result;
use layerline_core::{Color, FrameRate, OutputFormat};
use layerline_media::{ColorReader, PatternReader, Tone, ToneReader};
use layerline_timeline::{Clip, ScaleMode, Timeline};
use tracing::info;

pub const DEFAULT_FRAMES: i64 = 300;

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;

/// Color bars for the whole run, a translucent card for the middle third
/// and a quiet tone under everything.
pub fn build(frames: i64) -> Result<Timeline> {
    let rate = FrameRate::FPS_30;
    let mut timeline = Timeline::new(OutputFormat::new(WIDTH, HEIGHT, rate, 48000, 2))?;

    // Source at 24 fps exercises rate mapping
    let bars = PatternReader::new("bars", 1920, 1080, FrameRate::FPS_24, frames)
        .with_speed(4)
        .with_tone(Tone::new(440.0, 0.2, 44100, 1));
    timeline.add_clip(Clip::builder(bars).layer(0).build()?)?;

    let third = frames / 3;
    let card = ColorReader::new("card", Color::MAGENTA, 640, 360, rate, third);
    timeline.add_clip(
        Clip::builder(card)
            .position(third)
            .layer(1)
            .opacity(0.6)
            .scale(ScaleMode::None)
            .build()?,
    )?;

    let hum = ToneReader::new("hum", Tone::new(110.0, 0.1, 48000, 2), rate, frames);
    timeline.add_clip(Clip::builder(hum).layer(-1).volume(0.5).build()?)?;

    info!(
        "Demo timeline: {} clips, {} frames at {}",
        timeline.clips().len(),
        timeline.duration_frames(),
        rate
    );
    Ok(timeline)
}
