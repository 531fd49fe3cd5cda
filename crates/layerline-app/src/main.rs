//! Layerline - demo renderer
//!
//! Builds a small two-layer timeline with a tone track, renders it on a
//! worker pool and then plays it back frame by frame with lookahead.
//!
//! Usage: `layerline [frames] [threads]`

mod demo;

use anyhow::{Context, Result};
use layerline_core::FrameRange;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let frames: i64 = match args.next() {
        Some(arg) => arg
            .parse()
            .with_context(|| format!("invalid frame count '{}'", arg))?,
        None => demo::DEFAULT_FRAMES,
    };
    let threads: usize = match args.next() {
        Some(arg) => arg
            .parse()
            .with_context(|| format!("invalid thread count '{}'", arg))?,
        None => (num_cpus::get() * 3 / 4).max(1),
    };

    info!("Layerline starting: {} frames on {} threads", frames, threads);

    let mut timeline = demo::build(frames)?;
    timeline.open()?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("layerline-render-{}", i))
        .build()
        .context("failed to build render pool")?;

    let start = Instant::now();
    let produced = pool.install(|| timeline.prerender(FrameRange::new(0, frames)))?;
    let elapsed = start.elapsed().as_secs_f64();
    info!(
        "Prerendered {} frames in {:.2}s ({:.1} fps)",
        produced,
        elapsed,
        if elapsed > 0.0 { produced as f64 / elapsed } else { 0.0 }
    );

    // Playback: the cache now holds what fit; the rest is rendered on demand
    let start = Instant::now();
    let mut audio_samples = 0usize;
    for n in 0..frames {
        let frame = timeline.get_frame(n)?;
        audio_samples += frame.audio().map_or(0, |a| a.samples_per_channel());
        pool.install(|| timeline.prerender_ahead(n))?;
    }
    info!(
        "Played {} frames ({} audio samples per channel) in {:.2}s",
        frames,
        audio_samples,
        start.elapsed().as_secs_f64()
    );

    let stats = timeline.cache_stats();
    info!(
        "Cache: {} frames, {:.1} MB, {} hits, {} misses, {} evictions ({:.0}% hit rate)",
        stats.frames,
        stats.bytes as f64 / (1024.0 * 1024.0),
        stats.hits,
        stats.misses,
        stats.evictions,
        stats.hit_rate() * 100.0
    );

    timeline.close();
    Ok(())
}
