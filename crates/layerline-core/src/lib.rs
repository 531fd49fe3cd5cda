//! Layerline Core - Foundation types for timeline compositing
//!
//! This crate provides the fundamental types used throughout Layerline:
//! - Time representation (RationalTime, FrameRate, FrameRange)
//! - Colors
//! - Immutable frames with image and audio payloads
//! - The `Reader` capability interface

pub mod audio;
pub mod color;
pub mod error;
pub mod format;
pub mod frame;
pub mod reader;
pub mod time;

pub use audio::{AudioBuffer, SampleData, SampleFormat};
pub use color::Color;
pub use error::{LayerlineError, Result};
pub use format::OutputFormat;
pub use frame::{Frame, ImageBuffer, PixelFormat, SharedFrame};
pub use reader::{Reader, ReaderInfo};
pub use time::{FrameRange, FrameRate, RationalTime};

/// Default cache budgets.
pub mod memory_budget {
    /// Composited frame cache budget in bytes
    pub const FRAME_CACHE_SIZE: usize = 512 * 1024 * 1024; // 512 MB

    /// Upper bound on cached frames regardless of their size
    pub const MAX_CACHED_FRAMES: usize = 240;

    /// Frames rendered ahead of the playhead by `Timeline::prerender_ahead`
    pub const LOOKAHEAD_FRAMES: usize = 8;
}
