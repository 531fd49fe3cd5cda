//! Layerline Timeline - Multi-track compositing engine
//!
//! Implements the request path for composited frames:
//! - Clips binding a reader to a position, trim window and layer
//! - A locality-aware frame cache with range pruning
//! - Layered "over" compositing and audio mixing
//! - Concurrent, deduplicated and cancellable frame requests

pub mod cache;
pub mod cancel;
pub mod clip;
mod compositor;
mod inflight;
pub mod timeline;

pub use cache::{CacheBudget, CacheStats, FrameCache};
pub use cancel::CancelToken;
pub use clip::{Clip, ClipBuilder};
pub use layerline_raster::ScaleMode;
pub use timeline::Timeline;
