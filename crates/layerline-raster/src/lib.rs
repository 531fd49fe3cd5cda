//! Layerline Raster - CPU image primitives
//!
//! The compositor depends on three format-agnostic operations:
//! - `convert`: pixel-format conversion
//! - `conform` / `rescale`: fitting a source image to the output canvas
//! - `blend_over`: the alpha "over" operator

pub mod blend;
pub mod convert;
pub mod scale;

pub use blend::{blend_over, over};
pub use convert::convert;
pub use scale::{conform, rescale, Placement, ScaleMode};
