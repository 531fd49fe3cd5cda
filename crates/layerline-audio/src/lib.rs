//! Layerline Audio - Audio conforming and mixing
//!
//! Architecture:
//! - `resample`: brings a source block to the output rate and channel layout
//! - `Mixer`: sums conformed sources into one output block, saturating for
//!   integer sample formats

pub mod mixer;
pub mod resample;

pub use mixer::Mixer;
pub use resample::conform_channels;
