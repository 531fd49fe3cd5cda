//! Integration test crate for Layerline.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on multiple layerline crates to verify they work together.


#[cfg(test)]
mod timeline;



#[cfg(test)]
mod audio;

#[cfg(test)]
mod raster;
