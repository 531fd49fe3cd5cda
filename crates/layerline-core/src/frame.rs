//! Image buffers and the immutable [`Frame`] unit of output.
//!
//! A `Frame` is built once (by a reader or by the compositor) and then
//! shared as [`SharedFrame`]. Nothing hands out mutable access to a
//! published frame; blending works on privately owned [`ImageBuffer`]s.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::audio::AudioBuffer;
use crate::color::Color;
use crate::error::{LayerlineError, Result};

/// Packed pixel formats understood by the compositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 8-bit RGBA (32 bits per pixel)
    #[default]
    Rgba8,
    /// 16-bit RGBA, little-endian (64 bits per pixel)
    Rgba16,
    /// 8-bit grayscale, implicitly opaque
    Gray8,
}

impl PixelFormat {
    /// Bytes per pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8 => 4,
            Self::Rgba16 => 8,
            Self::Gray8 => 1,
        }
    }

    /// Decode the pixel stored in `bytes` (exactly `bytes_per_pixel` long).
    #[inline]
    pub fn read(self, bytes: &[u8]) -> Color {
        match self {
            Self::Rgba8 => Color::from_rgba8(bytes[0], bytes[1], bytes[2], bytes[3]),
            Self::Rgba16 => {
                let c = |i: usize| u16::from_le_bytes([bytes[i], bytes[i + 1]]);
                Color::from_rgba16(c(0), c(2), c(4), c(6))
            }
            Self::Gray8 => {
                let v = bytes[0] as f32 / 255.0;
                Color::rgb(v, v, v)
            }
        }
    }

    /// Encode `color` into `bytes` (exactly `bytes_per_pixel` long).
    #[inline]
    pub fn write(self, color: Color, bytes: &mut [u8]) {
        match self {
            Self::Rgba8 => bytes.copy_from_slice(&color.to_rgba8()),
            Self::Rgba16 => {
                for (i, c) in color.to_rgba16().iter().enumerate() {
                    bytes[i * 2..i * 2 + 2].copy_from_slice(&c.to_le_bytes());
                }
            }
            Self::Gray8 => {
                bytes[0] = (color.luminance().clamp(0.0, 1.0) * 255.0).round() as u8;
            }
        }
    }
}

/// A row-major pixel grid in CPU memory.
///
/// Rows are padded to a 64-byte stride; padding bytes are always zero so
/// two buffers holding the same pixels compare equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    format: PixelFormat,
    width: u32,
    height: u32,
    stride: usize,
    data: Vec<u8>,
}

impl ImageBuffer {
    /// Create a new zeroed (transparent black) buffer.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        // Align stride to 64 bytes for SIMD friendliness
        let min_stride = width as usize * format.bytes_per_pixel();
        let stride = (min_stride + 63) & !63;
        Self {
            format,
            width,
            height,
            stride,
            data: vec![0u8; stride * height as usize],
        }
    }

    /// Create a buffer with every pixel set to `color`.
    pub fn filled(width: u32, height: u32, format: PixelFormat, color: Color) -> Self {
        let mut buffer = Self::new(width, height, format);
        buffer.fill(color);
        buffer
    }

    /// Build a buffer from tightly packed row-major bytes.
    pub fn from_raw(width: u32, height: u32, format: PixelFormat, raw: &[u8]) -> Result<Self> {
        let row_bytes = width as usize * format.bytes_per_pixel();
        let expected = row_bytes * height as usize;
        if raw.len() != expected {
            return Err(LayerlineError::invalid_config(format!(
                "{}x{} {:?} image needs {} bytes, got {}",
                width,
                height,
                format,
                expected,
                raw.len()
            )));
        }
        let mut buffer = Self::new(width, height, format);
        if row_bytes > 0 {
            for (y, src) in raw.chunks_exact(row_bytes).enumerate() {
                buffer.row_mut(y as u32).copy_from_slice(src);
            }
        }
        Ok(buffer)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Bytes per row, including padding.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Total memory usage of the pixel data in bytes.
    pub fn memory_size(&self) -> usize {
        self.data.len()
    }

    /// Raw stride-padded pixel bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Raw stride-padded pixel bytes, mutable. Padding must stay zero.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Read-only scanline `y` (without padding).
    pub fn row(&self, y: u32) -> Result<&[u8]> {
        if y >= self.height {
            return Err(LayerlineError::out_of_range(format!(
                "row {} outside image of height {}",
                y, self.height
            )));
        }
        Ok(self.row_unchecked(y))
    }

    #[inline]
    fn row_unchecked(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.width as usize * self.format.bytes_per_pixel()]
    }

    /// Mutable scanline `y`; panics if `y >= height`.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.stride;
        let end = start + self.width as usize * self.format.bytes_per_pixel();
        &mut self.data[start..end]
    }

    /// Pixel at (`row`, `col`).
    pub fn pixel(&self, row: u32, col: u32) -> Result<Color> {
        if col >= self.width {
            return Err(LayerlineError::out_of_range(format!(
                "column {} outside image of width {}",
                col, self.width
            )));
        }
        let bpp = self.format.bytes_per_pixel();
        let i = col as usize * bpp;
        Ok(self.format.read(&self.row(row)?[i..i + bpp]))
    }

    /// Overwrite the pixel at (`row`, `col`).
    pub fn set_pixel(&mut self, row: u32, col: u32, color: Color) -> Result<()> {
        if row >= self.height || col >= self.width {
            return Err(LayerlineError::out_of_range(format!(
                "pixel ({}, {}) outside {}x{} image",
                row, col, self.width, self.height
            )));
        }
        let bpp = self.format.bytes_per_pixel();
        let format = self.format;
        let i = col as usize * bpp;
        format.write(color, &mut self.row_mut(row)[i..i + bpp]);
        Ok(())
    }

    /// Set every pixel to `color`.
    pub fn fill(&mut self, color: Color) {
        let bpp = self.format.bytes_per_pixel();
        let mut encoded = [0u8; 8];
        self.format.write(color, &mut encoded[..bpp]);
        for y in 0..self.height {
            for px in self.row_mut(y).chunks_exact_mut(bpp) {
                px.copy_from_slice(&encoded[..bpp]);
            }
        }
    }

    /// Create a color-bars test pattern, shifted left by `offset` columns.
    pub fn test_pattern(width: u32, height: u32, offset: u32) -> Self {
        const BARS: [[u8; 4]; 8] = [
            [255, 255, 255, 255], // White
            [255, 255, 0, 255],   // Yellow
            [0, 255, 255, 255],   // Cyan
            [0, 255, 0, 255],     // Green
            [255, 0, 255, 255],   // Magenta
            [255, 0, 0, 255],     // Red
            [0, 0, 255, 255],     // Blue
            [0, 0, 0, 255],       // Black
        ];
        let mut image = Self::new(width, height, PixelFormat::Rgba8);
        if width == 0 {
            return image;
        }
        for y in 0..height {
            let row = image.row_mut(y);
            for x in 0..width {
                let i = (x * 4) as usize;
                let bar = ((x + offset) % width) as u64 * 8 / width as u64;
                row[i..i + 4].copy_from_slice(&BARS[bar as usize]);
            }
        }
        image
    }
}

/// One time slice of output: an optional image and an optional audio block.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    number: i64,
    image: Option<ImageBuffer>,
    audio: Option<AudioBuffer>,
}

/// Arc-wrapped frame for shared ownership.
pub type SharedFrame = Arc<Frame>;

impl Frame {
    /// Create an empty frame (no image, no audio).
    pub fn new(number: i64) -> Self {
        Self {
            number,
            image: None,
            audio: None,
        }
    }

    /// Attach an image while the frame is still being built.
    pub fn with_image(mut self, image: ImageBuffer) -> Self {
        self.image = Some(image);
        self
    }

    /// Attach audio while the frame is still being built.
    pub fn with_audio(mut self, audio: AudioBuffer) -> Self {
        self.audio = Some(audio);
        self
    }

    /// Frame number within the producing context.
    #[inline]
    pub fn number(&self) -> i64 {
        self.number
    }

    #[inline]
    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    #[inline]
    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }

    pub fn image(&self) -> Option<&ImageBuffer> {
        self.image.as_ref()
    }

    pub fn audio(&self) -> Option<&AudioBuffer> {
        self.audio.as_ref()
    }

    /// Pixel at (`row`, `col`); fails with `OutOfRange` if there is no image.
    pub fn pixel(&self, row: u32, col: u32) -> Result<Color> {
        self.require_image()?.pixel(row, col)
    }

    /// Scanline `y` of the image.
    pub fn row(&self, y: u32) -> Result<&[u8]> {
        self.require_image()?.row(y)
    }

    fn require_image(&self) -> Result<&ImageBuffer> {
        self.image.as_ref().ok_or_else(|| {
            LayerlineError::out_of_range(format!("frame {} carries no image", self.number))
        })
    }

    /// Bytes held by image and audio data.
    pub fn memory_size(&self) -> usize {
        self.image.as_ref().map_or(0, ImageBuffer::memory_size)
            + self.audio.as_ref().map_or(0, AudioBuffer::memory_size)
    }

    /// Publish the frame for shared, read-only use.
    pub fn into_shared(self) -> SharedFrame {
        Arc::new(self)
    }
}
