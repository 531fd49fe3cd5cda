//! Rescaling source images onto the output canvas.

use layerline_core::{Color, ImageBuffer, PixelFormat};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::convert::convert;

/// How a source image is fitted to the output canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ScaleMode {
    /// Preserve aspect ratio, fit inside the canvas, centered. The uncovered
    /// area stays transparent.
    #[default]
    Fit,
    /// Scale both axes to the canvas size.
    Stretch,
    /// Native size, centered; anything outside the canvas is cropped.
    None,
}

/// Placement of the scaled image on the canvas, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl ScaleMode {
    /// Where an image of `src` size lands on a canvas of `dst` size.
    pub fn placement(self, src: (u32, u32), dst: (u32, u32)) -> Placement {
        let (sw, sh) = src;
        let (dw, dh) = dst;
        let (width, height) = match self {
            ScaleMode::Stretch => (dw, dh),
            ScaleMode::None => (sw, sh),
            ScaleMode::Fit => {
                if sw == 0 || sh == 0 {
                    (0, 0)
                } else {
                    let scale = (dw as f64 / sw as f64).min(dh as f64 / sh as f64);
                    (
                        ((sw as f64 * scale).round() as u32).min(dw),
                        ((sh as f64 * scale).round() as u32).min(dh),
                    )
                }
            }
        };
        Placement {
            x: (dw as i64 - width as i64) / 2,
            y: (dh as i64 - height as i64) / 2,
            width,
            height,
        }
    }
}

/// Bring `image` to `width`x`height` in `format`.
///
/// Borrows the input when it already conforms; otherwise allocates a new
/// buffer. The input is never modified.
pub fn conform<'a>(
    image: &'a ImageBuffer,
    width: u32,
    height: u32,
    format: PixelFormat,
    mode: ScaleMode,
) -> Cow<'a, ImageBuffer> {
    if image.width() == width && image.height() == height {
        if image.format() == format {
            return Cow::Borrowed(image);
        }
        return Cow::Owned(convert(image, format));
    }
    Cow::Owned(rescale(image, width, height, format, mode))
}

/// Resample `image` onto a transparent canvas with bilinear filtering.
pub fn rescale(
    image: &ImageBuffer,
    width: u32,
    height: u32,
    format: PixelFormat,
    mode: ScaleMode,
) -> ImageBuffer {
    let mut out = ImageBuffer::new(width, height, format);
    let place = mode.placement((image.width(), image.height()), (width, height));
    if place.width == 0 || place.height == 0 || width == 0 || height == 0 {
        return out;
    }

    let sx = image.width() as f32 / place.width as f32;
    let sy = image.height() as f32 / place.height as f32;
    let bpp = format.bytes_per_pixel();
    let stride = out.stride();

    out.data_mut()
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            let ly = y as i64 - place.y;
            if ly < 0 || ly >= place.height as i64 {
                return;
            }
            let fy = (ly as f32 + 0.5) * sy - 0.5;
            for x in 0..width as usize {
                let lx = x as i64 - place.x;
                if lx < 0 || lx >= place.width as i64 {
                    continue;
                }
                let fx = (lx as f32 + 0.5) * sx - 0.5;
                let color = sample_bilinear(image, fx, fy);
                format.write(color, &mut row[x * bpp..(x + 1) * bpp]);
            }
        });
    out
}

/// Bilinear sample at fractional pixel coordinates, interpolating in
/// premultiplied space so transparent texels do not bleed their color.
fn sample_bilinear(image: &ImageBuffer, fx: f32, fy: f32) -> Color {
    let max_x = image.width() as i64 - 1;
    let max_y = image.height() as i64 - 1;
    let x0 = fx.floor();
    let y0 = fy.floor();
    let tx = fx - x0;
    let ty = fy - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let texel = |x: i64, y: i64| premultiply(texel_at(image, x.clamp(0, max_x), y.clamp(0, max_y)));
    let top = texel(x0, y0).lerp(texel(x0 + 1, y0), tx);
    let bottom = texel(x0, y0 + 1).lerp(texel(x0 + 1, y0 + 1), tx);
    unpremultiply(top.lerp(bottom, ty))
}

#[inline]
fn texel_at(image: &ImageBuffer, x: i64, y: i64) -> Color {
    let format = image.format();
    let bpp = format.bytes_per_pixel();
    let start = y as usize * image.stride() + x as usize * bpp;
    format.read(&image.data()[start..start + bpp])
}

#[inline]
fn premultiply(c: Color) -> Color {
    Color::new(c.r * c.a, c.g * c.a, c.b * c.a, c.a)
}

#[inline]
fn unpremultiply(c: Color) -> Color {
    if c.a <= 0.0 {
        return Color::TRANSPARENT;
    }
    Color::new(c.r / c.a, c.g / c.a, c.b / c.a, c.a)
}
