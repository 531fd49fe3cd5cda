//! Alpha "over" compositing.
//!
//! Colors are straight (non-premultiplied). For a source `s` with alpha
//! `sa` (after opacity) drawn over a destination `d`:
//!
//! ```text
//! out.rgb = s.rgb * sa + d.rgb * (1 - sa)
//! out.a   = sa + d.a * (1 - sa)
//! ```

use layerline_core::{Color, ImageBuffer, LayerlineError, Result};
use rayon::prelude::*;

/// Blend one source color over a destination color.
#[inline]
pub fn over(src: Color, dst: Color, opacity: f32) -> Color {
    let sa = (src.a * opacity).clamp(0.0, 1.0);
    let inv = 1.0 - sa;
    Color {
        r: src.r * sa + dst.r * inv,
        g: src.g * sa + dst.g * inv,
        b: src.b * sa + dst.b * inv,
        a: sa + dst.a * inv,
    }
}

/// Composite `src` over `dst` in place, with `opacity` multiplied into the
/// source alpha.
///
/// `dst` is a buffer the caller owns outright (the compositor's
/// accumulator); `src` is only read. Both must have the same dimensions,
/// pixel formats may differ.
pub fn blend_over(dst: &mut ImageBuffer, src: &ImageBuffer, opacity: f32) -> Result<()> {
    if dst.width() != src.width() || dst.height() != src.height() {
        return Err(LayerlineError::invalid_config(format!(
            "cannot blend {}x{} image over {}x{} image",
            src.width(),
            src.height(),
            dst.width(),
            dst.height()
        )));
    }
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity == 0.0 || dst.height() == 0 || dst.width() == 0 {
        return Ok(());
    }

    let width = dst.width() as usize;
    let (dst_format, src_format) = (dst.format(), src.format());
    let (dst_bpp, src_bpp) = (dst_format.bytes_per_pixel(), src_format.bytes_per_pixel());
    let (dst_stride, src_stride) = (dst.stride(), src.stride());
    let src_data = src.data();

    dst.data_mut()
        .par_chunks_mut(dst_stride)
        .enumerate()
        .for_each(|(y, dst_row)| {
            let src_row = &src_data[y * src_stride..y * src_stride + width * src_bpp];
            for x in 0..width {
                let s = src_format.read(&src_row[x * src_bpp..(x + 1) * src_bpp]);
                let sa = s.a * opacity;
                if sa <= 0.0 {
                    // Fully transparent source leaves the destination bytes untouched
                    continue;
                }
                let px = &mut dst_row[x * dst_bpp..(x + 1) * dst_bpp];
                let out = if sa >= 1.0 {
                    Color { a: 1.0, ..s }
                } else {
                    over(s, dst_format.read(px), opacity)
                };
                dst_format.write(out, px);
            }
        });
    Ok(())
}
