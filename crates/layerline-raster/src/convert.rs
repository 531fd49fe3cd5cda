//! Pixel-format conversion.

use layerline_core::{ImageBuffer, PixelFormat};
use rayon::prelude::*;

/// Copy `image` into a new buffer of `format`.
pub fn convert(image: &ImageBuffer, format: PixelFormat) -> ImageBuffer {
    let mut out = ImageBuffer::new(image.width(), image.height(), format);
    if image.width() == 0 || image.height() == 0 {
        return out;
    }
    let width = image.width() as usize;
    let (src_format, src_stride) = (image.format(), image.stride());
    let (src_bpp, dst_bpp) = (src_format.bytes_per_pixel(), format.bytes_per_pixel());
    let src_data = image.data();
    let dst_stride = out.stride();

    out.data_mut()
        .par_chunks_mut(dst_stride)
        .enumerate()
        .for_each(|(y, dst_row)| {
            let src_row = &src_data[y * src_stride..];
            for x in 0..width {
                let color = src_format.read(&src_row[x * src_bpp..(x + 1) * src_bpp]);
                format.write(color, &mut dst_row[x * dst_bpp..(x + 1) * dst_bpp]);
            }
        });
    out
}
