//! Still image reader backed by the `image` crate.

use image::DynamicImage;
use layerline_core::{
    Frame, FrameRate, ImageBuffer, LayerlineError, PixelFormat, Reader, ReaderInfo, Result,
    SharedFrame,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::{ensure_in_range, ensure_open};

enum Source {
    File(PathBuf),
    Memory(ImageBuffer),
}

/// Shows one image for its whole duration.
///
/// The image is decoded on `open` and every frame request returns the same
/// shared frame.
pub struct ImageReader {
    name: String,
    source: Source,
    frame_rate: FrameRate,
    duration_frames: i64,
    frame: Option<SharedFrame>,
}

impl ImageReader {
    /// Read the image at `path` (PNG or JPEG).
    pub fn open_path<P: AsRef<Path>>(path: P, frame_rate: FrameRate, duration_frames: i64) -> Self {
        let path = path.as_ref();
        Self {
            name: path.to_string_lossy().into_owned(),
            source: Source::File(path.to_path_buf()),
            frame_rate,
            duration_frames,
            frame: None,
        }
    }

    /// Serve an already decoded image.
    pub fn from_image(
        name: impl Into<String>,
        image: ImageBuffer,
        frame_rate: FrameRate,
        duration_frames: i64,
    ) -> Self {
        Self {
            name: name.into(),
            source: Source::Memory(image),
            frame_rate,
            duration_frames,
            frame: None,
        }
    }

    fn load(&self) -> Result<ImageBuffer> {
        match &self.source {
            Source::Memory(image) => Ok(image.clone()),
            Source::File(path) => {
                debug!("Loading image: {}", path.display());
                let img = image::open(path)
                    .map_err(|e| LayerlineError::resource(&self.name, e.to_string()))?;
                decode(img, &self.name)
            }
        }
    }

    /// Dimensions of the loaded image, `(0, 0)` before `open`.
    fn dimensions(&self) -> (u32, u32) {
        match (&self.frame, &self.source) {
            (Some(frame), _) => frame
                .image()
                .map_or((0, 0), |image| (image.width(), image.height())),
            (None, Source::Memory(image)) => (image.width(), image.height()),
            (None, Source::File(_)) => (0, 0),
        }
    }
}

/// Keep 16-bit sources at 16 bits; everything else becomes 8-bit RGBA.
fn decode(img: DynamicImage, name: &str) -> Result<ImageBuffer> {
    let (width, height) = (img.width(), img.height());
    let deep = matches!(
        img,
        DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA16(_)
            | DynamicImage::ImageRgb16(_)
            | DynamicImage::ImageRgba16(_)
    );
    let result = if deep {
        let raw: Vec<u8> = img
            .to_rgba16()
            .into_raw()
            .into_iter()
            .flat_map(u16::to_le_bytes)
            .collect();
        ImageBuffer::from_raw(width, height, PixelFormat::Rgba16, &raw)
    } else {
        ImageBuffer::from_raw(width, height, PixelFormat::Rgba8, img.to_rgba8().as_raw())
    };
    result.map_err(|e| LayerlineError::resource(name, e.to_string()))
}

impl Reader for ImageReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<()> {
        if self.frame.is_some() {
            return Ok(());
        }
        let image = self.load()?;
        info!(
            "Loaded image '{}': {}x{} {:?}",
            self.name,
            image.width(),
            image.height(),
            image.format()
        );
        self.frame = Some(Frame::new(0).with_image(image).into_shared());
        Ok(())
    }

    fn close(&mut self) {
        self.frame = None;
    }

    fn is_open(&self) -> bool {
        self.frame.is_some()
    }

    fn info(&self) -> ReaderInfo {
        let (width, height) = self.dimensions();
        ReaderInfo {
            width,
            height,
            frame_rate: self.frame_rate,
            has_video: true,
            has_audio: false,
            sample_rate: 0,
            channels: 0,
            duration_frames: self.duration_frames,
        }
    }

    fn frame(&mut self, number: i64) -> Result<SharedFrame> {
        ensure_open(self.is_open(), &self.name)?;
        ensure_in_range(number, self.duration_frames, &self.name)?;
        self.frame
            .clone()
            .ok_or_else(|| LayerlineError::not_open(format!("reader '{}'", self.name)))
    }
}
