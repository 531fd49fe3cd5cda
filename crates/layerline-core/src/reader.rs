//! The capability interface every media source implements.
//!
//! Clips are written against [`Reader`] only. Concrete readers (still
//! images, generated video, tones, real decoders) live outside the core.

use crate::error::Result;
use crate::frame::SharedFrame;
use crate::time::FrameRate;

/// Native properties of a reader's media.
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderInfo {
    pub width: u32,
    pub height: u32,
    pub frame_rate: FrameRate,
    pub has_video: bool,
    pub has_audio: bool,
    pub sample_rate: u32,
    pub channels: u16,
    /// Number of frames the reader can produce at `frame_rate`.
    pub duration_frames: i64,
}

/// A source of decoded frames addressed by local frame number.
///
/// Readers are stateful (decode position, open handles) and are owned by
/// exactly one clip. `frame` must only be called between `open` and
/// `close`; readers report misuse with `LayerlineError::NotOpen`.
pub trait Reader: Send {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    fn open(&mut self) -> Result<()>;

    fn close(&mut self);

    fn is_open(&self) -> bool;

    fn info(&self) -> ReaderInfo;

    fn duration_frames(&self) -> i64 {
        self.info().duration_frames
    }

    /// Decode local frame `number` (0-based, at the reader's frame rate).
    fn frame(&mut self, number: i64) -> Result<SharedFrame>;
}

impl<R: Reader + ?Sized> Reader for Box<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn info(&self) -> ReaderInfo {
        (**self).info()
    }

    fn duration_frames(&self) -> i64 {
        (**self).duration_frames()
    }

    fn frame(&mut self, number: i64) -> Result<SharedFrame> {
        (**self).frame(number)
    }
}
