//! Clip: one reader placed on the timeline.

use layerline_core::{
    AudioBuffer, Frame, FrameRange, FrameRate, LayerlineError, RationalTime, Reader, ReaderInfo,
    Result, SharedFrame,
};
use layerline_raster::ScaleMode;
use parking_lot::Mutex;
use std::borrow::Cow;
use std::fmt;
use tracing::{debug, warn};
use uuid::Uuid;

/// A reader bound to a temporal placement.
///
/// Global frame `g` shows local frame `(g - position) + trim_start` while
/// `position <= g < position + (trim_end - trim_start)`. Local frames are
/// counted at the timeline rate and mapped onto the reader's native rate
/// when the two differ.
pub struct Clip {
    id: Uuid,
    name: String,
    reader: Mutex<Box<dyn Reader>>,
    source: ReaderInfo,
    position: i64,
    trim_start: i64,
    trim_end: i64,
    /// Trim was taken from the reader's duration, not set explicitly.
    default_trim: bool,
    layer: i32,
    enabled: bool,
    opacity: f32,
    volume: f32,
    scale: ScaleMode,
    /// Rate of the owning timeline, once added to one.
    output_rate: Option<FrameRate>,
}

impl Clip {
    /// Start building a clip around `reader`.
    pub fn builder<R: Reader + 'static>(reader: R) -> ClipBuilder {
        ClipBuilder::new(Box::new(reader))
    }

    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn position(&self) -> i64 {
        self.position
    }

    #[inline]
    pub fn trim_start(&self) -> i64 {
        self.trim_start
    }

    #[inline]
    pub fn trim_end(&self) -> i64 {
        self.trim_end
    }

    /// Number of frames the clip occupies on the timeline.
    #[inline]
    pub fn duration(&self) -> i64 {
        self.trim_end - self.trim_start
    }

    #[inline]
    pub fn layer(&self) -> i32 {
        self.layer
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    #[inline]
    pub fn volume(&self) -> f32 {
        self.volume
    }

    #[inline]
    pub fn scale(&self) -> ScaleMode {
        self.scale
    }

    /// Native properties of the reader, captured when the clip was built.
    pub fn source_info(&self) -> &ReaderInfo {
        &self.source
    }

    /// Global frames covered by the clip, ignoring the enabled flag.
    pub fn active_range(&self) -> FrameRange {
        FrameRange::with_len(self.position, self.duration().max(0))
    }

    /// True iff the clip is enabled and covers `global`.
    pub fn is_active_at(&self, global: i64) -> bool {
        self.enabled && self.active_range().contains(global)
    }

    /// Local frame shown at `global`. Only meaningful while active.
    #[inline]
    pub fn local_frame(&self, global: i64) -> i64 {
        (global - self.position) + self.trim_start
    }

    /// Frame number to request from the reader for local frame `local`.
    pub fn source_frame(&self, local: i64) -> i64 {
        match self.output_rate {
            Some(rate) => rate.convert_frame(local, self.source.frame_rate),
            None => local,
        }
    }

    /// Decode the frame shown at `global`.
    ///
    /// Fails with `OutOfRange` if the clip is not active there and with
    /// `NotOpen` before `open`. Any other reader failure is reported as
    /// `Resource`.
    pub fn frame(&self, global: i64) -> Result<SharedFrame> {
        if !self.is_active_at(global) {
            return Err(LayerlineError::out_of_range(format!(
                "clip '{}' is not active at frame {}",
                self.name, global
            )));
        }
        let source = self.source_frame(self.local_frame(global));
        self.read(&mut **self.reader.lock(), source)
    }

    /// Audio heard during `global`, where `shown` is what [`frame`](Self::frame)
    /// returned for it.
    ///
    /// At the timeline rate the block of `shown` is used as is. At any other
    /// rate the samples of the output frame's time span are gathered from
    /// the reader frames that overlap it, so consecutive output frames join
    /// without repeated or dropped samples.
    pub fn audio<'a>(
        &self,
        global: i64,
        shown: &'a Frame,
    ) -> Result<Option<Cow<'a, AudioBuffer>>> {
        let Some(block) = shown.audio() else {
            return Ok(None);
        };
        let rate = match self.output_rate {
            Some(rate) if rate != self.source.frame_rate => rate,
            _ => return Ok(Some(Cow::Borrowed(block))),
        };

        let sample_rate = block.sample_rate();
        let local = self.local_frame(global);
        let start = rate.first_sample(local, sample_rate);
        let end = rate.first_sample(local + 1, sample_rate);
        let shown_index = self.source_frame(local);
        let native = self.source.frame_rate;

        let len = (end - start) as usize;
        let mut channels = vec![vec![0.0f32; len]; block.channel_count() as usize];
        let mut reader = self.reader.lock();
        let mut index = native.frame_at_sample(start, sample_rate);
        while native.first_sample(index, sample_rate) < end {
            if index < 0 || index >= self.source.duration_frames {
                break;
            }
            let fetched;
            let part = if index == shown_index {
                block
            } else {
                fetched = self.read(&mut **reader, index)?;
                match fetched.audio() {
                    Some(audio) => audio,
                    None => break,
                }
            };
            let part_start = native.first_sample(index, sample_rate);
            let lo = start.max(part_start);
            let hi = end.min(part_start + part.samples_per_channel() as i64);
            if lo < hi {
                for (ch, out) in channels.iter_mut().enumerate() {
                    if ch >= part.channel_count() as usize {
                        break;
                    }
                    let samples = part.channel_f32(ch as u16)?;
                    out[(lo - start) as usize..(hi - start) as usize].copy_from_slice(
                        &samples[(lo - part_start) as usize..(hi - part_start) as usize],
                    );
                }
            }
            index += 1;
        }
        AudioBuffer::from_f32(sample_rate, channels).map(|audio| Some(Cow::Owned(audio)))
    }

    fn read(&self, reader: &mut dyn Reader, source: i64) -> Result<SharedFrame> {
        if !reader.is_open() {
            return Err(LayerlineError::not_open(format!("clip '{}'", self.name)));
        }
        reader.frame(source).map_err(|e| match e {
            LayerlineError::NotOpen(_) | LayerlineError::Resource { .. } => e,
            other => {
                warn!(clip = %self.name, frame = source, error = %other, "reader failed");
                LayerlineError::resource(&self.name, other.to_string())
            }
        })
    }

    pub fn open(&self) -> Result<()> {
        let mut reader = self.reader.lock();
        if reader.is_open() {
            return Ok(());
        }
        reader.open().map_err(|e| match e {
            LayerlineError::Resource { .. } => e,
            other => LayerlineError::resource(&self.name, other.to_string()),
        })?;
        debug!(clip = %self.name, "opened reader");
        Ok(())
    }

    pub fn close(&self) {
        let mut reader = self.reader.lock();
        if reader.is_open() {
            reader.close();
            debug!(clip = %self.name, "closed reader");
        }
    }

    pub fn is_open(&self) -> bool {
        self.reader.lock().is_open()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_position(&mut self, position: i64) {
        self.position = position;
    }

    /// Set the local trim window; fails unless `0 <= start <= end`.
    pub fn set_trim(&mut self, start: i64, end: i64) -> Result<()> {
        check_trim(start, end)?;
        self.trim_start = start;
        self.trim_end = end;
        self.default_trim = false;
        Ok(())
    }

    pub fn set_layer(&mut self, layer: i32) {
        self.layer = layer;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Clamped to `0.0..=1.0`.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    /// Negative gains are treated as silence.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.max(0.0);
    }

    pub fn set_scale(&mut self, scale: ScaleMode) {
        self.scale = scale;
    }

    /// Count local frames at `rate` from now on.
    ///
    /// A trim that was defaulted from the reader's duration is re-measured
    /// at the new rate.
    pub(crate) fn bind_output_rate(&mut self, rate: FrameRate) {
        self.output_rate = Some(rate);
        if self.default_trim {
            self.trim_end = self
                .source
                .frame_rate
                .convert_frame(self.source.duration_frames, rate);
        }
    }
}

impl fmt::Debug for Clip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clip")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("position", &self.position)
            .field("trim", &(self.trim_start..self.trim_end))
            .field("layer", &self.layer)
            .field("enabled", &self.enabled)
            .field("opacity", &self.opacity)
            .field("volume", &self.volume)
            .field("scale", &self.scale)
            .finish_non_exhaustive()
    }
}

fn check_trim(start: i64, end: i64) -> Result<()> {
    if start < 0 {
        return Err(LayerlineError::invalid_config(format!(
            "trim start {} is negative",
            start
        )));
    }
    if end < start {
        return Err(LayerlineError::invalid_config(format!(
            "trim end {} precedes trim start {}",
            end, start
        )));
    }
    Ok(())
}

/// Builder for [`Clip`].
pub struct ClipBuilder {
    reader: Box<dyn Reader>,
    name: Option<String>,
    position: i64,
    trim: Option<(i64, i64)>,
    layer: i32,
    enabled: bool,
    opacity: f32,
    volume: f32,
    scale: ScaleMode,
}

impl ClipBuilder {
    fn new(reader: Box<dyn Reader>) -> Self {
        Self {
            reader,
            name: None,
            position: 0,
            trim: None,
            layer: 0,
            enabled: true,
            opacity: 1.0,
            volume: 1.0,
            scale: ScaleMode::default(),
        }
    }

    /// Display name; defaults to the reader's name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn position(mut self, frame: i64) -> Self {
        self.position = frame;
        self
    }

    /// Position in seconds, rounded half down to a frame at `rate`.
    pub fn position_seconds(mut self, seconds: f64, rate: FrameRate) -> Self {
        self.position = RationalTime::from_seconds_f64(seconds).to_frames_rounded(rate);
        self
    }

    /// Local frames `start..end` of the source. Defaults to the whole reader.
    pub fn trim(mut self, start: i64, end: i64) -> Self {
        self.trim = Some((start, end));
        self
    }

    /// Trim window in seconds, each end rounded half down at `rate`.
    pub fn trim_seconds(mut self, start: f64, end: f64, rate: FrameRate) -> Self {
        let start = RationalTime::from_seconds_f64(start).to_frames_rounded(rate);
        let end = RationalTime::from_seconds_f64(end).to_frames_rounded(rate);
        self.trim = Some((start, end));
        self
    }

    pub fn layer(mut self, layer: i32) -> Self {
        self.layer = layer;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn scale(mut self, scale: ScaleMode) -> Self {
        self.scale = scale;
        self
    }

    pub fn build(self) -> Result<Clip> {
        let source = self.reader.info();
        let (trim_start, trim_end) = self.trim.unwrap_or((0, source.duration_frames.max(0)));
        check_trim(trim_start, trim_end)?;
        let name = self
            .name
            .unwrap_or_else(|| self.reader.name().to_string());

        Ok(Clip {
            id: Uuid::new_v4(),
            name,
            reader: Mutex::new(self.reader),
            source,
            position: self.position,
            trim_start,
            trim_end,
            default_trim: self.trim.is_none(),
            layer: self.layer,
            enabled: self.enabled,
            opacity: self.opacity.clamp(0.0, 1.0),
            volume: self.volume.max(0.0),
            scale: self.scale,
            output_rate: None,
        })
    }
}
