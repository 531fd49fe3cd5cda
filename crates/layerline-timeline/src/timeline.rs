//! The timeline: clips, output format, frame cache and the request path.

use layerline_core::{
    memory_budget, Color, FrameRange, LayerlineError, OutputFormat, Result, SharedFrame,
};
use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::{CacheBudget, CacheStats, FrameCache};
use crate::cancel::CancelToken;
use crate::clip::Clip;
use crate::compositor::compose;
use crate::inflight::{Claim, InFlight};

/// Composites clips into frames of one output format.
///
/// Structural changes take `&mut self`. Frame requests take `&self` and may
/// run concurrently; each frame number is computed at most once at a time
/// and concurrent requesters receive the leader's result.
pub struct Timeline {
    format: OutputFormat,
    background: Color,
    clips: Vec<Clip>,
    cache: Mutex<FrameCache>,
    inflight: InFlight,
    open: bool,
}

impl Timeline {
    /// Create a closed, empty timeline. Fails if `format` is invalid.
    pub fn new(format: OutputFormat) -> Result<Self> {
        format.validate()?;
        Ok(Self {
            format,
            background: Color::BLACK,
            clips: Vec::new(),
            cache: Mutex::new(FrameCache::default()),
            inflight: InFlight::default(),
            open: false,
        })
    }

    pub fn with_cache_budget(mut self, budget: CacheBudget) -> Self {
        self.cache.get_mut().set_budget(budget);
        self
    }

    #[inline]
    pub fn format(&self) -> &OutputFormat {
        &self.format
    }

    /// Change the output format. Only allowed while closed.
    pub fn set_format(&mut self, format: OutputFormat) -> Result<()> {
        if self.open {
            return Err(LayerlineError::invalid_config(
                "output format cannot change while the timeline is open",
            ));
        }
        format.validate()?;
        self.format = format;
        for clip in &mut self.clips {
            clip.bind_output_rate(format.frame_rate);
        }
        self.cache.get_mut().clear();
        Ok(())
    }

    pub fn background(&self) -> Color {
        self.background
    }

    /// Color under every clip (default opaque black).
    pub fn set_background(&mut self, color: Color) {
        self.background = color;
        self.cache.get_mut().clear();
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open every clip's reader and start with an empty cache.
    ///
    /// If any reader fails to open, the ones already opened are closed
    /// again and the timeline stays closed.
    pub fn open(&mut self) -> Result<()> {
        if self.open {
            return Ok(());
        }
        for (i, clip) in self.clips.iter().enumerate() {
            if let Err(e) = clip.open() {
                warn!(clip = %clip.name(), error = %e, "failed to open clip");
                for opened in &self.clips[..i] {
                    opened.close();
                }
                return Err(e);
            }
        }
        self.cache.get_mut().clear();
        self.open = true;
        info!(
            clips = self.clips.len(),
            width = self.format.width,
            height = self.format.height,
            rate = %self.format.frame_rate,
            "timeline opened"
        );
        Ok(())
    }

    /// Close every reader and release the cache.
    pub fn close(&mut self) {
        if !self.open {
            return;
        }
        for clip in &self.clips {
            clip.close();
        }
        self.cache.get_mut().clear();
        self.open = false;
        info!("timeline closed");
    }

    /// Add `clip`, opening it if the timeline is open. Returns its id.
    pub fn add_clip(&mut self, mut clip: Clip) -> Result<Uuid> {
        clip.bind_output_rate(self.format.frame_rate);
        if self.open {
            clip.open()?;
        }
        let id = clip.id();
        self.cache.get_mut().remove_range(clip.active_range());
        info!(
            clip = %clip.name(),
            layer = clip.layer(),
            start = clip.position(),
            frames = clip.duration(),
            "clip added"
        );
        self.clips.push(clip);
        Ok(id)
    }

    /// Remove and return the clip with `id`, closing it if the timeline is
    /// open.
    pub fn remove_clip(&mut self, id: Uuid) -> Option<Clip> {
        let index = self.clips.iter().position(|c| c.id() == id)?;
        let clip = self.clips.remove(index);
        if self.open {
            clip.close();
        }
        self.cache.get_mut().remove_range(clip.active_range());
        info!(clip = %clip.name(), "clip removed");
        Some(clip)
    }

    /// Apply `f` to the clip with `id` and drop cached frames it may have
    /// changed.
    pub fn update_clip<T>(&mut self, id: Uuid, f: impl FnOnce(&mut Clip) -> T) -> Result<T> {
        let clip = self
            .clips
            .iter_mut()
            .find(|c| c.id() == id)
            .ok_or_else(|| LayerlineError::invalid_config(format!("no clip with id {}", id)))?;
        let before = clip.active_range();
        let result = f(clip);
        let after = clip.active_range();

        let cache = self.cache.get_mut();
        let pruned = cache.remove_range(before) + cache.remove_range(after);
        debug!(clip = %id, pruned, "clip updated");
        Ok(result)
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn clip(&self, id: Uuid) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id() == id)
    }

    /// One past the last frame any enabled clip covers.
    pub fn duration_frames(&self) -> i64 {
        self.clips
            .iter()
            .filter(|c| c.is_enabled())
            .map(|c| c.active_range())
            .filter(|r| !r.is_empty())
            .map(|r| r.end)
            .max()
            .unwrap_or(0)
            .max(0)
    }

    /// Clips active at `frame`, bottom layer first. Equal layers keep
    /// insertion order.
    pub fn active_clips(&self, frame: i64) -> Vec<&Clip> {
        let mut active: Vec<&Clip> = self
            .clips
            .iter()
            .filter(|c| c.is_active_at(frame))
            .collect();
        active.sort_by_key(|c| c.layer());
        active
    }

    /// The composited frame at `frame`.
    pub fn get_frame(&self, frame: i64) -> Result<SharedFrame> {
        self.get_frame_cancellable(frame, &CancelToken::new())
    }

    /// Like [`get_frame`](Self::get_frame), abandoning the computation with
    /// `Cancelled` once `cancel` fires. A cancelled frame is not cached.
    pub fn get_frame_cancellable(&self, frame: i64, cancel: &CancelToken) -> Result<SharedFrame> {
        self.fetch(frame, cancel)
    }

    /// Render `range` into the cache on the rayon pool.
    ///
    /// Returns how many frames were newly composited. Frames past
    /// `duration_frames` render as background. Frames another request is
    /// already computing are skipped rather than waited for.
    pub fn prerender(&self, range: FrameRange) -> Result<usize> {
        self.prerender_cancellable(range, &CancelToken::new())
    }

    pub fn prerender_cancellable(&self, range: FrameRange, cancel: &CancelToken) -> Result<usize> {
        self.ensure_open()?;
        let range = FrameRange::new(range.start.max(0), range.end);
        let produced = range
            .iter()
            .into_par_iter()
            .map(|n| self.prerender_one(n, cancel).map(usize::from))
            .try_reduce(|| 0, |a, b| Ok(a + b))?;
        debug!(start = range.start, end = range.end, produced, "prerendered range");
        Ok(produced)
    }

    /// Render the frames following `playhead` and keep them protected from
    /// eviction.
    pub fn prerender_ahead(&self, playhead: i64) -> Result<usize> {
        let ahead = FrameRange::with_len(playhead + 1, memory_budget::LOOKAHEAD_FRAMES as i64);
        let end = ahead.end.min(self.duration_frames());
        let window = FrameRange::new(ahead.start, end.max(ahead.start));
        self.cache
            .lock()
            .protect(FrameRange::new(playhead.max(0), window.end));
        self.prerender(window)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().stats()
    }

    pub fn cache_budget(&self) -> CacheBudget {
        self.cache.lock().budget()
    }

    /// Drop every cached frame.
    pub fn invalidate(&mut self) {
        self.cache.get_mut().clear();
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(LayerlineError::not_open("timeline"))
        }
    }

    /// Cached frame, the result of a concurrent request, or a fresh
    /// composition. Records `frame` as the most recently requested.
    fn fetch(&self, frame: i64, cancel: &CancelToken) -> Result<SharedFrame> {
        self.ensure_open()?;
        if frame < 0 {
            return Err(LayerlineError::out_of_range(format!(
                "frame {} precedes the timeline start",
                frame
            )));
        }

        loop {
            cancel.check(frame)?;
            if let Some(hit) = self.cache.lock().get(frame) {
                debug!(frame, "cache hit");
                return Ok(hit);
            }

            match self.inflight.claim(frame) {
                Claim::Leader(claim) => {
                    // A previous leader may have finished between the miss and the claim
                    if let Some(hit) = self.cache.lock().peek(frame) {
                        claim.publish(SharedFrame::clone(&hit));
                        return Ok(hit);
                    }
                    let shared = self.render(frame, cancel)?;
                    claim.publish(SharedFrame::clone(&shared));
                    return Ok(shared);
                }
                Claim::Shared(shared) => {
                    debug!(frame, "reused concurrent result");
                    return Ok(shared);
                }
                Claim::Busy => return self.render(frame, cancel),
                Claim::Retry => continue,
            }
        }
    }

    /// Composite `frame` into the cache unless it is cached or in flight.
    /// True when this call did the compositing.
    fn prerender_one(&self, frame: i64, cancel: &CancelToken) -> Result<bool> {
        cancel.check(frame)?;
        if self.cache.lock().contains(frame) {
            return Ok(false);
        }
        let Some(claim) = self.inflight.try_claim(frame) else {
            return Ok(false);
        };
        if let Some(hit) = self.cache.lock().peek(frame) {
            claim.publish(hit);
            return Ok(false);
        }
        let shared = self.render(frame, cancel)?;
        claim.publish(shared);
        Ok(true)
    }

    /// Composite `frame` and offer it to the cache.
    fn render(&self, frame: i64, cancel: &CancelToken) -> Result<SharedFrame> {
        debug!(frame, "cache miss, compositing");
        let layers = self.active_clips(frame);
        let composed = compose(frame, &self.format, self.background, &layers, cancel)
            .map_err(|e| {
                if !matches!(e, LayerlineError::Cancelled(_)) {
                    warn!(frame, error = %e, "composition failed");
                }
                e
            })?;
        cancel.check(frame)?;

        let shared = composed.into_shared();
        self.cache.lock().put(frame, SharedFrame::clone(&shared));
        Ok(shared)
    }
}

impl Drop for Timeline {
    fn drop(&mut self) {
        self.close();
    }
}
