//! Bounded cache of composited frames keyed by global frame number.
//!
//! Eviction is locality-aware: when over budget the entry farthest from the
//! most recently requested frame goes first (oldest insertion on ties). The
//! most recently requested entry is kept as long as anything else can go.
//! Entries inside a protected window are only evicted once nothing outside
//! remains, and then from the window edge farthest from the playhead so the
//! resident part of the window stays contiguous.

use layerline_core::{memory_budget, FrameRange, SharedFrame};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tracing::debug;

/// Limits for a [`FrameCache`]. Both apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheBudget {
    /// Total bytes of image and audio data.
    pub max_bytes: usize,
    /// Number of frames.
    pub max_frames: usize,
}

impl CacheBudget {
    pub fn new(max_bytes: usize, max_frames: usize) -> Self {
        Self {
            max_bytes,
            max_frames,
        }
    }

    /// Limit by frame count only.
    pub fn frames(max_frames: usize) -> Self {
        Self::new(usize::MAX, max_frames)
    }

    /// Whether a single frame of `cost` bytes can ever be resident.
    pub fn admits(&self, cost: usize) -> bool {
        self.max_frames > 0 && cost <= self.max_bytes
    }
}

impl Default for CacheBudget {
    fn default() -> Self {
        Self::new(
            memory_budget::FRAME_CACHE_SIZE,
            memory_budget::MAX_CACHED_FRAMES,
        )
    }
}

/// Counters exposed through `Timeline::cache_stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub frames: usize,
    pub bytes: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Fraction of lookups served from the cache.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug)]
struct Entry {
    frame: SharedFrame,
    cost: usize,
    seq: u64,
}

/// Ordered, bounded frame store.
#[derive(Debug)]
pub struct FrameCache {
    entries: BTreeMap<i64, Entry>,
    budget: CacheBudget,
    bytes: usize,
    next_seq: u64,
    last_requested: Option<i64>,
    protected: Option<FrameRange>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl FrameCache {
    pub fn new(budget: CacheBudget) -> Self {
        Self {
            entries: BTreeMap::new(),
            budget,
            bytes: 0,
            next_seq: 0,
            last_requested: None,
            protected: None,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Look up `frame`, recording it as the most recent request.
    pub fn get(&mut self, frame: i64) -> Option<SharedFrame> {
        self.last_requested = Some(frame);
        match self.entries.get(&frame) {
            Some(entry) => {
                self.hits += 1;
                Some(SharedFrame::clone(&entry.frame))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Look up `frame` without touching the request history or counters.
    pub fn peek(&self, frame: i64) -> Option<SharedFrame> {
        self.entries.get(&frame).map(|e| SharedFrame::clone(&e.frame))
    }

    pub fn contains(&self, frame: i64) -> bool {
        self.entries.contains_key(&frame)
    }

    /// Insert or replace `frame`, then evict down to the budget.
    ///
    /// Returns whether the frame is resident afterwards. A frame larger
    /// than the whole budget is not stored.
    pub fn put(&mut self, number: i64, frame: SharedFrame) -> bool {
        let cost = frame.memory_size();
        if !self.budget.admits(cost) {
            debug!(frame = number, cost, "frame exceeds cache budget, not cached");
            return false;
        }
        if let Some(old) = self.entries.remove(&number) {
            self.bytes -= old.cost;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(number, Entry { frame, cost, seq });
        self.bytes += cost;
        self.enforce_budget(number);
        self.entries.contains_key(&number)
    }

    pub fn remove(&mut self, frame: i64) -> Option<SharedFrame> {
        let entry = self.entries.remove(&frame)?;
        self.bytes -= entry.cost;
        Some(entry.frame)
    }

    /// Drop every entry inside `range`; returns how many were removed.
    pub fn remove_range(&mut self, range: FrameRange) -> usize {
        if range.is_empty() {
            return 0;
        }
        let keys: Vec<i64> = self
            .entries
            .range(range.start..range.end)
            .map(|(k, _)| *k)
            .collect();
        for key in &keys {
            self.remove(*key);
        }
        if !keys.is_empty() {
            debug!(
                start = range.start,
                end = range.end,
                removed = keys.len(),
                "pruned cache range"
            );
        }
        keys.len()
    }

    /// Drop every entry outside `range`; returns how many were removed.
    pub fn retain_range(&mut self, range: FrameRange) -> usize {
        let before = self.entries.len();
        let mut freed = 0;
        self.entries.retain(|k, e| {
            let keep = range.contains(*k);
            if !keep {
                freed += e.cost;
            }
            keep
        });
        self.bytes -= freed;
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.bytes = 0;
        self.last_requested = None;
    }

    /// Prefer keeping `range` resident.
    pub fn protect(&mut self, range: FrameRange) {
        self.protected = Some(range);
    }

    pub fn unprotect(&mut self) {
        self.protected = None;
    }

    pub fn protected(&self) -> Option<FrameRange> {
        self.protected
    }

    pub fn last_requested(&self) -> Option<i64> {
        self.last_requested
    }

    pub fn budget(&self) -> CacheBudget {
        self.budget
    }

    /// Change the budget, evicting as needed.
    pub fn set_budget(&mut self, budget: CacheBudget) {
        self.budget = budget;
        let anchor = self.last_requested.unwrap_or(0);
        self.enforce_budget(anchor);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bytes currently resident.
    #[inline]
    pub fn bytes(&self) -> usize {
        self.bytes
    }

    /// Resident frame numbers in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.keys().copied()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            frames: self.entries.len(),
            bytes: self.bytes,
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
        }
    }

    fn over_budget(&self) -> bool {
        self.entries.len() > self.budget.max_frames || self.bytes > self.budget.max_bytes
    }

    /// Evict until within budget. `fallback` anchors distances when nothing
    /// has been requested yet.
    fn enforce_budget(&mut self, fallback: i64) {
        let anchor = self.last_requested.unwrap_or(fallback);
        while self.over_budget() {
            let Some(victim) = self.victim(anchor) else {
                break;
            };
            if self.remove(victim).is_some() {
                self.evictions += 1;
                debug!(frame = victim, anchor, "evicted cached frame");
            }
        }
    }

    fn is_protected(&self, frame: i64) -> bool {
        self.protected.is_some_and(|w| w.contains(frame))
    }

    fn victim(&self, anchor: i64) -> Option<i64> {
        let unprotected = self
            .entries
            .iter()
            .filter(|(k, _)| Some(**k) != self.last_requested && !self.is_protected(**k))
            .max_by_key(|(k, e)| ((**k - anchor).unsigned_abs(), Reverse(e.seq)))
            .map(|(k, _)| *k);
        if unprotected.is_some() {
            return unprotected;
        }

        // Shrink the protected window from its far edge
        if let Some(window) = self.protected.filter(|w| !w.is_empty()) {
            let mut inside = self.entries.range(window.start..window.end);
            if let Some((low, low_entry)) = inside.next() {
                let (high, high_entry) = inside.next_back().unwrap_or((low, low_entry));
                let low_key = ((*low - anchor).unsigned_abs(), Reverse(low_entry.seq));
                let high_key = ((*high - anchor).unsigned_abs(), Reverse(high_entry.seq));
                return Some(if high_key > low_key { *high } else { *low });
            }
        }

        // Only the most recently requested frame is left
        self.entries.keys().next().copied()
    }
}

impl Default for FrameCache {
    fn default() -> Self {
        Self::new(CacheBudget::default())
    }
}
