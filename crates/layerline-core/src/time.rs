//! Time representation for frame-accurate compositing
//!
//! Uses rational numbers to avoid floating-point accumulation errors.
//! Seconds are canonicalized to frame numbers with a single rounding rule
//! (round half down), see [`RationalTime::to_frames_rounded`].

use num_rational::Rational64;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A rational time value representing a point in time, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RationalTime {
    value: Rational64,
}

impl RationalTime {
    /// Create a new RationalTime of `numerator / denominator` seconds.
    #[inline]
    pub fn new(numerator: i64, denominator: i64) -> Self {
        Self {
            value: Rational64::new(numerator, denominator),
        }
    }

    /// Create a RationalTime from a frame number and frame rate.
    #[inline]
    pub fn from_frames(frames: i64, rate: FrameRate) -> Self {
        Self {
            value: Rational64::new(frames * rate.denominator as i64, rate.numerator as i64),
        }
    }

    /// Create a RationalTime from seconds as a float.
    /// Note: May introduce small precision errors.
    pub fn from_seconds_f64(seconds: f64) -> Self {
        // Use a high denominator for reasonable precision
        const PRECISION: i64 = 1_000_000;
        Self {
            value: Rational64::new((seconds * PRECISION as f64).round() as i64, PRECISION),
        }
    }

    /// Convert to seconds as f64.
    #[inline]
    pub fn to_seconds_f64(self) -> f64 {
        *self.value.numer() as f64 / *self.value.denom() as f64
    }

    /// Frame containing this instant at the given rate (floor).
    #[inline]
    pub fn to_frames(self, rate: FrameRate) -> i64 {
        (self.value * rate.as_rational()).floor().to_integer()
    }

    /// Nearest frame boundary at the given rate, exact halves rounding down.
    ///
    /// 0.05 s at 30 fps is 1.5 frames and canonicalizes to frame 1.
    pub fn to_frames_rounded(self, rate: FrameRate) -> i64 {
        let frames = self.value * rate.as_rational();
        let whole = frames.floor();
        if frames - whole > Rational64::new(1, 2) {
            whole.to_integer() + 1
        } else {
            whole.to_integer()
        }
    }

    /// Zero time constant.
    pub const ZERO: Self = Self {
        value: Rational64::new_raw(0, 1),
    };

    /// Check if this time is zero.
    #[inline]
    pub fn is_zero(self) -> bool {
        *self.value.numer() == 0
    }
}

impl Default for RationalTime {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for RationalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.to_seconds_f64())
    }
}

/// Frame rate as a rational number (e.g., 24000/1001 for 23.976 fps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRate {
    /// Numerator (e.g., 24000)
    pub numerator: u32,
    /// Denominator (e.g., 1001)
    pub denominator: u32,
}

impl FrameRate {
    /// Create a new frame rate.
    #[inline]
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Convert to frames per second as f64.
    #[inline]
    pub fn to_fps_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    #[inline]
    fn as_rational(self) -> Rational64 {
        Rational64::new(self.numerator as i64, self.denominator as i64)
    }

    /// A rate is usable when both terms are non-zero.
    pub fn is_valid(self) -> bool {
        self.numerator > 0 && self.denominator > 0
    }

    /// Duration of a single frame.
    #[inline]
    pub fn frame_duration(self) -> RationalTime {
        RationalTime::new(self.denominator as i64, self.numerator as i64)
    }

    /// Index of the first audio sample belonging to `frame`.
    pub fn first_sample(self, frame: i64, sample_rate: u32) -> i64 {
        let num = frame as i128 * sample_rate as i128 * self.denominator as i128;
        num.div_euclid(self.numerator as i128) as i64
    }

    /// Number of audio samples that belong to `frame` at `sample_rate`.
    ///
    /// Fractional remainders are distributed across frames so the running
    /// total always matches `time * sample_rate` exactly.
    pub fn samples_per_frame(self, frame: i64, sample_rate: u32) -> usize {
        let start = self.first_sample(frame, sample_rate);
        let end = self.first_sample(frame + 1, sample_rate);
        (end - start).max(0) as usize
    }

    /// Frame whose sample block at `sample_rate` contains sample `sample`.
    ///
    /// Inverse of [`first_sample`](Self::first_sample): the result `k`
    /// satisfies `first_sample(k) <= sample < first_sample(k + 1)`.
    pub fn frame_at_sample(self, sample: i64, sample_rate: u32) -> i64 {
        let mut frame = RationalTime::new(sample, sample_rate as i64).to_frames(self);
        while self.first_sample(frame, sample_rate) > sample {
            frame -= 1;
        }
        while self.first_sample(frame + 1, sample_rate) <= sample {
            frame += 1;
        }
        frame
    }

    /// Map a frame number at `self` onto the frame showing the same instant at `other`.
    pub fn convert_frame(self, frame: i64, other: FrameRate) -> i64 {
        if self == other {
            return frame;
        }
        RationalTime::from_frames(frame, self).to_frames(other)
    }

    /// Common frame rates
    pub const FPS_23_976: Self = Self::new(24000, 1001);
    pub const FPS_24: Self = Self::new(24, 1);
    pub const FPS_25: Self = Self::new(25, 1);
    pub const FPS_29_97: Self = Self::new(30000, 1001);
    pub const FPS_30: Self = Self::new(30, 1);
    pub const FPS_50: Self = Self::new(50, 1);
    pub const FPS_59_94: Self = Self::new(60000, 1001);
    pub const FPS_60: Self = Self::new(60, 1);
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::FPS_24
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fps = self.to_fps_f64();
        if (fps - fps.round()).abs() < 0.001 {
            write!(f, "{} fps", fps.round() as u32)
        } else {
            write!(f, "{:.3} fps", fps)
        }
    }
}

/// A half-open range of frame numbers, `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRange {
    /// First frame (inclusive)
    pub start: i64,
    /// One past the last frame (exclusive)
    pub end: i64,
}

impl FrameRange {
    #[inline]
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Range of `len` frames beginning at `start`.
    #[inline]
    pub const fn with_len(start: i64, len: i64) -> Self {
        Self {
            start,
            end: start + len,
        }
    }

    #[inline]
    pub fn len(self) -> i64 {
        (self.end - self.start).max(0)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.end <= self.start
    }

    /// Check if a frame is within this range.
    #[inline]
    pub fn contains(self, frame: i64) -> bool {
        frame >= self.start && frame < self.end
    }

    /// Check if two ranges overlap.
    pub fn overlaps(self, other: Self) -> bool {
        !self.is_empty() && !other.is_empty() && self.start < other.end && other.start < self.end
    }

    /// Iterate the frame numbers in the range.
    pub fn iter(self) -> std::ops::Range<i64> {
        self.start..self.end.max(self.start)
    }

    /// Empty range starting at zero.
    pub const EMPTY: Self = Self { start: 0, end: 0 };
}

impl Default for FrameRange {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl From<std::ops::Range<i64>> for FrameRange {
    fn from(range: std::ops::Range<i64>) -> Self {
        Self::new(range.start, range.end)
    }
}
