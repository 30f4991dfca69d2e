//! Resolved settings types shared across crates.
//!
//! These types represent fully-validated playback and dataset settings.
//! Raw TOML deserialization structs (with `Option` fields) stay private in
//! `sortscope-config`. The config loader resolves them into these types at the
//! parse boundary.
//!
//! Existence of a value is the proof of its validity.

use std::fmt;
use std::ops::RangeInclusive;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::AlgorithmId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{what} must be between {min} and {max} (got {value})")]
pub struct RangeError {
    pub what: &'static str,
    pub value: i64,
    pub min: i64,
    pub max: i64,
}

// ============================================================================
// Speed
// ============================================================================

/// Playback speed on a 1..=100 scale. Higher is faster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Speed(u8);

impl Speed {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 100;

    pub fn new(value: i64) -> Result<Self, RangeError> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(RangeError {
                what: "speed",
                value,
                min: i64::from(Self::MIN),
                max: i64::from(Self::MAX),
            })
        }
    }

    /// Clamp any integer into the valid range.
    #[must_use]
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(i64::from(Self::MIN), i64::from(Self::MAX)) as u8)
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self(50)
    }
}

impl TryFrom<i64> for Speed {
    type Error = RangeError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Speed> for u8 {
    fn from(value: Speed) -> Self {
        value.0
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// Dataset Size
// ============================================================================

/// Number of elements generated for a random dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "usize")]
pub struct DatasetSize(usize);

impl DatasetSize {
    pub const MIN: usize = 10;
    pub const MAX: usize = 200;

    pub fn new(value: i64) -> Result<Self, RangeError> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as usize))
        } else {
            Err(RangeError {
                what: "dataset size",
                value,
                min: Self::MIN as i64,
                max: Self::MAX as i64,
            })
        }
    }

    #[must_use]
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(Self::MIN as i64, Self::MAX as i64) as usize)
    }

    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl Default for DatasetSize {
    fn default() -> Self {
        Self(50)
    }
}

impl TryFrom<i64> for DatasetSize {
    type Error = RangeError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DatasetSize> for usize {
    fn from(value: DatasetSize) -> Self {
        value.0
    }
}

// ============================================================================
// Value Range
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("value range minimum ({min}) must not exceed maximum ({max})")]
pub struct ValueRangeError {
    pub min: i64,
    pub max: i64,
}

/// Inclusive magnitude band for randomly generated values.
///
/// Invariant: `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueRange {
    min: i64,
    max: i64,
}

impl ValueRange {
    /// Documented default band: `[5, 104]`.
    pub const DEFAULT: Self = Self { min: 5, max: 104 };

    pub fn new(min: i64, max: i64) -> Result<Self, ValueRangeError> {
        if min > max {
            return Err(ValueRangeError { min, max });
        }
        Ok(Self { min, max })
    }

    #[must_use]
    pub const fn min(self) -> i64 {
        self.min
    }

    #[must_use]
    pub const fn max(self) -> i64 {
        self.max
    }

    #[must_use]
    pub const fn as_range(self) -> RangeInclusive<i64> {
        self.min..=self.max
    }

    #[must_use]
    pub fn contains(self, value: i64) -> bool {
        self.as_range().contains(&value)
    }
}

impl Default for ValueRange {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ============================================================================
// Pacing
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum PacingError {
    #[error("decay factor must be in (0, 1) (got {0})")]
    DecayOutOfRange(f64),
    #[error("minimum delay ({min:?}) must not exceed base delay ({base:?})")]
    MinAboveBase { min: Duration, base: Duration },
}

/// Delay schedule between applied steps.
///
/// `delay(speed) = max(min_delay, base_delay * decay_factor^speed)`, which is
/// monotonically non-increasing in `speed`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pacing {
    base_delay: Duration,
    decay_factor: f64,
    min_delay: Duration,
}

impl Pacing {
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);
    pub const DEFAULT_DECAY_FACTOR: f64 = 0.95;
    pub const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(1);

    pub fn new(
        base_delay: Duration,
        decay_factor: f64,
        min_delay: Duration,
    ) -> Result<Self, PacingError> {
        if !(decay_factor > 0.0 && decay_factor < 1.0) {
            return Err(PacingError::DecayOutOfRange(decay_factor));
        }
        if min_delay > base_delay {
            return Err(PacingError::MinAboveBase {
                min: min_delay,
                base: base_delay,
            });
        }
        Ok(Self {
            base_delay,
            decay_factor,
            min_delay,
        })
    }

    /// No delay between steps. Used by headless runs and tests.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            base_delay: Duration::ZERO,
            decay_factor: Self::DEFAULT_DECAY_FACTOR,
            min_delay: Duration::ZERO,
        }
    }

    #[must_use]
    pub const fn base_delay(&self) -> Duration {
        self.base_delay
    }

    #[must_use]
    pub const fn decay_factor(&self) -> f64 {
        self.decay_factor
    }

    #[must_use]
    pub const fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// How long the producer stays suspended after a step is applied.
    #[must_use]
    pub fn delay_for(&self, speed: Speed) -> Duration {
        let scaled =
            self.base_delay.as_secs_f64() * self.decay_factor.powi(i32::from(speed.value()));
        Duration::from_secs_f64(scaled).max(self.min_delay)
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            base_delay: Self::DEFAULT_BASE_DELAY,
            decay_factor: Self::DEFAULT_DECAY_FACTOR,
            min_delay: Self::DEFAULT_MIN_DELAY,
        }
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Fully resolved startup settings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Settings {
    pub algorithm: AlgorithmId,
    pub speed: Speed,
    pub size: DatasetSize,
    pub values: ValueRange,
    pub pacing: Pacing,
}
