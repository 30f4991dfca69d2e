//! Initial dataset sources.
//!
//! Two sources feed the controller: uniformly random integers inside a
//! [`ValueRange`], or a user-typed list. Custom input is tolerant: separators
//! may be ASCII commas, full-width commas or whitespace, and tokens that do not
//! parse as integers are dropped.

use thiserror::Error;

use sortscope_types::{DatasetSize, ValueRange};

const FULL_WIDTH_COMMA: char = '\u{FF0C}';

/// Custom input contained no usable numbers.
///
/// Callers treat this as a silent no-op and keep the previous dataset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("custom data contains no valid numbers")]
pub struct InvalidInput;

/// Random dataset source bounded by a fixed magnitude band.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataGenerator {
    range: ValueRange,
}

impl DataGenerator {
    #[must_use]
    pub const fn new(range: ValueRange) -> Self {
        Self { range }
    }

    #[must_use]
    pub const fn range(&self) -> ValueRange {
        self.range
    }

    /// `size` integers drawn uniformly from the band.
    #[must_use]
    pub fn random(&self, size: DatasetSize) -> Vec<i64> {
        let values: Vec<i64> = (0..size.get())
            .map(|_| rand::random_range(self.range.as_range()))
            .collect();
        tracing::debug!(
            size = values.len(),
            min = self.range.min(),
            max = self.range.max(),
            "Generated random dataset"
        );
        values
    }
}

/// Parse a delimiter-separated list of integers.
///
/// Empty and non-numeric tokens are skipped. Returns [`InvalidInput`] when
/// nothing usable remains.
pub fn parse_custom(raw: &str) -> Result<Vec<i64>, InvalidInput> {
    let values: Vec<i64> = raw
        .split(|c: char| c == ',' || c == FULL_WIDTH_COMMA || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .filter_map(|token| token.parse::<i64>().ok())
        .collect();

    if values.is_empty() {
        Err(InvalidInput)
    } else {
        Ok(values)
    }
}
