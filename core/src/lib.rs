//! Core domain logic for sortscope.
//!
//! This crate contains the standalone pieces the playback engine builds on:
//! dataset generation (random and user-supplied) and small array helpers.

mod dataset;

pub use dataset::{DataGenerator, InvalidInput, parse_custom};

/// True when `values` is numerically non-decreasing.
#[must_use]
pub fn is_sorted(values: &[i64]) -> bool {
    values.windows(2).all(|pair| pair[0] <= pair[1])
}

#[cfg(test)]
mod tests {
    use super::is_sorted;

    #[test]
    fn is_sorted_handles_edges() {
        assert!(is_sorted(&[]));
        assert!(is_sorted(&[7]));
        assert!(is_sorted(&[1, 1, 2]));
        assert!(!is_sorted(&[2, 1]));
    }
}
