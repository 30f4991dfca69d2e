//! Core domain types for sortscope.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer: producers build [`Step`]s, the
//! playback controller applies them, observers read them.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod settings;
pub use settings::{
    DatasetSize, Pacing, PacingError, RangeError, Settings, Speed, ValueRange, ValueRangeError,
};

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ordered set of array positions.
///
/// Ordered so that serialized steps and test assertions are deterministic.
pub type IndexSet = BTreeSet<usize>;

// ============================================================================
// Step Protocol
// ============================================================================

/// What kind of operation a [`Step`] reports.
///
/// `Compare` steps are emitted before the mutation they decide; `Swap` and
/// `Overwrite` steps are emitted after the mutation, so their array already
/// reflects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Compare,
    Swap,
    Overwrite,
}

impl StepKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compare => "compare",
            Self::Swap => "swap",
            Self::Overwrite => "overwrite",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    #[error("step index {index} is out of range for an array of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("step array length changed from {expected} to {actual}")]
    LengthChanged { expected: usize, actual: usize },
}

/// One observable unit of algorithm progress.
///
/// A step carries a full snapshot of the producer's working array, so applying
/// it never requires knowledge of earlier steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    array: Vec<i64>,
    highlight_indices: IndexSet,
    swap_indices: IndexSet,
    completed_indices: IndexSet,
    kind: StepKind,
    description: String,
}

impl Step {
    #[must_use]
    pub fn new(
        kind: StepKind,
        array: Vec<i64>,
        highlight_indices: IndexSet,
        swap_indices: IndexSet,
        completed_indices: IndexSet,
        description: impl Into<String>,
    ) -> Self {
        Self {
            array,
            highlight_indices,
            swap_indices,
            completed_indices,
            kind,
            description: description.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> StepKind {
        self.kind
    }

    #[must_use]
    pub fn array(&self) -> &[i64] {
        &self.array
    }

    #[must_use]
    pub fn into_array(self) -> Vec<i64> {
        self.array
    }

    #[must_use]
    pub fn highlight_indices(&self) -> &IndexSet {
        &self.highlight_indices
    }

    #[must_use]
    pub fn swap_indices(&self) -> &IndexSet {
        &self.swap_indices
    }

    #[must_use]
    pub fn completed_indices(&self) -> &IndexSet {
        &self.completed_indices
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Check the step against the run's fixed array length.
    ///
    /// The array must keep the run's length and every index set must point
    /// inside it.
    pub fn validate(&self, expected_len: usize) -> Result<(), StepError> {
        let len = self.array.len();
        if len != expected_len {
            return Err(StepError::LengthChanged {
                expected: expected_len,
                actual: len,
            });
        }
        let out_of_range = self
            .highlight_indices
            .iter()
            .chain(&self.swap_indices)
            .chain(&self.completed_indices)
            .find(|&&index| index >= len);
        match out_of_range {
            Some(&index) => Err(StepError::IndexOutOfRange { index, len }),
            None => Ok(()),
        }
    }
}

// ============================================================================
// Algorithm Identity
// ============================================================================

/// The eight instrumented sorting algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmId {
    #[default]
    Bubble,
    Selection,
    Insertion,
    Shell,
    Merge,
    Quick,
    Heap,
    Radix,
}

impl AlgorithmId {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bubble => "bubble",
            Self::Selection => "selection",
            Self::Insertion => "insertion",
            Self::Shell => "shell",
            Self::Merge => "merge",
            Self::Quick => "quick",
            Self::Heap => "heap",
            Self::Radix => "radix",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Bubble => "Bubble Sort",
            Self::Selection => "Selection Sort",
            Self::Insertion => "Insertion Sort",
            Self::Shell => "Shell Sort",
            Self::Merge => "Merge Sort",
            Self::Quick => "Quick Sort",
            Self::Heap => "Heap Sort",
            Self::Radix => "Radix Sort",
        }
    }

    /// Parse an algorithm id, accepting the common `<name>sort` spellings.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.trim().to_ascii_lowercase();
        let name = lower
            .strip_suffix("sort")
            .map(|rest| rest.trim_end_matches(['-', '_', ' ']))
            .unwrap_or(&lower);
        match name {
            "bubble" => Some(Self::Bubble),
            "selection" => Some(Self::Selection),
            "insertion" => Some(Self::Insertion),
            "shell" => Some(Self::Shell),
            "merge" => Some(Self::Merge),
            "quick" => Some(Self::Quick),
            "heap" => Some(Self::Heap),
            "radix" | "lsd" => Some(Self::Radix),
            _ => None,
        }
    }

    /// All algorithms in presentation order.
    #[must_use]
    pub const fn all() -> &'static [AlgorithmId] {
        &[
            Self::Bubble,
            Self::Selection,
            Self::Insertion,
            Self::Shell,
            Self::Merge,
            Self::Quick,
            Self::Heap,
            Self::Radix,
        ]
    }
}

impl fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// ============================================================================
// Run Lifecycle
// ============================================================================

/// Playback lifecycle as seen by observers.
///
/// ```text
/// Idle ──start──> Running <──pause/resume──> Paused
///                    │                          │
///                    │ producer returns         │ stop
///                    v                          v
///                Completed                   Aborted ──> Idle
///                    │
///                    └──reset──> Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
    Aborted,
}

impl RunState {
    /// A producer is attached (Running or Paused).
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
