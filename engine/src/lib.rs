//! Playback engine for sortscope.
//!
//! The [`Controller`] owns the dataset and the run lifecycle. It spawns one
//! producer per run, applies the producer's steps in emission order, paces
//! them according to the current speed, and republishes everything it applies
//! to subscribers.
//!
//! The controller is driven by its owner: control methods (`start`, `pause`,
//! `step`, `stop`, ...) are synchronous, and [`Controller::advance`] is the
//! single await point that moves a run forward.

mod controller;
mod error;
mod events;
mod state;

pub use controller::{Advance, Controller, CustomLoad, PlaybackView};
pub use error::PlaybackError;
pub use events::PlaybackEvent;
pub use state::RunSession;

pub use sortscope_algorithms::{
    AlgorithmDescriptor, CancelToken, ProducerFault, descriptor, descriptors,
};
pub use sortscope_types::{
    AlgorithmId, DatasetSize, IndexSet, Pacing, RunState, Settings, Speed, Step, StepKind,
    ValueRange,
};
