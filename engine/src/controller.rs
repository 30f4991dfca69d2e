//! The playback controller.
//!
//! ```text
//! start ─> Running ──advance──> apply step k, hold its continuation
//!             │                    │
//!             │   pacing delay     │  (Paused: hold until resume/step)
//!             │<───────────────────┘
//!             │ release k, receive k+1 ...
//!             v
//!          Finished ─> Completed (markers = full range) | fault ─> Idle
//! ```
//!
//! A step is applied as soon as it is received. Its continuation is held for
//! the pacing delay, so the producer cannot compute step `k + 1` before step
//! `k` has been shown for its full delay.

use std::mem;

use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};

use sortscope_algorithms::{
    AlgorithmDescriptor, CancelToken, ProducerEvent, ProducerFault, ProducerOutcome, StepRequest,
    descriptor, spawn_producer,
};
use sortscope_core::{DataGenerator, InvalidInput, parse_custom};
use sortscope_types::{AlgorithmId, DatasetSize, IndexSet, RunState, Settings, Speed};

use crate::error::PlaybackError;
use crate::events::{Observers, PlaybackEvent};
use crate::state::{ActiveRun, HeldStep, Phase, RunSession, is_legal_transition};

/// Result of one [`Controller::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// One step was applied.
    Applied,
    /// Paused with nothing granted; call `step()` or `resume()`.
    Held,
    /// The run ended during this call. Carries `Completed`, or `Aborted` when
    /// the run was cancelled through its session token.
    Finished(RunState),
    /// No run is live.
    Inactive,
}

/// Outcome of [`Controller::load_custom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomLoad {
    /// The dataset was replaced with this many values.
    Loaded(usize),
    /// Nothing parsed; the previous dataset is kept.
    Ignored,
}

/// Borrowed snapshot of what an observer should draw.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackView<'a> {
    pub array: &'a [i64],
    pub highlight: &'a IndexSet,
    pub swapped: &'a IndexSet,
    pub completed: &'a IndexSet,
}

#[derive(Debug)]
pub struct Controller {
    settings: Settings,
    generator: DataGenerator,
    dataset: Vec<i64>,
    highlight: IndexSet,
    swapped: IndexSet,
    completed: IndexSet,
    steps_applied: usize,
    runs: u64,
    phase: Phase,
    observers: Observers,
}

impl Controller {
    /// Controller over a fresh random dataset.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        let generator = DataGenerator::new(settings.values);
        let dataset = generator.random(settings.size);
        Self::with_dataset(settings, dataset)
    }

    #[must_use]
    pub fn with_dataset(settings: Settings, dataset: Vec<i64>) -> Self {
        Self {
            settings,
            generator: DataGenerator::new(settings.values),
            dataset,
            highlight: IndexSet::new(),
            swapped: IndexSet::new(),
            completed: IndexSet::new(),
            steps_applied: 0,
            runs: 0,
            phase: Phase::Idle,
            observers: Observers::default(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn state(&self) -> RunState {
        self.phase.state()
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn algorithm(&self) -> &'static AlgorithmDescriptor {
        descriptor(self.settings.algorithm)
    }

    #[must_use]
    pub fn speed(&self) -> Speed {
        self.settings.speed
    }

    /// The canonical dataset: the last applied step's array while a run is
    /// live.
    #[must_use]
    pub fn dataset(&self) -> &[i64] {
        &self.dataset
    }

    #[must_use]
    pub fn view(&self) -> PlaybackView<'_> {
        PlaybackView {
            array: &self.dataset,
            highlight: &self.highlight,
            swapped: &self.swapped,
            completed: &self.completed,
        }
    }

    /// Steps applied in the current (or just completed) run.
    #[must_use]
    pub fn steps_applied(&self) -> usize {
        self.steps_applied
    }

    /// Metadata of the live run, if any.
    #[must_use]
    pub fn session(&self) -> Option<&RunSession> {
        self.phase.active().map(|run| &run.session)
    }

    /// Receive every event from now on. Dropping the receiver unsubscribes.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<PlaybackEvent> {
        self.observers.subscribe()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Start a run of the selected algorithm over a copy of the dataset.
    ///
    /// A live run is stopped first. Must be called from within a tokio
    /// runtime.
    pub fn start(&mut self) {
        if self.state().is_live() {
            self.stop();
        }

        let algorithm = self.algorithm();
        let cancel = CancelToken::new();
        let input = self.dataset.clone();
        let (events, _producer) = spawn_producer(algorithm.producer, input.clone(), cancel.clone());

        self.runs += 1;
        self.clear_markers();
        self.steps_applied = 0;
        tracing::info!(
            run = self.runs,
            algorithm = %algorithm.id,
            len = input.len(),
            "Starting run"
        );

        let from = self.state();
        let session = RunSession::new(self.runs, algorithm, input, cancel);
        self.enter(from, Phase::Running(ActiveRun::new(session, events)));
    }

    /// Running -> Paused. Returns false (and does nothing) otherwise.
    pub fn pause(&mut self) -> bool {
        match mem::take(&mut self.phase) {
            Phase::Running(mut run) => {
                run.granted = false;
                self.enter(RunState::Running, Phase::Paused(run));
                true
            }
            other => {
                self.phase = other;
                false
            }
        }
    }

    /// Paused -> Running, releasing a held step immediately.
    pub fn resume(&mut self) -> bool {
        match mem::take(&mut self.phase) {
            Phase::Paused(mut run) => {
                run.granted = false;
                run.release_held();
                self.enter(RunState::Paused, Phase::Running(run));
                true
            }
            other => {
                self.phase = other;
                false
            }
        }
    }

    /// While Paused, let exactly one more step through. The next
    /// [`advance`](Self::advance) applies it and the run stays Paused.
    ///
    /// No-op while Running, Idle, or when a granted step is still pending.
    pub fn step(&mut self) -> bool {
        let Phase::Paused(run) = &mut self.phase else {
            return false;
        };
        if run.granted {
            return false;
        }
        run.release_held();
        run.granted = true;
        tracing::debug!(steps = self.steps_applied, "Granted single step");
        true
    }

    /// Abort the live run.
    ///
    /// The producer is cancelled and no further steps are applied. The
    /// dataset reverts to what the run started from and all markers clear.
    /// Ends Idle, passing through Aborted.
    pub fn stop(&mut self) -> bool {
        let from = self.state();
        match mem::take(&mut self.phase) {
            Phase::Running(run) | Phase::Paused(run) => {
                tracing::info!(
                    run = run.session.run(),
                    steps = self.steps_applied,
                    "Run stopped"
                );
                self.dataset = run.session.input().to_vec();
                drop(run);
                self.clear_markers();
                self.steps_applied = 0;
                self.announce(from, RunState::Aborted);
                self.announce(RunState::Aborted, RunState::Idle);
                true
            }
            other => {
                self.phase = other;
                false
            }
        }
    }

    /// Completed -> Idle, clearing markers.
    pub fn reset(&mut self) -> Result<(), PlaybackError> {
        self.ensure_not_live("reset")?;
        self.settle_idle();
        Ok(())
    }

    // ========================================================================
    // Settings and Data
    // ========================================================================

    pub fn set_algorithm(&mut self, id: AlgorithmId) -> Result<(), PlaybackError> {
        self.ensure_not_live("change the algorithm")?;
        self.settings.algorithm = id;
        self.settle_idle();
        Ok(())
    }

    /// Takes effect from the next applied step, also mid-run.
    pub fn set_speed(&mut self, speed: Speed) {
        tracing::debug!(speed = speed.value(), "Speed changed");
        self.settings.speed = speed;
    }

    /// Resize and regenerate the random dataset.
    pub fn set_size(&mut self, size: DatasetSize) -> Result<(), PlaybackError> {
        self.ensure_not_live("change the dataset size")?;
        self.settings.size = size;
        self.regenerate()
    }

    /// Replace the dataset with fresh random values.
    pub fn regenerate(&mut self) -> Result<(), PlaybackError> {
        self.ensure_not_live("regenerate the dataset")?;
        self.dataset = self.generator.random(self.settings.size);
        self.settle_idle();
        Ok(())
    }

    /// Replace the dataset with a user-typed list.
    ///
    /// Input without a single usable number is ignored, not an error.
    pub fn load_custom(&mut self, raw: &str) -> Result<CustomLoad, PlaybackError> {
        self.ensure_not_live("load custom data")?;
        match parse_custom(raw) {
            Ok(values) => {
                let len = values.len();
                self.dataset = values;
                self.settle_idle();
                Ok(CustomLoad::Loaded(len))
            }
            Err(InvalidInput) => {
                tracing::debug!("Ignoring custom data without numbers");
                Ok(CustomLoad::Ignored)
            }
        }
    }

    // ========================================================================
    // Driving
    // ========================================================================

    /// Move the live run forward by at most one step.
    ///
    /// While Running, first waits out the pacing delay of the held step and
    /// releases it. While Paused, only a step granted by [`step`](Self::step)
    /// is applied.
    ///
    /// Cancel safe: dropping the future before it resolves loses no step.
    pub async fn advance(&mut self) -> Result<Advance, PlaybackError> {
        let event = match &mut self.phase {
            Phase::Idle | Phase::Completed => return Ok(Advance::Inactive),
            Phase::Paused(run) => {
                if run.held.is_some() || !run.granted {
                    return Ok(Advance::Held);
                }
                run.events.recv().await
            }
            Phase::Running(run) => {
                if let Some(release_at) = run.held.as_ref().map(|held| held.release_at) {
                    sleep_until(release_at).await;
                    run.release_held();
                }
                run.events.recv().await
            }
        };

        match event {
            Some(ProducerEvent::Step(request)) => self.apply(request),
            Some(ProducerEvent::Finished(outcome)) => self.finish(outcome),
            // Channel closed without an outcome: the producer task died.
            None => Err(self.fault(ProducerFault::Terminated)),
        }
    }

    /// Advance until the run finishes or is held by a pause.
    pub async fn run_to_end(&mut self) -> Result<Advance, PlaybackError> {
        loop {
            match self.advance().await? {
                Advance::Applied => {}
                other => return Ok(other),
            }
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn apply(&mut self, request: StepRequest) -> Result<Advance, PlaybackError> {
        if let Err(err) = request.step().validate(self.dataset.len()) {
            return Err(self.fault(err.into()));
        }

        let delay = self.settings.pacing.delay_for(self.settings.speed);
        let (step, continuation) = request.into_parts();
        let index = self.steps_applied;
        self.steps_applied += 1;

        self.dataset.copy_from_slice(step.array());
        self.highlight.clone_from(step.highlight_indices());
        self.swapped.clone_from(step.swap_indices());
        self.completed.clone_from(step.completed_indices());
        tracing::trace!(index, kind = %step.kind(), "{}", step.description());
        self.observers.publish(&PlaybackEvent::Step { index, step });

        if let Phase::Running(run) | Phase::Paused(run) = &mut self.phase {
            run.granted = false;
            run.held = Some(HeldStep {
                continuation,
                release_at: Instant::now() + delay,
            });
        }
        Ok(Advance::Applied)
    }

    fn finish(&mut self, outcome: ProducerOutcome) -> Result<Advance, PlaybackError> {
        match outcome {
            ProducerOutcome::Completed(values) => {
                if values.len() != self.dataset.len() {
                    let fault = ProducerFault::LengthMismatch {
                        expected: self.dataset.len(),
                        actual: values.len(),
                    };
                    return Err(self.fault(fault));
                }
                self.complete(values);
                Ok(Advance::Finished(RunState::Completed))
            }
            ProducerOutcome::Cancelled => {
                self.stop();
                Ok(Advance::Finished(RunState::Aborted))
            }
            ProducerOutcome::Faulted(fault) => Err(self.fault(fault)),
        }
    }

    fn complete(&mut self, values: Vec<i64>) {
        let from = self.state();
        if let Some(run) = mem::replace(&mut self.phase, Phase::Completed).active() {
            tracing::info!(
                run = run.session.run(),
                algorithm = %run.session.algorithm().id,
                steps = self.steps_applied,
                "Run completed"
            );
        }

        self.dataset = values;
        self.highlight.clear();
        self.swapped.clear();
        self.completed = (0..self.dataset.len()).collect();

        self.announce(from, RunState::Completed);
        self.observers.publish(&PlaybackEvent::Done {
            completed: self.completed.clone(),
        });
    }

    /// Tear down the run after a producer failure. The dataset keeps the last
    /// applied snapshot.
    fn fault(&mut self, fault: ProducerFault) -> PlaybackError {
        let from = self.state();
        drop(mem::take(&mut self.phase));
        tracing::warn!(
            %fault,
            algorithm = %self.settings.algorithm,
            steps = self.steps_applied,
            "Producer fault; run abandoned"
        );

        self.clear_markers();
        self.observers.publish(&PlaybackEvent::Fault {
            message: fault.to_string(),
        });
        if from != RunState::Idle {
            self.announce(from, RunState::Idle);
        }
        PlaybackError::Fault(fault)
    }

    fn ensure_not_live(&self, operation: &'static str) -> Result<(), PlaybackError> {
        if self.state().is_live() {
            tracing::warn!(operation, state = %self.state(), "Rejected while run is live");
            return Err(PlaybackError::Busy { operation });
        }
        Ok(())
    }

    /// Drop stale markers after the dataset or algorithm changed.
    fn settle_idle(&mut self) {
        self.clear_markers();
        self.steps_applied = 0;
        if matches!(self.phase, Phase::Completed) {
            self.enter(RunState::Completed, Phase::Idle);
        }
    }

    fn clear_markers(&mut self) {
        self.highlight.clear();
        self.swapped.clear();
        self.completed.clear();
    }

    /// Install `next` (the previous phase was already taken out by the caller)
    /// and announce the edge.
    fn enter(&mut self, from: RunState, next: Phase) {
        let to = next.state();
        self.phase = next;
        self.announce(from, to);
    }

    fn announce(&mut self, from: RunState, to: RunState) {
        if from == to {
            return;
        }
        debug_assert!(
            is_legal_transition(from, to),
            "illegal transition {from} -> {to}"
        );
        tracing::info!(%from, %to, "Run state changed");
        self.observers
            .publish(&PlaybackEvent::Lifecycle { from, to });
    }
}
