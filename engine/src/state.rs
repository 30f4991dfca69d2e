//! Run lifecycle states and the transition graph.
//!
//! [`Phase`] is the controller's internal state; live phases own their
//! [`ActiveRun`], so a producer channel exists exactly while a run is Running
//! or Paused. Observers only ever see the flattened [`RunState`].

use tokio::sync::mpsc;
use tokio::time::Instant;

use sortscope_algorithms::{AlgorithmDescriptor, CancelToken, Continuation, ProducerEvent};
use sortscope_types::RunState;

/// Metadata of the live run.
#[derive(Debug, Clone)]
pub struct RunSession {
    run: u64,
    algorithm: &'static AlgorithmDescriptor,
    input: Vec<i64>,
    cancel: CancelToken,
}

impl RunSession {
    pub(crate) fn new(
        run: u64,
        algorithm: &'static AlgorithmDescriptor,
        input: Vec<i64>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            run,
            algorithm,
            input,
            cancel,
        }
    }

    /// 1-based count of runs started by this controller.
    #[must_use]
    pub fn run(&self) -> u64 {
        self.run
    }

    #[must_use]
    pub fn algorithm(&self) -> &'static AlgorithmDescriptor {
        self.algorithm
    }

    /// The dataset the run started from.
    #[must_use]
    pub fn input(&self) -> &[i64] {
        &self.input
    }

    /// Cancelling this token aborts the run at the producer's next checkpoint.
    #[must_use]
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }
}

/// An applied step whose producer is still suspended.
#[derive(Debug)]
pub(crate) struct HeldStep {
    pub(crate) continuation: Continuation,
    pub(crate) release_at: Instant,
}

/// A spawned producer and the rendezvous state around it.
#[derive(Debug)]
pub(crate) struct ActiveRun {
    pub(crate) session: RunSession,
    pub(crate) events: mpsc::Receiver<ProducerEvent>,
    pub(crate) held: Option<HeldStep>,
    /// While paused: one step has been granted by `step()` and not yet applied.
    pub(crate) granted: bool,
}

impl ActiveRun {
    pub(crate) fn new(session: RunSession, events: mpsc::Receiver<ProducerEvent>) -> Self {
        Self {
            session,
            events,
            held: None,
            granted: false,
        }
    }

    /// Let the producer continue past its held step, if any.
    pub(crate) fn release_held(&mut self) -> bool {
        match self.held.take() {
            Some(held) => {
                held.continuation.release();
                true
            }
            None => false,
        }
    }
}

impl Drop for ActiveRun {
    fn drop(&mut self) {
        // Dropping the receiver and any held continuation already wakes the
        // producer as cancelled; the token also stops it between emissions.
        self.session.cancel.cancel();
    }
}

#[derive(Debug, Default)]
pub(crate) enum Phase {
    #[default]
    Idle,
    Running(ActiveRun),
    Paused(ActiveRun),
    Completed,
}

impl Phase {
    pub(crate) fn state(&self) -> RunState {
        match self {
            Self::Idle => RunState::Idle,
            Self::Running(_) => RunState::Running,
            Self::Paused(_) => RunState::Paused,
            Self::Completed => RunState::Completed,
        }
    }

    pub(crate) fn active(&self) -> Option<&ActiveRun> {
        match self {
            Self::Running(run) | Self::Paused(run) => Some(run),
            Self::Idle | Self::Completed => None,
        }
    }
}

/// Lifecycle edges observers may see.
///
/// `Aborted` is transient: a stopped run passes through it on the way to Idle.
#[must_use]
pub(crate) fn is_legal_transition(from: RunState, to: RunState) -> bool {
    use RunState::{Aborted, Completed, Idle, Paused, Running};

    matches!(
        (from, to),
        (Idle | Completed, Running)
            | (Running, Paused | Completed | Aborted | Idle)
            | (Paused, Running | Completed | Aborted | Idle)
            | (Aborted | Completed, Idle)
    )
}
