//! Step emission protocol between producers and the playback controller.
//!
//! The coupling is a single-slot rendezvous: a producer hands one [`Step`] to
//! the controller and stays suspended until the controller releases the
//! matching [`Continuation`]. Because the producer cannot get past emission
//! `k` before that release, steps arrive in strict emission order and at most
//! one is ever in flight.
//!
//! ```text
//! producer                         controller
//!    │  ProducerEvent::Step ─────────>  apply, pace
//!    │  (suspended on ack)               │
//!    │  <──────────── Continuation::release()
//!    │  mutate, next checkpoint
//!    │  ProducerEvent::Finished ─────>  complete / fault
//! ```
//!
//! Cancellation is cooperative: [`CancelToken`] is observed at every
//! checkpoint and every emission, and a dropped continuation or receiver also
//! reads as cancellation.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::future::{BoxFuture, join};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use sortscope_types::{IndexSet, Step, StepError, StepKind};

/// A producer routine: consumes its private working copy and returns the
/// sorted result.
pub type ProducerFuture = BoxFuture<'static, Result<Vec<i64>, ProducerError>>;
pub type ProducerFn = fn(Vec<i64>, StepSink) -> ProducerFuture;

/// Unexpected producer failure, surfaced to the controller's caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProducerFault {
    #[error("unsupported input: {0}")]
    Unsupported(String),
    #[error("producer terminated without reporting a result")]
    Terminated,
    #[error("invalid step: {0}")]
    InvalidStep(#[from] StepError),
    #[error("producer returned {actual} values for a {expected}-element input")]
    LengthMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProducerError {
    /// Cooperative abort. A normal way for a run to end, not a failure.
    #[error("run cancelled")]
    Cancelled,
    #[error(transparent)]
    Fault(#[from] ProducerFault),
}

/// How a producer run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProducerOutcome {
    Completed(Vec<i64>),
    Cancelled,
    Faulted(ProducerFault),
}

impl ProducerOutcome {
    fn from_result(result: Result<Vec<i64>, ProducerError>) -> Self {
        match result {
            Ok(values) => Self::Completed(values),
            Err(ProducerError::Cancelled) => Self::Cancelled,
            Err(ProducerError::Fault(fault)) => Self::Faulted(fault),
        }
    }
}

// ============================================================================
// Cancellation
// ============================================================================

/// Shared cooperative cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

// ============================================================================
// Channel Messages
// ============================================================================

/// Message from a running producer to its controller.
#[derive(Debug)]
pub enum ProducerEvent {
    Step(StepRequest),
    Finished(ProducerOutcome),
}

/// An emitted step together with the producer's suspended continuation.
#[derive(Debug)]
pub struct StepRequest {
    step: Step,
    continuation: Continuation,
}

impl StepRequest {
    #[must_use]
    pub fn step(&self) -> &Step {
        &self.step
    }

    #[must_use]
    pub fn into_parts(self) -> (Step, Continuation) {
        (self.step, self.continuation)
    }
}

/// Permission for a suspended producer to continue past its last emission.
///
/// Consumed on release, so each suspension resolves exactly once. Dropping it
/// unreleased wakes the producer as cancelled.
#[derive(Debug)]
pub struct Continuation(oneshot::Sender<()>);

impl Continuation {
    pub fn release(self) {
        // The producer may already be gone (cancelled); nothing to resume then.
        let _ = self.0.send(());
    }
}

// ============================================================================
// Producer-side Sink
// ============================================================================

/// Element that can be sorted by a producer.
///
/// Steps always carry the `i64` keys; the element itself may carry more (for
/// example an original-order tag when checking stability).
pub trait SortKey: Copy + Send + Sync + 'static {
    fn key(&self) -> i64;
}

impl SortKey for i64 {
    fn key(&self) -> i64 {
        *self
    }
}

/// Producer handle for emitting steps and observing cancellation.
///
/// Tracks the producer's running set of finalized positions so every emitted
/// step carries it.
#[derive(Debug)]
pub struct StepSink {
    tx: mpsc::Sender<ProducerEvent>,
    cancel: CancelToken,
    completed: IndexSet,
    emitted: usize,
}

impl StepSink {
    fn new(tx: mpsc::Sender<ProducerEvent>, cancel: CancelToken) -> Self {
        Self {
            tx,
            cancel,
            completed: IndexSet::new(),
            emitted: 0,
        }
    }

    /// Loop-head checkpoint: bail out once the run is cancelled.
    pub fn checkpoint(&self) -> Result<(), ProducerError> {
        if self.cancel.is_cancelled() {
            Err(ProducerError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Number of steps the controller has accepted so far.
    #[must_use]
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Mark a position as holding its final value.
    pub fn complete(&mut self, index: usize) {
        self.completed.insert(index);
    }

    /// Hand a step to the controller and wait until it is released.
    pub async fn emit(&mut self, step: Step) -> Result<(), ProducerError> {
        self.checkpoint()?;
        let (ack_tx, ack_rx) = oneshot::channel();
        let request = StepRequest {
            step,
            continuation: Continuation(ack_tx),
        };
        self.tx
            .send(ProducerEvent::Step(request))
            .await
            .map_err(|_| ProducerError::Cancelled)?;
        ack_rx.await.map_err(|_| ProducerError::Cancelled)?;
        self.emitted += 1;
        Ok(())
    }

    /// Two positions are about to be compared. Emitted before any mutation
    /// the comparison decides.
    pub async fn compare<E: SortKey>(
        &mut self,
        values: &[E],
        a: usize,
        b: usize,
        description: impl Into<String>,
    ) -> Result<(), ProducerError> {
        let step = self.build(StepKind::Compare, values, [a, b], [], description);
        self.emit(step).await
    }

    /// A single position is being inspected (e.g. reading a radix digit).
    pub async fn inspect<E: SortKey>(
        &mut self,
        values: &[E],
        index: usize,
        description: impl Into<String>,
    ) -> Result<(), ProducerError> {
        let step = self.build(StepKind::Compare, values, [index], [], description);
        self.emit(step).await
    }

    /// Two positions were exchanged. `values` must already reflect the swap.
    pub async fn swap<E: SortKey>(
        &mut self,
        values: &[E],
        a: usize,
        b: usize,
        description: impl Into<String>,
    ) -> Result<(), ProducerError> {
        let step = self.build(StepKind::Swap, values, [], [a, b], description);
        self.emit(step).await
    }

    /// One position was written. `values` must already reflect the write.
    pub async fn overwrite<E: SortKey>(
        &mut self,
        values: &[E],
        index: usize,
        description: impl Into<String>,
    ) -> Result<(), ProducerError> {
        let step = self.build(StepKind::Overwrite, values, [], [index], description);
        self.emit(step).await
    }

    fn build<E: SortKey, const H: usize, const S: usize>(
        &self,
        kind: StepKind,
        values: &[E],
        highlight: [usize; H],
        swapped: [usize; S],
        description: impl Into<String>,
    ) -> Step {
        Step::new(
            kind,
            values.iter().map(SortKey::key).collect(),
            highlight.into_iter().collect(),
            swapped.into_iter().collect(),
            self.completed.clone(),
            description,
        )
    }
}

// ============================================================================
// Runners
// ============================================================================

/// Spawn a producer over `input` on the current tokio runtime.
///
/// Returns the receiving half of the rendezvous. The stream ends with a
/// [`ProducerEvent::Finished`] unless the producer panics or the receiver is
/// dropped first; a stream that closes without `Finished` means the producer
/// died.
pub fn spawn_producer(
    producer: ProducerFn,
    input: Vec<i64>,
    cancel: CancelToken,
) -> (mpsc::Receiver<ProducerEvent>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(1);
    let sink = StepSink::new(tx.clone(), cancel);
    let handle = tokio::spawn(async move {
        let outcome = if input.len() <= 1 {
            ProducerOutcome::Completed(input)
        } else {
            ProducerOutcome::from_result(producer(input, sink).await)
        };
        match &outcome {
            ProducerOutcome::Completed(values) => {
                tracing::debug!(len = values.len(), "Producer completed");
            }
            ProducerOutcome::Cancelled => tracing::debug!("Producer cancelled"),
            ProducerOutcome::Faulted(fault) => tracing::debug!(%fault, "Producer faulted"),
        }
        // Receiver gone means the run was stopped; nobody is waiting for the outcome.
        let _ = tx.send(ProducerEvent::Finished(outcome)).await;
    });
    (rx, handle)
}

/// A producer run captured without pacing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    pub steps: Vec<Step>,
    pub outcome: ProducerOutcome,
}

/// Run `producer` to completion, releasing every step immediately.
pub async fn record(producer: ProducerFn, input: Vec<i64>) -> Recording {
    let (steps, result) = drive(input, producer).await;
    Recording {
        steps,
        outcome: ProducerOutcome::from_result(result),
    }
}

/// Drive a producer in the current task, acknowledging each step as soon as
/// it arrives.
pub(crate) async fn drive<E, F, Fut>(
    input: Vec<E>,
    produce: F,
) -> (Vec<Step>, Result<Vec<E>, ProducerError>)
where
    E: SortKey,
    F: FnOnce(Vec<E>, StepSink) -> Fut,
    Fut: Future<Output = Result<Vec<E>, ProducerError>>,
{
    if input.len() <= 1 {
        return (Vec::new(), Ok(input));
    }

    let (tx, mut rx) = mpsc::channel(1);
    let sink = StepSink::new(tx, CancelToken::new());

    let consume = async move {
        let mut steps = Vec::new();
        while let Some(event) = rx.recv().await {
            if let ProducerEvent::Step(request) = event {
                let (step, continuation) = request.into_parts();
                steps.push(step);
                continuation.release();
            }
        }
        steps
    };

    let (result, steps) = join(produce(input, sink), consume).await;
    (steps, result)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn two_steps(values: Vec<i64>, mut sink: StepSink) -> Result<Vec<i64>, ProducerError> {
        sink.checkpoint()?;
        sink.compare(&values, 0, 1, "first").await?;
        sink.checkpoint()?;
        sink.complete(1);
        sink.swap(&values, 0, 1, "second").await?;
        Ok(values)
    }

    fn two_steps_producer(values: Vec<i64>, sink: StepSink) -> ProducerFuture {
        Box::pin(two_steps(values, sink))
    }

    #[tokio::test]
    async fn record_collects_steps_in_order() {
        let recording = record(two_steps_producer, vec![2, 1]).await;
        let descriptions: Vec<_> = recording.steps.iter().map(Step::description).collect();
        assert_eq!(descriptions, ["first", "second"]);
        assert_eq!(recording.steps[0].kind(), StepKind::Compare);
        assert!(recording.steps[0].completed_indices().is_empty());
        assert_eq!(
            recording.steps[1].completed_indices(),
            &IndexSet::from([1])
        );
        assert_eq!(recording.outcome, ProducerOutcome::Completed(vec![2, 1]));
    }

    #[tokio::test]
    async fn short_inputs_emit_nothing() {
        let empty = record(two_steps_producer, vec![]).await;
        assert!(empty.steps.is_empty());
        assert_eq!(empty.outcome, ProducerOutcome::Completed(vec![]));

        let single = record(two_steps_producer, vec![9]).await;
        assert!(single.steps.is_empty());
        assert_eq!(single.outcome, ProducerOutcome::Completed(vec![9]));
    }

    #[tokio::test]
    async fn spawned_producer_waits_for_release() {
        let cancel = CancelToken::new();
        let (mut rx, handle) = spawn_producer(two_steps_producer, vec![2, 1], cancel);

        let Some(ProducerEvent::Step(first)) = rx.recv().await else {
            panic!("expected first step");
        };
        assert_eq!(first.step().description(), "first");

        // Nothing else can arrive while the first step is held.
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());

        let (_, continuation) = first.into_parts();
        continuation.release();

        let Some(ProducerEvent::Step(second)) = rx.recv().await else {
            panic!("expected second step");
        };
        second.into_parts().1.release();

        match rx.recv().await {
            Some(ProducerEvent::Finished(ProducerOutcome::Completed(values))) => {
                assert_eq!(values, vec![2, 1]);
            }
            other => panic!("expected completion, got {other:?}"),
        }
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn dropped_continuation_cancels_producer() {
        let cancel = CancelToken::new();
        let (mut rx, handle) = spawn_producer(two_steps_producer, vec![2, 1], cancel);

        let Some(ProducerEvent::Step(first)) = rx.recv().await else {
            panic!("expected first step");
        };
        drop(first);

        match rx.recv().await {
            Some(ProducerEvent::Finished(outcome)) => {
                assert_eq!(outcome, ProducerOutcome::Cancelled);
            }
            other => panic!("expected cancelled finish, got {other:?}"),
        }
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn cancel_token_stops_at_next_checkpoint() {
        let cancel = CancelToken::new();
        let (mut rx, handle) = spawn_producer(two_steps_producer, vec![2, 1], cancel.clone());

        let Some(ProducerEvent::Step(first)) = rx.recv().await else {
            panic!("expected first step");
        };
        cancel.cancel();
        first.into_parts().1.release();

        match rx.recv().await {
            Some(ProducerEvent::Finished(outcome)) => {
                assert_eq!(outcome, ProducerOutcome::Cancelled);
            }
            other => panic!("expected cancelled finish, got {other:?}"),
        }
        handle.await.unwrap();
    }
}
