use thiserror::Error;

use sortscope_algorithms::ProducerFault;

/// Failure surfaced by a controller operation.
///
/// Every path that returns one of these leaves the controller restartable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// Dataset or algorithm changes are refused while a run is live.
    #[error("cannot {operation} while a run is in progress")]
    Busy { operation: &'static str },
    /// The producer failed for a reason other than cancellation. The run has
    /// been torn down and the controller is Idle.
    #[error("sorting run failed: {0}")]
    Fault(#[from] ProducerFault),
}
