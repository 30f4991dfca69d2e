//! Observer fan-out.

use serde::Serialize;
use tokio::sync::mpsc;

use sortscope_types::{IndexSet, RunState, Step};

/// Everything the controller reports to subscribers, in the order it happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum PlaybackEvent {
    /// A step was applied. `index` counts from zero within the run.
    Step { index: usize, step: Step },
    Lifecycle { from: RunState, to: RunState },
    /// The run completed naturally; `completed` is the full index range.
    Done { completed: IndexSet },
    Fault { message: String },
}

#[derive(Debug, Default)]
pub(crate) struct Observers {
    senders: Vec<mpsc::UnboundedSender<PlaybackEvent>>,
}

impl Observers {
    pub(crate) fn subscribe(&mut self) -> mpsc::UnboundedReceiver<PlaybackEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.push(tx);
        rx
    }

    /// Deliver to every live subscriber, dropping the ones that hung up.
    pub(crate) fn publish(&mut self, event: &PlaybackEvent) {
        self.senders.retain(|tx| tx.send(event.clone()).is_ok());
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.senders.len()
    }
}
