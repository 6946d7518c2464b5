//! Event bus: many workers publish, one aggregator consumes
//!
//! Backed by a tokio mpsc channel of capacity 1, so at most one event sits
//! between a publisher and the consumer and a second publisher waits for the
//! aggregator. Per-worker order is preserved; order across workers is
//! first-come.
//!
//! The channel closes when the last `EventPublisher` is dropped. The
//! orchestrator holds one publisher until every worker has exited, so a
//! closed bus while a worker is still running is an ordering bug and shows
//! up as `PollerError::Shutdown`.

use crate::errors::PollerError;
use crate::types::PriceEvent;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub const EVENT_BUS_CAPACITY: usize = 1;

pub type EventStream = mpsc::Receiver<PriceEvent>;

/// Create the bus: a cloneable publisher and the single consumer end
pub fn event_bus() -> (EventPublisher, EventStream) {
    let (tx, rx) = mpsc::channel(EVENT_BUS_CAPACITY);
    (EventPublisher { tx }, rx)
}

/// Outcome of a publish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publish {
    Delivered,
    /// Cancellation won the race; the event was dropped
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct EventPublisher {
    tx: mpsc::Sender<PriceEvent>,
}

impl EventPublisher {
    /// Send `event`, waiting for room on the bus unless cancellation fires
    /// first. Never sends once `cancel` is observed.
    pub async fn publish(
        &self,
        event: PriceEvent,
        cancel: &CancellationToken,
    ) -> Result<Publish, PollerError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Ok(Publish::Cancelled),
            sent = self.tx.send(event) => match sent {
                Ok(()) => Ok(Publish::Delivered),
                Err(mpsc::error::SendError(event)) => Err(PollerError::Shutdown(format!(
                    "event bus closed while worker {} was emitting {}",
                    event.worker_id, event.symbol
                ))),
            },
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
