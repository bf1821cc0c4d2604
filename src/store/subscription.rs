//! Per-event view over the controls change feed.

use tokio::sync::broadcast;

use crate::domain::{Controls, EventId, WallEvent};

/// Stream of [`Controls`] snapshots for one event.
///
/// Yields the snapshot current at subscribe time first, then every later
/// snapshot. Because each change carries the full record, a receiver that
/// lags behind the bus simply continues with the next snapshot it gets.
#[derive(Debug)]
pub struct ControlsSubscription {
    event_id: EventId,
    initial: Option<Controls>,
    rx: broadcast::Receiver<WallEvent>,
}

impl ControlsSubscription {
    /// Creates a subscription. `rx` must have been opened before `current`
    /// was read so that no write can fall between the two.
    #[must_use]
    pub fn new(event_id: EventId, current: Controls, rx: broadcast::Receiver<WallEvent>) -> Self {
        Self {
            event_id,
            initial: Some(current),
            rx,
        }
    }

    /// Event this subscription follows.
    #[must_use]
    pub const fn event_id(&self) -> EventId {
        self.event_id
    }

    /// Waits for the next snapshot. Returns `None` once the store is gone.
    pub async fn next(&mut self) -> Option<Controls> {
        if let Some(current) = self.initial.take() {
            return Some(current);
        }
        loop {
            match self.rx.recv().await {
                Ok(WallEvent::ControlsChanged {
                    event_id, controls, ..
                }) if event_id == self.event_id => return Some(controls),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        event_id = %self.event_id,
                        skipped,
                        "controls subscription lagged, continuing with newer snapshots"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
