//! Real-time push to every connected listener.

use serde::Serialize;
use tokio::sync::broadcast;

/// Name of the message sent whenever an event's status or bracket changes.
pub const EVENT_UPDATED: &str = "event:updated";

#[derive(Clone, Debug, Serialize)]
pub struct LiveMessage {
    pub event: String,
    pub payload: serde_json::Value,
}

/// Fan-out channel for live updates. Cheap to clone; every clone feeds the
/// same listeners.
#[derive(Clone, Debug)]
pub struct Broadcaster {
    tx: broadcast::Sender<LiveMessage>,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveMessage> {
        self.tx.subscribe()
    }

    /// Best effort: having no listener is not an error.
    pub fn emit_to_all<T: Serialize>(&self, event: &str, payload: &T) {
        let payload = match serde_json::to_value(payload) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("Dropping {} broadcast, payload did not serialize: {}", event, e);
                return;
            }
        };
        let message = LiveMessage {
            event: event.to_string(),
            payload,
        };
        if self.tx.send(message).is_err() {
            log::debug!("No live listeners for {}", event);
        }
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}
