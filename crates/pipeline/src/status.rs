//! Status sink

use gesture::GestureEvent;
use serde::Serialize;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use vitals::HealthState;

/// Push-only status update
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum StatusUpdate {
    Gesture(GestureEvent),
    Health(HealthState),
    Status(String),
}

/// Most recent value of each update kind
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusSnapshot {
    pub gesture: Option<GestureEvent>,
    pub health: Option<HealthState>,
    pub status: Option<String>,
}

/// Broadcast sink that never blocks the publisher.
///
/// Slow subscribers lag and lose old updates; the latest value of each kind
/// is also kept for polling.
#[derive(Clone)]
pub struct StatusSink {
    tx: broadcast::Sender<StatusUpdate>,
    latest: Arc<RwLock<StatusSnapshot>>,
}

impl StatusSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            latest: Arc::new(RwLock::new(StatusSnapshot::default())),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusUpdate> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        match self.latest.read() {
            Ok(latest) => latest.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn publish(&self, update: StatusUpdate) {
        {
            let mut latest = match self.latest.write() {
                Ok(latest) => latest,
                Err(poisoned) => poisoned.into_inner(),
            };
            match &update {
                StatusUpdate::Gesture(ev) => latest.gesture = Some(ev.clone()),
                StatusUpdate::Health(h) => latest.health = Some(h.clone()),
                StatusUpdate::Status(s) => latest.status = Some(s.clone()),
            }
        }
        // No subscribers is fine
        let _ = self.tx.send(update);
    }

    pub fn gesture(&self, event: GestureEvent) {
        self.publish(StatusUpdate::Gesture(event));
    }

    pub fn health(&self, state: HealthState) {
        self.publish(StatusUpdate::Health(state));
    }

    pub fn status(&self, message: impl Into<String>) {
        self.publish(StatusUpdate::Status(message.into()));
    }
}

impl Default for StatusSink {
    fn default() -> Self {
        Self::new(64)
    }
}
