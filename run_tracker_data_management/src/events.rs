use run_tracker_lib::{photo::PhotoRecord, track_point::TrackPoint};
use tokio::sync::broadcast;

use crate::StorageFullWarning;

/// Notifications for the map and UI. Subscribers only read them; they never
/// call back into the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    TrackPointAdded(TrackPoint),
    PhotoAdded(PhotoRecord),
    SessionReset,
    StorageFull(StorageFullWarning),
    GpsSignalLost(String),
    /// A previous session was restored; carries the path as (lat, lng) pairs.
    SessionRestored(Vec<(f64, f64)>),
}

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }
}

impl EventBus {
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: SessionEvent) {
        // No subscribers is fine, the core does not depend on being observed.
        let _ = self.tx.send(event);
    }
}
