use run_tracker_lib::{session_state::SessionState, track_point::TrackPoint};

use super::{ScalarStore, SESSION_KEYS, START_TIMESTAMP_KEY, TOTAL_DISTANCE_KEY, TRACK_POINTS_KEY};
use crate::StorageFullWarning;

/// The scalar part of an interrupted session, as found in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedSession {
    pub start_timestamp_ms: i64,
    pub track_points: Vec<TrackPoint>,
    pub total_distance_meters: f64,
}

/// Mirrors the session's track, distance and start time into a [`ScalarStore`].
pub struct ScalarStoreAdapter {
    store: Box<dyn ScalarStore>,
}

impl ScalarStoreAdapter {
    pub fn new(store: impl ScalarStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// Persist the current session. Nothing is written before the session
    /// has a start time. The first rejected write ends the tick, leaving the
    /// previously stored values in place.
    pub fn save(&mut self, state: &SessionState) -> Result<(), StorageFullWarning> {
        let Some(start) = state.start_timestamp_ms else {
            return Ok(());
        };

        let track = match serde_json::to_string(&state.track_points) {
            Ok(track) => track,
            Err(err) => {
                tracing::error!("Failed to serialize track points: {}", err);
                return Ok(());
            }
        };

        // Track first: a crash between the two writes restores the newest
        // point with the previous total, which undercounts one segment but
        // never counts one twice.
        self.store.set(TRACK_POINTS_KEY, &track)?;
        self.store.set(TOTAL_DISTANCE_KEY, &state.total_distance_meters.to_string())?;
        self.store.set(START_TIMESTAMP_KEY, &start.to_string())?;
        Ok(())
    }

    /// Read back a resumable session. Partial or malformed data counts as
    /// no session at all.
    pub fn load(&self) -> Option<PersistedSession> {
        let track = self.store.get(TRACK_POINTS_KEY)?;
        let start = self.store.get(START_TIMESTAMP_KEY)?;

        let parsed = parse_session(&track, self.store.get(TOTAL_DISTANCE_KEY).as_deref(), &start);
        if parsed.is_none() {
            tracing::debug!("Ignoring corrupt recovery data");
        }
        parsed
    }

    pub fn clear(&mut self) {
        for key in SESSION_KEYS {
            self.store.remove(key);
        }
    }
}

fn parse_session(track: &str, distance: Option<&str>, start: &str) -> Option<PersistedSession> {
    let track_points: Vec<TrackPoint> = serde_json::from_str(track).ok()?;
    if track_points.is_empty() {
        return None;
    }

    let start_timestamp_ms = start.trim().parse::<i64>().ok()?;
    let total_distance_meters = distance?.trim().parse::<f64>().ok()?;
    if !total_distance_meters.is_finite() || total_distance_meters < 0. {
        return None;
    }

    Some(PersistedSession {
        start_timestamp_ms,
        track_points,
        total_distance_meters,
    })
}
