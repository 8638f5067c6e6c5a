use std::sync::Arc;

use run_tracker_lib::{
    distance::distance_increment,
    export::ExportDocument,
    photo::PhotoRecord,
    photo_codec::PhotoCodec,
    session_state::SessionState,
    track_point::{Fix, LastFix, TrackPoint},
};
use tokio::sync::broadcast;

use crate::{
    blob_store::BlobStoreAdapter,
    clock::{Clock, SystemClock},
    config::TrackerConfig,
    events::{EventBus, SessionEvent},
    scalar::{FileScalarStore, PersistedSession, ScalarStoreAdapter},
    DataManagerError,
};

/// Owner of the session in progress.
///
/// All mutation goes through these methods. After every change the scalar
/// part of the session is mirrored to the scalar store, and new photos to the
/// blob store; the stores never feed back into memory except through
/// recovery.
pub struct SessionManager {
    state: SessionState,
    scalar_store: ScalarStoreAdapter,
    blob_store: BlobStoreAdapter,
    codec: PhotoCodec,
    clock: Arc<dyn Clock>,
    events: EventBus,
}

impl SessionManager {
    pub fn new(scalar_store: ScalarStoreAdapter, blob_store: BlobStoreAdapter, codec: PhotoCodec, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: SessionState::default(),
            scalar_store,
            blob_store,
            codec,
            clock,
            events: EventBus::default(),
        }
    }

    /// File-backed scalar store under the configured data dir. The photo
    /// store is left closed; recovery opens it.
    pub fn open(config: &TrackerConfig) -> Result<Self, DataManagerError> {
        let scalar = FileScalarStore::open(config.scalar_dir(), config.scalar_quota_bytes)?;
        Ok(Self::new(
            ScalarStoreAdapter::new(scalar),
            BlobStoreAdapter::unopened(),
            config.codec()?,
            Arc::new(SystemClock),
        ))
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn codec(&self) -> &PhotoCodec {
        &self.codec
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Begin a session, or resume the current one.
    pub fn start(&mut self) {
        if self.state.start_timestamp_ms.is_none() {
            self.state.start_timestamp_ms = Some(self.clock.now_ms());
            tracing::info!("Started session at {}", self.clock.now_ms());
        } else {
            tracing::info!("Resumed session");
        }
        self.state.is_tracking = true;
        self.persist();
    }

    pub fn stop(&mut self) {
        self.state.is_tracking = false;
        self.persist();
        tracing::info!("Stopped tracking");
    }

    pub fn append_track_point(&mut self, fix: Fix) -> Result<TrackPoint, DataManagerError> {
        let Some(start) = self.state.start_timestamp_ms else {
            return Err(DataManagerError::SessionNotStarted);
        };
        if !fix.has_valid_position() {
            tracing::warn!("Rejected fix at ({}, {})", fix.latitude, fix.longitude);
            return Err(DataManagerError::InvalidFix { latitude: fix.latitude, longitude: fix.longitude });
        }

        let increment = distance_increment(self.state.last_fix.as_ref(), fix.latitude, fix.longitude);
        let point = TrackPoint::new(&fix, start, self.clock.now_ms());

        self.state.track_points.push(point);
        self.state.total_distance_meters += increment;
        self.state.last_fix = Some(LastFix::from(&point));

        tracing::debug!(
            "Track point {} at ({}, {}), +{:.1} m, total {:.1} m",
            self.state.track_points.len(), point.latitude, point.longitude, increment, self.state.total_distance_meters
        );

        self.persist();
        self.events.publish(SessionEvent::TrackPointAdded(point));
        Ok(point)
    }

    /// Attach a photo at the last known position.
    pub async fn append_photo(&mut self, image_bytes: &[u8], heading_degrees: u16) -> Result<PhotoRecord, DataManagerError> {
        let Some(anchor) = self.state.last_fix else {
            return Err(DataManagerError::NoFix);
        };

        let photo = PhotoRecord::new(&anchor, heading_degrees, self.codec.encode(image_bytes), self.next_photo_timestamp());
        self.state.photos.push(photo.clone());

        tracing::info!(
            "Photo {} at ({}, {}), heading {}, {} chunks",
            photo.capture_timestamp_ms, photo.latitude, photo.longitude, photo.heading_degrees, photo.encoded_chunks.len()
        );

        self.blob_store.add(&photo).await;
        self.events.publish(SessionEvent::PhotoAdded(photo.clone()));
        Ok(photo)
    }

    /// Drop everything and prepare a fresh session starting now.
    pub async fn reset(&mut self) {
        self.state = SessionState {
            start_timestamp_ms: Some(self.clock.now_ms()),
            ..Default::default()
        };
        self.wipe_stores().await;
        self.events.publish(SessionEvent::SessionReset);
        tracing::info!("Session reset");
    }

    /// The platform reported a geolocation error. Tracking carries on.
    pub fn report_gps_error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("GPS error: {}", message);
        self.events.publish(SessionEvent::GpsSignalLost(message));
    }

    pub fn duration_label(&self) -> String {
        self.state.duration_label(self.clock.now_ms())
    }

    pub fn export(&self, include_photos: bool) -> ExportDocument {
        if include_photos && self.state.photos.is_empty() {
            tracing::info!("No photos in memory to export");
        }

        let now = chrono::DateTime::from_timestamp_millis(self.clock.now_ms()).unwrap_or_default();
        ExportDocument::build(&self.state, now, include_photos)
    }

    pub(crate) fn scalar_store(&self) -> &ScalarStoreAdapter {
        &self.scalar_store
    }

    pub(crate) fn blob_store(&self) -> &BlobStoreAdapter {
        &self.blob_store
    }

    pub(crate) fn blob_store_mut(&mut self) -> &mut BlobStoreAdapter {
        &mut self.blob_store
    }

    /// Replace the in-memory session with one read back from the stores.
    /// Tracking stays suspended until `start` is called.
    pub(crate) fn restore(&mut self, persisted: PersistedSession, photos: Vec<PhotoRecord>) {
        let last_fix = persisted.track_points.last().map(LastFix::from);
        let path = persisted.track_points.iter().map(|p| (p.latitude, p.longitude)).collect();

        self.state = SessionState {
            start_timestamp_ms: Some(persisted.start_timestamp_ms),
            track_points: persisted.track_points,
            photos,
            total_distance_meters: persisted.total_distance_meters,
            last_fix,
            is_tracking: false,
        };

        self.events.publish(SessionEvent::SessionRestored(path));
        for photo in &self.state.photos {
            self.events.publish(SessionEvent::PhotoAdded(photo.clone()));
        }
    }

    pub(crate) async fn wipe_stores(&mut self) {
        self.scalar_store.clear();
        self.blob_store.clear().await;
    }

    fn persist(&mut self) {
        if let Err(warning) = self.scalar_store.save(&self.state) {
            tracing::warn!("Storage full! Track path getting too long: {}", warning);
            self.events.publish(SessionEvent::StorageFull(warning));
        }
    }

    fn next_photo_timestamp(&self) -> i64 {
        let now = self.clock.now_ms();
        match self.state.photos.iter().map(|p| p.capture_timestamp_ms).max() {
            Some(latest) if latest >= now => latest + 1,
            _ => now,
        }
    }
}
