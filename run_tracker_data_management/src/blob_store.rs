use std::path::Path;

use run_tracker_lib::photo::PhotoRecord;

use crate::{database::db::PhotoVault, DataManagerError};

/// Photo persistence that may not be available.
///
/// Until [`BlobStoreAdapter::open`] succeeds every operation is a no-op, and
/// write failures are logged rather than returned: losing a photo's
/// durability never interrupts the session.
#[derive(Clone, Default)]
pub struct BlobStoreAdapter {
    vault: Option<PhotoVault>,
}

impl BlobStoreAdapter {
    pub fn unopened() -> Self {
        Self::default()
    }

    pub fn from_vault(vault: PhotoVault) -> Self {
        Self { vault: Some(vault) }
    }

    pub async fn open(&mut self, path: &Path) -> Result<(), DataManagerError> {
        let vault = PhotoVault::connect(path).await
            .map_err(|err| DataManagerError::BlobStoreUnavailable(err.to_string()))?;
        self.vault = Some(vault);
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.vault.is_some()
    }

    pub async fn add(&self, photo: &PhotoRecord) {
        let Some(vault) = &self.vault else {
            tracing::debug!("Photo store not open, photo {} kept in memory only", photo.capture_timestamp_ms);
            return;
        };

        if let Err(err) = vault.insert_photo(photo).await {
            tracing::error!("Failed to store photo {}: {}", photo.capture_timestamp_ms, err);
        }
    }

    /// All stored photos in the store's own order.
    pub async fn get_all(&self) -> Vec<PhotoRecord> {
        let Some(vault) = &self.vault else {
            return Vec::new();
        };

        match vault.get_photos().await {
            Ok(photos) => photos,
            Err(err) => {
                tracing::error!("Failed to read photos: {}", err);
                Vec::new()
            }
        }
    }

    pub async fn clear(&self) {
        let Some(vault) = &self.vault else {
            return;
        };

        if let Err(err) = vault.clear().await {
            tracing::error!("Failed to clear photos: {}", err);
        }
    }
}
