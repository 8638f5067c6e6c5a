use std::{collections::HashMap, path::Path, str::FromStr, time::Duration};

use const_format::concatcp;
use run_tracker_lib::photo::PhotoRecord;
use sqlx::{query, query_as, sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Executor, Pool, Sqlite, SqlitePool};

use crate::DataManagerError;

use super::constants::*;

/// SQLite-backed store of photo records. Each record is a row in the photos
/// table plus one row per encoded chunk.
#[derive(Clone)]
pub struct PhotoVault {
    pool: Pool<Sqlite>,
}

impl PhotoVault {
    pub async fn connect(path: &Path) -> Result<Self, DataManagerError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent).await
                    .map_err(|err| DataManagerError::io(parent, err))?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .foreign_keys(true)
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options).await?;
        let vault = Self { pool };
        vault.init().await?;
        Ok(vault)
    }

    /// A private database that lives as long as the vault.
    pub async fn connect_in_memory() -> Result<Self, DataManagerError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options).await?;

        let vault = Self { pool };
        vault.init().await?;
        Ok(vault)
    }

    async fn init(&self) -> Result<(), DataManagerError> {
        self.pool.execute(concatcp!("
            CREATE TABLE IF NOT EXISTS ", PHOTOS_TABLE_NAME, "(",
                TIMESTAMP, " INTEGER PRIMARY KEY,",
                LATITUDE,  " REAL NOT NULL,",
                LONGITUDE, " REAL NOT NULL,",
                HEADING,   " INTEGER NOT NULL);

            CREATE TABLE IF NOT EXISTS ", PHOTO_CHUNKS_TABLE_NAME, "(",
                TIMESTAMP,   " INTEGER NOT NULL,",
                CHUNK_INDEX, " INTEGER NOT NULL,",
                CHUNK,       " TEXT NOT NULL,
                PRIMARY KEY(", TIMESTAMP, ", ", CHUNK_INDEX, "),
                FOREIGN KEY(", TIMESTAMP, ") REFERENCES ", PHOTOS_TABLE_NAME, "(", TIMESTAMP, ") ON DELETE CASCADE
            )")).await?;
        Ok(())
    }

    /// Insert a record and all of its chunks in one transaction. A record
    /// whose timestamp already exists is rejected as a whole.
    pub async fn insert_photo(&self, photo: &PhotoRecord) -> Result<(), DataManagerError> {
        let mut tx = self.pool.begin().await?;

        query(concatcp!("
            INSERT INTO ", PHOTOS_TABLE_NAME, "(", TIMESTAMP, ", ", LATITUDE, ", ", LONGITUDE, ", ", HEADING, ")
            VALUES (?1, ?2, ?3, ?4)"))
                .bind(photo.capture_timestamp_ms)
                .bind(photo.latitude)
                .bind(photo.longitude)
                .bind(photo.heading_degrees as i64)
                .execute(&mut *tx).await?;

        for (index, chunk) in photo.encoded_chunks.iter().enumerate() {
            query(concatcp!("
                INSERT INTO ", PHOTO_CHUNKS_TABLE_NAME, "(", TIMESTAMP, ", ", CHUNK_INDEX, ", ", CHUNK, ")
                VALUES (?1, ?2, ?3)"))
                    .bind(photo.capture_timestamp_ms)
                    .bind(index as i64)
                    .bind(chunk)
                    .execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_photos(&self) -> Result<Vec<PhotoRecord>, DataManagerError> {
        let rows = query_as::<_, (i64, f64, f64, i64)>(concatcp!(
            "SELECT ", TIMESTAMP, ", ", LATITUDE, ", ", LONGITUDE, ", ", HEADING, " FROM ", PHOTOS_TABLE_NAME))
                .fetch_all(&self.pool).await?;

        let chunk_rows = query_as::<_, (i64, String)>(concatcp!(
            "SELECT ", TIMESTAMP, ", ", CHUNK, " FROM ", PHOTO_CHUNKS_TABLE_NAME, " ORDER BY ", TIMESTAMP, ", ", CHUNK_INDEX))
                .fetch_all(&self.pool).await?;

        let mut chunks: HashMap<i64, Vec<String>> = HashMap::new();
        for (timestamp, chunk) in chunk_rows {
            chunks.entry(timestamp).or_default().push(chunk);
        }

        Ok(rows.into_iter()
            .map(|(timestamp, latitude, longitude, heading)| PhotoRecord {
                latitude,
                longitude,
                heading_degrees: heading.rem_euclid(360) as u16,
                encoded_chunks: chunks.remove(&timestamp).unwrap_or_default(),
                capture_timestamp_ms: timestamp,
            })
            .collect())
    }

    pub async fn clear(&self) -> Result<(), DataManagerError> {
        let mut tx = self.pool.begin().await?;
        query(concatcp!("DELETE FROM ", PHOTO_CHUNKS_TABLE_NAME)).execute(&mut *tx).await?;
        query(concatcp!("DELETE FROM ", PHOTOS_TABLE_NAME)).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use run_tracker_lib::{photo_codec::PhotoCodec, track_point::LastFix};

    use super::*;

    fn photo(timestamp: i64, payload: &[u8]) -> PhotoRecord {
        let anchor = LastFix { latitude: 56.25, longitude: 10.5, speed_mps: 1. };
        PhotoRecord::new(&anchor, 123, PhotoCodec::new(8).unwrap().encode(payload), timestamp)
    }

    #[tokio::test]
    async fn stores_and_reads_photos_with_ordered_chunks() {
        let vault = PhotoVault::connect_in_memory().await.unwrap();
        let first = photo(2000, b"first photo payload that spans many chunks");
        let second = photo(1000, b"second");

        vault.insert_photo(&first).await.unwrap();
        vault.insert_photo(&second).await.unwrap();

        let mut photos = vault.get_photos().await.unwrap();
        photos.sort_by_key(|p| p.capture_timestamp_ms);
        assert_eq!(photos, vec![second, first]);
    }

    #[tokio::test]
    async fn duplicate_key_leaves_no_partial_record() {
        let vault = PhotoVault::connect_in_memory().await.unwrap();
        vault.insert_photo(&photo(2000, b"original")).await.unwrap();

        assert!(vault.insert_photo(&photo(2000, b"a different and much longer payload")).await.is_err());

        let photos = vault.get_photos().await.unwrap();
        assert_eq!(photos, vec![photo(2000, b"original")]);
    }

    #[tokio::test]
    async fn clear_wipes_everything() {
        let vault = PhotoVault::connect_in_memory().await.unwrap();
        vault.insert_photo(&photo(1, b"a")).await.unwrap();
        vault.insert_photo(&photo(2, b"b")).await.unwrap();
        assert_eq!(vault.get_photos().await.unwrap().len(), 2);

        vault.clear().await.unwrap();
        assert!(vault.get_photos().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_database_survives_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("photos.db");

        let vault = PhotoVault::connect(&path).await.unwrap();
        vault.insert_photo(&photo(5, b"kept")).await.unwrap();
        vault.close().await;

        let reopened = PhotoVault::connect(&path).await.unwrap();
        assert_eq!(reopened.get_photos().await.unwrap(), vec![photo(5, b"kept")]);
    }
}
