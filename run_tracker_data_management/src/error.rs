use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataManagerError {
    /// A photo was captured before the first GPS fix arrived.
    #[error("no GPS fix yet, wait for the position before taking a photo")]
    NoFix,

    #[error("session has not been started")]
    SessionNotStarted,

    #[error("invalid GPS fix at ({latitude}, {longitude})")]
    InvalidFix { latitude: f64, longitude: f64 },

    /// Nobody answered whether to resume an unfinished run, so nothing was
    /// touched.
    #[error("unfinished run found but no answer given, rerun with --resume or --discard")]
    RecoveryUndecided,

    #[error("photo store unavailable: {0}")]
    BlobStoreUnavailable(String),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("gpx error: {0}")]
    Gpx(String),

    #[error(transparent)]
    Tracker(#[from] run_tracker_lib::TrackerError),
}

impl DataManagerError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// The scalar store refused a write because its quota is used up. The
/// session keeps running in memory; this tick is simply not persisted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("storage full: writing {key} needs {needed} bytes, quota is {quota}")]
pub struct StorageFullWarning {
    pub key: String,
    pub needed: usize,
    pub quota: usize,
}
