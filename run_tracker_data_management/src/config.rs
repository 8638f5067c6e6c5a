use std::{path::{Path, PathBuf}, str::FromStr, time::Duration};

use run_tracker_lib::photo_codec::{PhotoCodec, DEFAULT_CHUNK_SIZE};

use crate::{heading::DEFAULT_HEADING_TIMEOUT, scalar::DEFAULT_QUOTA_BYTES, DataManagerError, CONFIG_PATH, EXPORT_DIR, LOG_DIR, PHOTO_DATABASE_PATH, SCALAR_STORE_DIR};

/// Tunables, read from `data/tracker.cfg` when present.
///
/// The file holds `key = value` lines; blank lines and lines starting with `#`
/// are skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    pub root: PathBuf,
    pub chunk_size: usize,
    pub heading_timeout: Duration,
    pub scalar_quota_bytes: usize,
}

impl TrackerConfig {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            heading_timeout: DEFAULT_HEADING_TIMEOUT,
            scalar_quota_bytes: DEFAULT_QUOTA_BYTES,
        }
    }

    /// Load the config below `root`, or the project root when `root` is `None`.
    pub fn load(root: Option<PathBuf>) -> Result<Self, DataManagerError> {
        let root = root.unwrap_or_else(default_root);
        let path = root.join(CONFIG_PATH);
        let mut config = Self::with_root(root);

        if path.exists() {
            let text = std::fs::read_to_string(&path).map_err(|err| DataManagerError::io(&path, err))?;
            config.apply(&text)?;
            tracing::debug!("Loaded config from {:?}", path);
        }

        Ok(config)
    }

    pub fn apply(&mut self, text: &str) -> Result<(), DataManagerError> {
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(DataManagerError::Config(format!("expected key = value, got {line:?}")));
            };
            let (key, value) = (key.trim(), value.trim());

            match key {
                "chunk_size" => {
                    self.chunk_size = parse_value(key, value)?;
                    PhotoCodec::new(self.chunk_size)?;
                }
                "heading_timeout_ms" => self.heading_timeout = Duration::from_millis(parse_value(key, value)?),
                "scalar_quota_bytes" => self.scalar_quota_bytes = parse_value(key, value)?,
                _ => tracing::warn!("Unknown config key: {}", key),
            }
        }

        Ok(())
    }

    pub fn codec(&self) -> Result<PhotoCodec, DataManagerError> {
        Ok(PhotoCodec::new(self.chunk_size)?)
    }

    pub fn scalar_dir(&self) -> PathBuf {
        self.root.join(SCALAR_STORE_DIR)
    }

    pub fn photo_database_path(&self) -> PathBuf {
        self.root.join(PHOTO_DATABASE_PATH)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.join(LOG_DIR)
    }

    pub fn export_dir(&self) -> PathBuf {
        self.root.join(EXPORT_DIR)
    }
}

fn default_root() -> PathBuf {
    project_root::get_project_root()
        .or_else(|_| std::env::current_dir())
        .unwrap_or_else(|_| Path::new(".").to_path_buf())
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, DataManagerError> {
    value
        .parse()
        .map_err(|_| DataManagerError::Config(format!("invalid value for {key}: {value:?}")))
}
