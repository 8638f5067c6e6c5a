use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrackerError {
    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,

    #[error("photo data is not a base64 data URI: {0}")]
    CorruptPhoto(String),
}
