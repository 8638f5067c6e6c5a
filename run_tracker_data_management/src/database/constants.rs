pub const PHOTOS_TABLE_NAME: &str = "photos";
pub const TIMESTAMP: &str = "timestamp";
pub const LATITUDE: &str = "lat";
pub const LONGITUDE: &str = "lng";
pub const HEADING: &str = "heading";

pub const PHOTO_CHUNKS_TABLE_NAME: &str = "photo_chunks";
// Timestamp
pub const CHUNK_INDEX: &str = "chunk_index";
pub const CHUNK: &str = "chunk";
