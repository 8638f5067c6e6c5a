use const_format::concatcp;

pub mod blob_store;
pub mod clock;
pub mod config;
pub mod database;
mod error;
pub mod events;
pub mod gpx_util;
pub mod heading;
pub mod recovery;
pub mod scalar;
mod session_manager;

pub use error::*;
pub use session_manager::*;

pub const DATA_DIR: &str = "data/";
pub const SCALAR_STORE_DIR: &str = concatcp!(DATA_DIR, "scalar");
pub const PHOTO_DATABASE_PATH: &str = concatcp!(DATA_DIR, "photos.db");
pub const LOG_DIR: &str = concatcp!(DATA_DIR, "log");
pub const CONFIG_PATH: &str = concatcp!(DATA_DIR, "tracker.cfg");
pub const EXPORT_DIR: &str = concatcp!(DATA_DIR, "exports");
