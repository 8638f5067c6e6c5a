pub mod distance;
pub mod error;
pub mod export;
pub mod photo;
pub mod photo_codec;
pub mod session_state;
pub mod track_point;

pub use error::TrackerError;
