mod adapter;
mod store;

pub use adapter::*;
pub use store::*;

pub const TRACK_POINTS_KEY: &str = "run_track";
pub const TOTAL_DISTANCE_KEY: &str = "run_dist";
pub const START_TIMESTAMP_KEY: &str = "run_start";

pub const SESSION_KEYS: [&str; 3] = [TRACK_POINTS_KEY, TOTAL_DISTANCE_KEY, START_TIMESTAMP_KEY];

/// Typical browser local storage budget.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;
