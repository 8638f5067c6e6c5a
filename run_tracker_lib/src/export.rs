//! The downloadable run document, version 2.1.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::{photo::PhotoRecord, session_state::SessionState, track_point::TrackPoint};

pub const EXPORT_VERSION: &str = "2.1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub version: String,
    pub date: String,
    pub total_dist: f64,
    pub duration: String,
    pub track_points: Vec<TrackPoint>,
    pub photos: Vec<PhotoRecord>,
}

impl ExportDocument {
    pub fn build(state: &SessionState, now: DateTime<Utc>, include_photos: bool) -> Self {
        Self {
            version: EXPORT_VERSION.to_string(),
            date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            total_dist: state.total_distance_meters,
            duration: state.duration_label(now.timestamp_millis()),
            track_points: state.track_points.clone(),
            photos: if include_photos { state.photos.clone() } else { Vec::new() },
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// `Run_2024-05-01T12-30-00_FULL.json` style name for an export written at `now`.
pub fn export_file_name(now: DateTime<Utc>, include_photos: bool) -> String {
    let kind = if include_photos { "FULL" } else { "TRACK" };
    format!("Run_{}_{}.json", now.format("%Y-%m-%dT%H-%M-%S"), kind)
}
