use serde::{Deserialize, Serialize};

use crate::track_point::LastFix;

/// A geotagged photo. `capture_timestamp_ms` is unique within a session and
/// keys the record in the photo store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
    #[serde(rename = "heading")]
    pub heading_degrees: u16,
    #[serde(rename = "src_chunks")]
    pub encoded_chunks: Vec<String>,
    #[serde(rename = "timestamp")]
    pub capture_timestamp_ms: i64,
}

impl PhotoRecord {
    pub fn new(anchor: &LastFix, heading_degrees: u16, encoded_chunks: Vec<String>, capture_timestamp_ms: i64) -> Self {
        Self {
            latitude: anchor.latitude,
            longitude: anchor.longitude,
            heading_degrees: heading_degrees % 360,
            encoded_chunks,
            capture_timestamp_ms,
        }
    }
}

/// Round a compass reading to whole degrees in 0..=359.
pub fn normalize_heading(degrees: f64) -> u16 {
    if !degrees.is_finite() {
        return 0;
    }
    (degrees.round() as i64).rem_euclid(360) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_wrap_into_range() {
        assert_eq!(normalize_heading(0.), 0);
        assert_eq!(normalize_heading(359.4), 359);
        assert_eq!(normalize_heading(359.7), 0);
        assert_eq!(normalize_heading(-90.), 270);
        assert_eq!(normalize_heading(725.), 5);
        assert_eq!(normalize_heading(f64::NAN), 0);
    }

    #[test]
    fn serializes_with_export_names() {
        let anchor = LastFix { latitude: 1., longitude: 2., speed_mps: 0. };
        let photo = PhotoRecord::new(&anchor, 45, vec!["data:".into(), "abc".into()], 2000);
        let json = serde_json::to_value(&photo).unwrap();

        assert_eq!(json["lat"], 1.);
        assert_eq!(json["lng"], 2.);
        assert_eq!(json["heading"], 45);
        assert_eq!(json["src_chunks"][1], "abc");
        assert_eq!(json["timestamp"], 2000);
    }
}
