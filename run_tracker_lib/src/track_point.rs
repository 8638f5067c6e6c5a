use chrono::{DateTime, Utc};
use geo_types::Point;
use serde::{Deserialize, Serialize};

/// A single position sample as delivered by the platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    pub speed_mps: Option<f64>,
    pub timestamp_ms: i64,
}

impl Fix {
    pub fn new(latitude: f64, longitude: f64, speed_mps: Option<f64>, timestamp_ms: i64) -> Self {
        Self {
            latitude,
            longitude,
            speed_mps,
            timestamp_ms,
        }
    }

    /// Build a fix from a geo point, where x is longitude and y is latitude.
    pub fn from_point(point: Point, speed_mps: Option<f64>, timestamp: DateTime<Utc>) -> Self {
        Self::new(point.y(), point.x(), speed_mps, timestamp.timestamp_millis())
    }

    /// Finite coordinates within the latitude and longitude ranges.
    pub fn has_valid_position(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90. ..=90.).contains(&self.latitude)
            && (-180. ..=180.).contains(&self.longitude)
    }
}

/// A recorded point of the track. Field names match the export format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    #[serde(rename = "time")]
    pub elapsed_seconds: f64,
    #[serde(rename = "absTime")]
    pub absolute_timestamp_ms: i64,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
    #[serde(rename = "vel", default)]
    pub speed_mps: f64,
}

impl TrackPoint {
    pub fn new(fix: &Fix, start_timestamp_ms: i64, now_ms: i64) -> Self {
        Self {
            elapsed_seconds: (now_ms - start_timestamp_ms) as f64 / 1000.,
            absolute_timestamp_ms: fix.timestamp_ms,
            latitude: fix.latitude,
            longitude: fix.longitude,
            // JSON has no NaN, an unusable speed is stored as 0.
            speed_mps: fix.speed_mps.filter(|speed| speed.is_finite()).unwrap_or(0.),
        }
    }
}

/// The most recent accepted position. Photos are anchored here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LastFix {
    pub latitude: f64,
    pub longitude: f64,
    pub speed_mps: f64,
}

impl From<&TrackPoint> for LastFix {
    fn from(point: &TrackPoint) -> Self {
        Self {
            latitude: point.latitude,
            longitude: point.longitude,
            speed_mps: point.speed_mps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_point_uses_short_field_names() {
        let fix = Fix::new(55.5, 10.25, None, 1_700_000_000_500);
        let point = TrackPoint::new(&fix, 1_700_000_000_000, 1_700_000_002_000);

        assert_eq!(point.elapsed_seconds, 2.);
        assert_eq!(point.speed_mps, 0.);

        let json = serde_json::to_value(point).unwrap();
        assert_eq!(json["lat"], 55.5);
        assert_eq!(json["lng"], 10.25);
        assert_eq!(json["absTime"], 1_700_000_000_500i64);
        assert_eq!(json["time"], 2.);
        assert_eq!(json["vel"], 0.);
    }

    #[test]
    fn missing_speed_defaults_to_zero() {
        let point: TrackPoint = serde_json::from_str(r#"{"time":0,"absTime":1,"lat":1,"lng":1}"#).unwrap();
        assert_eq!(point.speed_mps, 0.);
    }

    #[test]
    fn point_coordinates_are_lon_lat() {
        let fix = Fix::from_point(Point::new(10., 56.), Some(3.), DateTime::from_timestamp_millis(42).unwrap());
        assert_eq!(fix.latitude, 56.);
        assert_eq!(fix.longitude, 10.);
        assert_eq!(fix.timestamp_ms, 42);
    }

    #[test]
    fn positions_must_be_finite_and_in_range() {
        assert!(Fix::new(56.1, 10.2, None, 0).has_valid_position());
        assert!(Fix::new(-90., 180., None, 0).has_valid_position());

        assert!(!Fix::new(f64::NAN, 10.2, None, 0).has_valid_position());
        assert!(!Fix::new(56.1, f64::INFINITY, None, 0).has_valid_position());
        assert!(!Fix::new(90.5, 10.2, None, 0).has_valid_position());
        assert!(!Fix::new(56.1, -181., None, 0).has_valid_position());
    }

    #[test]
    fn unusable_speed_is_stored_as_zero() {
        let point = TrackPoint::new(&Fix::new(56.1, 10.2, Some(f64::NAN), 0), 0, 0);
        assert_eq!(point.speed_mps, 0.);

        let json = serde_json::to_string(&point).unwrap();
        let back: TrackPoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, point);
    }
}
