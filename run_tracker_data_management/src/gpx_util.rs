use std::{path::Path, str::FromStr};

use chrono::{DateTime, Utc};
use run_tracker_lib::track_point::Fix;

use crate::DataManagerError;

/// Read every track point of a GPX file as a position fix, in file order.
/// Points without a time are stamped with `fallback_time`.
pub fn read_gpx_fixes(path: &Path, fallback_time: DateTime<Utc>) -> Result<Vec<Fix>, DataManagerError> {
    let file = std::fs::File::open(path).map_err(|err| DataManagerError::io(path, err))?;
    let reader = std::io::BufReader::new(file);
    let gpx = gpx::read(reader).map_err(|err| DataManagerError::Gpx(err.to_string()))?;

    let mut fixes = Vec::new();
    for track in gpx.tracks {
        for segment in track.segments {
            for point in segment.points {
                let time = match point.time {
                    Some(time) => {
                        let formatted = time.format().map_err(|err| DataManagerError::Gpx(err.to_string()))?;
                        DateTime::from_str(&formatted).map_err(|err| DataManagerError::Gpx(format!("bad time {}: {}", formatted, err)))?
                    }
                    None => fallback_time,
                };
                fixes.push(Fix::from_point(point.point(), point.speed, time));
            }
        }
    }

    tracing::info!("Read {} fixes from {}", fixes.len(), path.display());
    Ok(fixes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <name>Morning run</name>
    <trkseg>
      <trkpt lat="56.1" lon="10.2"><time>2024-05-01T12:30:00Z</time></trkpt>
      <trkpt lat="56.2" lon="10.3"><time>2024-05-01T12:30:05Z</time></trkpt>
      <trkpt lat="56.3" lon="10.4"></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

    #[test]
    fn reads_points_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.gpx");
        std::fs::write(&path, SAMPLE).unwrap();

        let fallback = DateTime::from_timestamp(0, 0).unwrap();
        let fixes = read_gpx_fixes(&path, fallback).unwrap();

        assert_eq!(fixes.len(), 3);
        assert_eq!((fixes[0].latitude, fixes[0].longitude), (56.1, 10.2));
        assert_eq!(fixes[0].timestamp_ms, 1_714_566_600_000);
        assert_eq!(fixes[1].timestamp_ms, 1_714_566_605_000);
        assert_eq!(fixes[2].timestamp_ms, 0);
        assert_eq!(fixes[2].speed_mps, None);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_gpx_fixes(&dir.path().join("none.gpx"), Utc::now()).unwrap_err();
        assert!(matches!(err, DataManagerError::Io { .. }));
    }

    #[test]
    fn garbage_is_gpx_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.gpx");
        std::fs::write(&path, "not xml at all").unwrap();

        let err = read_gpx_fixes(&path, Utc::now()).unwrap_err();
        assert!(matches!(err, DataManagerError::Gpx(_)));
    }
}
