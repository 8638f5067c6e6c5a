//! Great-circle distance between fixes and the running total it feeds.

use crate::track_point::LastFix;

/// Mean earth radius in meters, the value web maps use for their distance readout.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.;

/// Haversine distance in meters between two (latitude, longitude) pairs in degrees.
pub fn haversine_distance(p1: (f64, f64), p2: (f64, f64)) -> f64 {
    let d_lat = (p2.0 - p1.0).to_radians();
    let d_lon = (p2.1 - p1.1).to_radians();
    let lat1 = p1.0.to_radians();
    let lat2 = p2.0.to_radians();

    let a = f64::sin(d_lat / 2.).powi(2)
        + f64::cos(lat1) * f64::cos(lat2) * f64::sin(d_lon / 2.).powi(2);
    let c = 2. * f64::asin(f64::sqrt(a.clamp(0., 1.)));

    EARTH_RADIUS_METERS * c
}

/// Distance contributed by moving from `previous` to `(latitude, longitude)`.
///
/// With no previous fix the increment is exactly zero. Large jumps are not
/// filtered: a noisy GPS sample is counted in full.
pub fn distance_increment(previous: Option<&LastFix>, latitude: f64, longitude: f64) -> f64 {
    match previous {
        Some(prev) => haversine_distance((prev.latitude, prev.longitude), (latitude, longitude)),
        None => 0.,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AARHUS: (f64, f64) = (56.158405, 10.206034);
    const YEREVAN: (f64, f64) = (40.122151, 44.658078);

    #[test]
    fn identical_points_are_zero() {
        assert_eq!(haversine_distance(AARHUS, AARHUS), 0.);
        assert_eq!(haversine_distance((0., 0.), (0., 0.)), 0.);
    }

    #[test]
    fn distance_is_symmetric_and_non_negative() {
        let samples = [AARHUS, YEREVAN, (0., 0.), (-33.86, 151.21), (89.9, -179.9), (-89.9, 179.9)];
        for a in samples {
            for b in samples {
                let ab = haversine_distance(a, b);
                assert!(ab >= 0.);
                assert_eq!(ab, haversine_distance(b, a));
            }
        }
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = haversine_distance((0., 0.), (1., 0.));
        assert!((d - 111_194.9).abs() < 1., "got {d}");
    }

    #[test]
    fn antipodes_are_half_circumference() {
        let d = haversine_distance((0., 0.), (0., 180.));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_METERS).abs() < 1e-3);
    }

    #[test]
    fn first_fix_contributes_nothing() {
        assert_eq!(distance_increment(None, AARHUS.0, AARHUS.1), 0.);
    }

    #[test]
    fn jumps_are_not_filtered() {
        let prev = LastFix { latitude: AARHUS.0, longitude: AARHUS.1, speed_mps: 0. };
        let jump = distance_increment(Some(&prev), YEREVAN.0, YEREVAN.1);
        assert!(jump > 2_000_000.);
    }
}
