use crate::{
    photo::PhotoRecord,
    track_point::{LastFix, TrackPoint},
};

/// Everything known about the session in progress.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub start_timestamp_ms: Option<i64>,
    pub track_points: Vec<TrackPoint>,
    pub photos: Vec<PhotoRecord>,
    pub total_distance_meters: f64,
    pub last_fix: Option<LastFix>,
    pub is_tracking: bool,
}

impl SessionState {
    /// Seconds since the session started, or zero before it has.
    pub fn elapsed_seconds(&self, now_ms: i64) -> i64 {
        self.start_timestamp_ms
            .map(|start| ((now_ms - start) / 1000).max(0))
            .unwrap_or(0)
    }

    /// Elapsed time as `MM:SS`. Minutes keep counting past 99.
    pub fn duration_label(&self, now_ms: i64) -> String {
        format_duration(self.elapsed_seconds(now_ms))
    }
}

pub fn format_duration(elapsed_seconds: i64) -> String {
    let elapsed = elapsed_seconds.max(0);
    format!("{:02}:{:02}", elapsed / 60, elapsed % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_pad_to_two_digits() {
        assert_eq!(format_duration(0), "00:00");
        assert_eq!(format_duration(61), "01:01");
        assert_eq!(format_duration(3599), "59:59");
        assert_eq!(format_duration(6000), "100:00");
        assert_eq!(format_duration(-5), "00:00");
    }

    #[test]
    fn unstarted_session_has_no_elapsed_time() {
        let state = SessionState::default();
        assert_eq!(state.duration_label(1_000_000), "00:00");

        let started = SessionState { start_timestamp_ms: Some(1_000), ..Default::default() };
        assert_eq!(started.duration_label(126_999), "02:05");
    }
}
