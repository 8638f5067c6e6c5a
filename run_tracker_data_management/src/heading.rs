//! Compass heading for a photo, with a bounded wait.

use std::time::Duration;

use run_tracker_lib::photo::normalize_heading;

pub const DEFAULT_HEADING_TIMEOUT: Duration = Duration::from_millis(500);

#[async_trait::async_trait]
pub trait HeadingSource: Send + Sync {
    /// Wait for the next compass reading in degrees. `None` if the device
    /// has no compass.
    async fn next_heading(&self) -> Option<f64>;
}

/// A source that always reports the same reading, e.g. a value given on the command line.
#[derive(Debug, Clone, Copy)]
pub struct FixedHeading(pub f64);

#[async_trait::async_trait]
impl HeadingSource for FixedHeading {
    async fn next_heading(&self) -> Option<f64> {
        Some(self.0)
    }
}

/// Take one reading from `source`, giving up after `timeout`. A missing or
/// late reading yields 0 so capture is never blocked.
pub async fn acquire_heading(source: &dyn HeadingSource, timeout: Duration) -> u16 {
    match tokio::time::timeout(timeout, source.next_heading()).await {
        Ok(Some(degrees)) => normalize_heading(degrees),
        Ok(None) => 0,
        Err(_) => {
            tracing::debug!("No compass reading within {:?}, using heading 0", timeout);
            0
        }
    }
}
