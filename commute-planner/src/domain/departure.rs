//! Scheduled train services reported by a transit source.

use chrono::{DateTime, Utc};

/// One scheduled departure on the traveler's line.
///
/// Read-only facts for the duration of one planning call. `delay_seconds`
/// is reported by the source but already reflected in the departure time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainDeparture {
    pub trip_id: String,
    pub departure: DateTime<Utc>,
    pub arrival: DateTime<Utc>,
    pub delay_seconds: i64,
    pub platform: Option<String>,
}

impl TrainDeparture {
    /// Create an on-time departure with no platform information.
    pub fn new(
        trip_id: impl Into<String>,
        departure: DateTime<Utc>,
        arrival: DateTime<Utc>,
    ) -> Self {
        Self {
            trip_id: trip_id.into(),
            departure,
            arrival,
            delay_seconds: 0,
            platform: None,
        }
    }

    pub fn with_delay_seconds(mut self, delay_seconds: i64) -> Self {
        self.delay_seconds = delay_seconds;
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }
}
