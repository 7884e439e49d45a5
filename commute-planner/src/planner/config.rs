//! Planner configuration.

use chrono::Duration;

/// Configuration parameters for commute planning.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Maximum number of upcoming departures to request.
    pub departure_limit: usize,

    /// How long before departure the traveler must be at the station (seconds).
    /// Used both to pick a train and as its too-late threshold.
    pub feasibility_margin_secs: i64,
}

impl PlannerConfig {
    pub fn new(departure_limit: usize, feasibility_margin_secs: i64) -> Self {
        Self {
            departure_limit,
            feasibility_margin_secs,
        }
    }

    /// Returns the feasibility margin as a Duration.
    pub fn feasibility_margin(&self) -> Duration {
        Duration::seconds(self.feasibility_margin_secs)
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            departure_limit: 8,
            feasibility_margin_secs: 60,
        }
    }
}
