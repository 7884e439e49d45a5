//! The traveler's saved commute configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::request::{Direction, PlanningMode};

/// Upper bound for every minute-valued tunable in a profile.
pub const MAX_PROFILE_MINUTES: i64 = 24 * 60;

/// A resolved latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A saved commute: addresses, stations, the train line, and the tunables
/// that shape a plan.
///
/// The planner never mutates a profile; it receives one by reference per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommuteProfile {
    pub home_address: String,
    pub work_address: String,
    #[serde(default)]
    pub home_coordinates: Option<Coordinates>,
    #[serde(default)]
    pub work_coordinates: Option<Coordinates>,
    pub home_station: String,
    pub work_station: String,
    pub train_line: String,

    /// Fixed buffer added on top of the cycling ETA to the station.
    #[serde(default = "default_bike_buffer")]
    pub bike_buffer_minutes: i64,

    /// Extra margin at the station. Stored for the presentation layer.
    #[serde(default = "default_station_safety_buffer")]
    pub station_safety_buffer_minutes: i64,

    /// How long before leaving the traveler wants to start getting ready.
    #[serde(default = "default_prep_lead_time")]
    pub prep_lead_time_minutes: i64,

    /// How much slower than baseline the drive may be and still count as good.
    #[serde(default = "default_car_good_delta")]
    pub car_good_delta_minutes: i64,

    #[serde(default = "default_planning_mode")]
    pub default_planning_mode: PlanningMode,
}

fn default_bike_buffer() -> i64 {
    5
}

fn default_station_safety_buffer() -> i64 {
    5
}

fn default_prep_lead_time() -> i64 {
    20
}

fn default_car_good_delta() -> i64 {
    10
}

fn default_planning_mode() -> PlanningMode {
    PlanningMode::ArriveBy
}

impl CommuteProfile {
    /// Create a profile with default tunables.
    pub fn new(
        home_address: impl Into<String>,
        work_address: impl Into<String>,
        home_station: impl Into<String>,
        work_station: impl Into<String>,
        train_line: impl Into<String>,
    ) -> Self {
        Self {
            home_address: home_address.into(),
            work_address: work_address.into(),
            home_coordinates: None,
            work_coordinates: None,
            home_station: home_station.into(),
            work_station: work_station.into(),
            train_line: train_line.into(),
            bike_buffer_minutes: default_bike_buffer(),
            station_safety_buffer_minutes: default_station_safety_buffer(),
            prep_lead_time_minutes: default_prep_lead_time(),
            car_good_delta_minutes: default_car_good_delta(),
            default_planning_mode: default_planning_mode(),
        }
    }

    pub fn with_bike_buffer_minutes(mut self, minutes: i64) -> Self {
        self.bike_buffer_minutes = minutes;
        self
    }

    pub fn with_prep_lead_time_minutes(mut self, minutes: i64) -> Self {
        self.prep_lead_time_minutes = minutes;
        self
    }

    pub fn with_car_good_delta_minutes(mut self, minutes: i64) -> Self {
        self.car_good_delta_minutes = minutes;
        self
    }

    pub fn with_default_planning_mode(mut self, mode: PlanningMode) -> Self {
        self.default_planning_mode = mode;
        self
    }

    /// Origin address, destination address and boarding station for a direction.
    pub fn endpoints(&self, direction: Direction) -> (&str, &str, &str) {
        match direction {
            Direction::HomeToWork => (&self.home_address, &self.work_address, &self.home_station),
            Direction::WorkToHome => (&self.work_address, &self.home_address, &self.work_station),
        }
    }

    // Duration accessors clamp to `0..=MAX_PROFILE_MINUTES`.

    pub fn bike_buffer(&self) -> Duration {
        bounded_minutes(self.bike_buffer_minutes)
    }

    pub fn prep_lead_time(&self) -> Duration {
        bounded_minutes(self.prep_lead_time_minutes)
    }

    pub fn car_good_delta(&self) -> Duration {
        bounded_minutes(self.car_good_delta_minutes)
    }
}

fn bounded_minutes(minutes: i64) -> Duration {
    Duration::minutes(minutes.clamp(0, MAX_PROFILE_MINUTES))
}
