//! Data transfer objects for web requests and responses.

use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::dashboard::{RouteCard, route_cards};
use crate::domain::{
    AttemptTimes, CarOption, CommutePlan, Coordinates, Direction, PlanningMode, TrainDeparture,
};

/// Query for a plan. Omitted fields keep the dashboard's current controls,
/// except `target`, which defaults to an hour from now.
#[derive(Debug, Default, Deserialize)]
pub struct PlanQuery {
    pub direction: Option<Direction>,

    pub planning_mode: Option<PlanningMode>,

    /// Desired arrival or departure instant (RFC 3339)
    pub target: Option<DateTime<Utc>>,
}

/// A computed plan.
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub generated_at: DateTime<Utc>,

    /// Urgency state, e.g. "on_track" or "leave_now"
    pub state: &'static str,

    pub car: CarResult,

    pub train: TrainResult,

    /// Summary cards for display
    pub cards: Vec<RouteCard>,
}

/// Driving assessment.
#[derive(Debug, Serialize)]
pub struct CarResult {
    pub eta_minutes: i64,
    pub baseline_eta_minutes: i64,
    pub is_traffic_good: bool,
    pub reason: String,
}

/// Bike-to-train assessment.
#[derive(Debug, Serialize)]
pub struct TrainResult {
    pub selected: DepartureResult,
    pub fallback: Option<DepartureResult>,
    pub attempt_times: AttemptResult,
}

/// A train departure.
#[derive(Debug, Serialize)]
pub struct DepartureResult {
    pub trip_id: String,
    pub departure: DateTime<Utc>,
    pub arrival: DateTime<Utc>,
    pub delay_seconds: i64,
    pub platform: Option<String>,
}

/// When to get ready, when to leave, and when it is too late.
#[derive(Debug, Serialize)]
pub struct AttemptResult {
    pub get_ready_at: DateTime<Utc>,
    pub leave_at: DateTime<Utc>,
    pub too_late_at: DateTime<Utc>,
}

/// Edit of the saved addresses.
#[derive(Debug, Deserialize)]
pub struct AddressUpdate {
    pub home_address: String,
    pub work_address: String,
    #[serde(default)]
    pub home_coordinates: Option<Coordinates>,
    #[serde(default)]
    pub work_coordinates: Option<Coordinates>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl PlanResponse {
    /// Create from a domain plan, rendering card clock times in `tz`.
    pub fn from_plan<Tz>(plan: &CommutePlan, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let multimodal = plan.multimodal_option();
        Self {
            generated_at: plan.generated_at(),
            state: plan.state().as_str(),
            car: CarResult::from_car(plan.car_option()),
            train: TrainResult {
                selected: DepartureResult::from_departure(&multimodal.selected_train),
                fallback: multimodal
                    .fallback_train
                    .as_ref()
                    .map(DepartureResult::from_departure),
                attempt_times: AttemptResult::from_attempts(&multimodal.attempt_times),
            },
            cards: route_cards(plan, tz),
        }
    }
}

impl CarResult {
    pub fn from_car(car: &CarOption) -> Self {
        Self {
            eta_minutes: car.eta.num_minutes(),
            baseline_eta_minutes: car.baseline_eta.num_minutes(),
            is_traffic_good: car.is_traffic_good,
            reason: car.reason.clone(),
        }
    }
}

impl DepartureResult {
    pub fn from_departure(departure: &TrainDeparture) -> Self {
        Self {
            trip_id: departure.trip_id.clone(),
            departure: departure.departure,
            arrival: departure.arrival,
            delay_seconds: departure.delay_seconds,
            platform: departure.platform.clone(),
        }
    }
}

impl AttemptResult {
    pub fn from_attempts(attempts: &AttemptTimes) -> Self {
        Self {
            get_ready_at: attempts.get_ready_at,
            leave_at: attempts.leave_at,
            too_late_at: attempts.too_late_at,
        }
    }
}
