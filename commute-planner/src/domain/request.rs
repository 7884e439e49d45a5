//! A single planning query and the enums describing it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which way the traveler is commuting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    HomeToWork,
    WorkToHome,
}

/// Whether the target instant is a desired arrival or a desired departure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanningMode {
    ArriveBy,
    LeaveAt,
}

/// Which mode the traveler would like to use.
///
/// Informational only: the planner always computes both options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModePreference {
    Car,
    Multimodal,
    Auto,
}

/// Time anchor handed to a driving-ETA source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeReference {
    LeaveAt(DateTime<Utc>),
    ArriveBy(DateTime<Utc>),
}

impl TimeReference {
    /// The instant this reference points at, regardless of kind.
    pub fn instant(&self) -> DateTime<Utc> {
        match self {
            TimeReference::LeaveAt(at) | TimeReference::ArriveBy(at) => *at,
        }
    }
}

/// One planning query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripRequest {
    pub direction: Direction,
    pub mode_preference: ModePreference,
    pub planning_mode: PlanningMode,
    /// Desired arrival (arrive-by) or departure (leave-at) instant.
    pub target: DateTime<Utc>,
}

impl TripRequest {
    /// Create a new trip request.
    pub fn new(
        direction: Direction,
        mode_preference: ModePreference,
        planning_mode: PlanningMode,
        target: DateTime<Utc>,
    ) -> Self {
        Self {
            direction,
            mode_preference,
            planning_mode,
            target,
        }
    }

    /// The driving-ETA reference implied by the planning mode.
    pub fn time_reference(&self) -> TimeReference {
        match self.planning_mode {
            PlanningMode::ArriveBy => TimeReference::ArriveBy(self.target),
            PlanningMode::LeaveAt => TimeReference::LeaveAt(self.target),
        }
    }
}
