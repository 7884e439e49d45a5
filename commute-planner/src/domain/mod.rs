//! Domain types for the commute planner.
//!
//! This module contains the value records the planner works with: the
//! traveler's saved commute, one planning query, the train departures a
//! transit source reports, and the immutable plan produced for a query.

mod departure;
mod plan;
mod profile;
mod request;

pub use departure::TrainDeparture;
pub use plan::{AttemptTimes, CarOption, CommutePlan, CommuteState, MultimodalOption};
pub use profile::{CommuteProfile, Coordinates, MAX_PROFILE_MINUTES};
pub use request::{Direction, ModePreference, PlanningMode, TimeReference, TripRequest};
