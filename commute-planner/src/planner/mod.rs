//! Commute planning engine.
//!
//! Answers: "should I drive, or bike to the train, and when do I leave?"
//! The planner looks up driving, cycling and departure times concurrently,
//! selects the first train the traveler can still make, and derives the
//! urgency state from the resulting attempt times.

mod config;
mod engine;
mod select;

pub use config::PlannerConfig;
pub use engine::{CommutePlanner, PlanError, Planner};
pub use select::{TrainChoice, candidates_for, first_feasible_train};
