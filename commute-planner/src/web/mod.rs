//! Web layer for the commute planner.
//!
//! A JSON API over a single [`crate::dashboard::Dashboard`]: compute plans
//! and read or edit the saved profile.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
