//! Commute profile persistence.
//!
//! The planner never touches storage; the dashboard loads a profile here
//! and hands it to the planner per call.

mod error;
mod json;
mod memory;

use std::future::Future;

use crate::domain::CommuteProfile;

pub use error::ProfileError;
pub use json::{JsonProfileStore, ProfileStoreConfig};
pub use memory::InMemoryProfileStore;

/// Load and save the traveler's single commute profile.
pub trait ProfileStore: Send + Sync {
    /// The saved profile, or `None` if nothing has been saved yet.
    fn load_profile(
        &self,
    ) -> impl Future<Output = Result<Option<CommuteProfile>, ProfileError>> + Send;

    fn save_profile(
        &self,
        profile: &CommuteProfile,
    ) -> impl Future<Output = Result<(), ProfileError>> + Send;
}
