//! Time sources consumed by the planner.
//!
//! Three independent capabilities, each with a live and a mock
//! implementation:
//! - driving ETAs (live: [`crate::cache::CachedDriving`] over an
//!   [`OsrmClient`]),
//! - train departures (live: [`TransitClient`]),
//! - cycling ETAs (live: [`OsrmClient`]).
//!
//! Mock implementations answer from fixed values, never fail, and exist so
//! the planner can be exercised without network access.

mod error;
mod mock;
mod osrm;
mod transit;

use std::future::Future;

use chrono::{DateTime, Duration, Utc};

use crate::domain::{Coordinates, Direction, TimeReference, TrainDeparture};

pub use error::SourceError;
pub use mock::{MockCycling, MockDriving, MockTransit};
pub use osrm::{OsrmClient, OsrmConfig};
pub use transit::{TransitClient, TransitConfig};

/// Driving-time lookups.
pub trait DrivingEta: Send + Sync {
    /// Expected driving time between two addresses around `reference`.
    fn driving_eta(
        &self,
        from: &str,
        to: &str,
        reference: TimeReference,
    ) -> impl Future<Output = Result<Duration, SourceError>> + Send;

    /// The "normal" driving time for a direction, used to judge traffic.
    fn baseline_driving_eta(
        &self,
        direction: Direction,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<Duration, SourceError>> + Send;
}

/// Train departure listings.
pub trait Departures: Send + Sync {
    /// Up to `limit` departures from `station` on `line` at or after
    /// `after`, ascending by departure time.
    fn next_departures(
        &self,
        station: &str,
        line: &str,
        after: DateTime<Utc>,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<TrainDeparture>, SourceError>> + Send;
}

/// Cycling-time lookups.
pub trait CyclingEta: Send + Sync {
    fn cycling_eta(
        &self,
        from: &str,
        to: &str,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<Duration, SourceError>> + Send;
}

/// A slow, rate-limited routing service that resolves addresses and
/// computes driving routes. Wrapped by [`crate::cache::CachedDriving`].
pub trait RoutingBackend: Send + Sync {
    fn resolve(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<Coordinates, SourceError>> + Send;

    fn route(
        &self,
        from: Coordinates,
        to: Coordinates,
        reference: TimeReference,
    ) -> impl Future<Output = Result<Duration, SourceError>> + Send;
}
