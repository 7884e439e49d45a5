//! Commute plan computation.
//!
//! Fans out to the three time sources concurrently, picks a train with the
//! feasibility rule, derives the attempt times and urgency state, and
//! judges traffic against the baseline.

use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::domain::{
    AttemptTimes, CarOption, CommutePlan, CommuteProfile, MultimodalOption, TripRequest,
};
use crate::sources::{CyclingEta, Departures, DrivingEta, SourceError};

use super::config::PlannerConfig;
use super::select::{candidates_for, first_feasible_train};

/// Error from commute planning.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The transit source had no usable departures
    #[error("no train data available")]
    NoTrainData,

    /// The driving source failed (only when not wrapped by the ETA cache)
    #[error("driving ETA unavailable: {0}")]
    Driving(#[source] SourceError),

    /// The departures source failed
    #[error("departures unavailable: {0}")]
    Transit(#[source] SourceError),

    /// The cycling source failed
    #[error("cycling ETA unavailable: {0}")]
    Cycling(#[source] SourceError),
}

/// Anything that can turn a profile and a trip request into a plan.
///
/// This is the whole outward surface of the engine.
pub trait CommutePlanner: Send + Sync {
    fn compute_plan(
        &self,
        profile: &CommuteProfile,
        request: &TripRequest,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<CommutePlan, PlanError>> + Send;
}

/// Commute planner over injected time sources.
pub struct Planner<D, T, C> {
    driving: D,
    transit: T,
    cycling: C,
    config: PlannerConfig,
}

impl<D: DrivingEta, T: Departures, C: CyclingEta> Planner<D, T, C> {
    /// Create a planner with the default configuration.
    pub fn new(driving: D, transit: T, cycling: C) -> Self {
        Self::with_config(driving, transit, cycling, PlannerConfig::default())
    }

    pub fn with_config(driving: D, transit: T, cycling: C, config: PlannerConfig) -> Self {
        Self {
            driving,
            transit,
            cycling,
            config,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Compute a fresh plan.
    ///
    /// All four lookups are in flight at once; the first failure drops the
    /// rest and fails the call. No partial plan is ever returned.
    pub async fn plan(
        &self,
        profile: &CommuteProfile,
        request: &TripRequest,
        now: DateTime<Utc>,
    ) -> Result<CommutePlan, PlanError> {
        let (from, to, station) = profile.endpoints(request.direction);
        let reference = request.time_reference();
        let margin = self.config.feasibility_margin();

        let (car_eta, baseline_eta, cycling_eta, mut departures) = tokio::try_join!(
            async {
                self.driving
                    .driving_eta(from, to, reference)
                    .await
                    .map_err(PlanError::Driving)
            },
            async {
                self.driving
                    .baseline_driving_eta(request.direction, now)
                    .await
                    .map_err(PlanError::Driving)
            },
            async {
                self.cycling
                    .cycling_eta(from, station, now)
                    .await
                    .map_err(PlanError::Cycling)
            },
            async {
                self.transit
                    .next_departures(station, &profile.train_line, now, self.config.departure_limit)
                    .await
                    .map_err(PlanError::Transit)
            },
        )?;

        let cycling_with_buffer = cycling_eta
            .checked_add(&profile.bike_buffer())
            .unwrap_or_else(Duration::max_value);

        departures.sort_by_key(|d| d.departure);
        if departures.is_empty() {
            return Err(PlanError::NoTrainData);
        }

        let (candidates, start) = candidates_for(request, &departures, now);
        debug!(
            station,
            departures = departures.len(),
            candidates = candidates.len(),
            "filtered train candidates"
        );

        let choice = first_feasible_train(&candidates, start, cycling_with_buffer, margin)
            .ok_or(PlanError::NoTrainData)?;

        let attempt_times = AttemptTimes::for_departure(
            choice.selected.departure,
            cycling_with_buffer,
            profile.prep_lead_time(),
            margin,
        );

        let car_option = CarOption::assess(car_eta, baseline_eta, profile.car_good_delta());

        let plan = CommutePlan::new(
            now,
            car_option,
            MultimodalOption {
                selected_train: choice.selected,
                attempt_times,
                fallback_train: choice.fallback,
            },
        );

        info!(
            train = %plan.multimodal_option().selected_train.trip_id,
            state = plan.state().as_str(),
            traffic_good = plan.car_option().is_traffic_good,
            "computed commute plan"
        );

        Ok(plan)
    }
}

impl<D: DrivingEta, T: Departures, C: CyclingEta> CommutePlanner for Planner<D, T, C> {
    fn compute_plan(
        &self,
        profile: &CommuteProfile,
        request: &TripRequest,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<CommutePlan, PlanError>> + Send {
        self.plan(profile, request, now)
    }
}
