//! Presentation adapter between the planner and a user-facing surface.
//!
//! A [`Dashboard`] holds the traveler's profile, the query controls
//! (direction, planning mode, target instant) and the outcome of the last
//! refresh. It owns no planning logic of its own.

use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{
    CommutePlan, CommuteProfile, Coordinates, Direction, ModePreference, PlanningMode,
    TripRequest,
};
use crate::notify::NotificationScheduler;
use crate::planner::{CommutePlanner, PlanError};
use crate::profile::{ProfileError, ProfileStore};

/// Minutes added to the selected train when there is no fallback to show.
const ALTERNATIVE_ROUTE_PENALTY_MINUTES: i64 = 8;

/// Outcome of the most recent refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded(CommutePlan),
    Failed(String),
}

/// Error from a dashboard operation.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// No profile has been bootstrapped or saved yet
    #[error("Missing commute profile")]
    MissingProfile,

    #[error("Failed to compute commute plan")]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Profile(#[from] ProfileError),
}

/// One summary card for a route option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteCard {
    pub id: &'static str,
    pub title: String,
    pub subtitle: String,
    pub detail: String,
    pub eta_minutes: i64,
}

/// View state for one traveler.
pub struct Dashboard<P, S, N> {
    planner: P,
    store: S,
    notifier: N,
    profile: Option<CommuteProfile>,
    load_state: LoadState,
    pub planning_mode: PlanningMode,
    pub direction: Direction,
    pub target: DateTime<Utc>,
}

impl<P, S, N> Dashboard<P, S, N>
where
    P: CommutePlanner,
    S: ProfileStore,
    N: NotificationScheduler,
{
    /// Create a dashboard planning home-to-work, arriving by `target`.
    pub fn new(planner: P, store: S, notifier: N, target: DateTime<Utc>) -> Self {
        Self {
            planner,
            store,
            notifier,
            profile: None,
            load_state: LoadState::Idle,
            planning_mode: PlanningMode::ArriveBy,
            direction: Direction::HomeToWork,
            target,
        }
    }

    /// Adopt the stored profile, or save and adopt `default_profile` when
    /// nothing is stored. The planning mode follows the adopted profile.
    pub async fn bootstrap(
        &mut self,
        default_profile: CommuteProfile,
    ) -> Result<(), ProfileError> {
        let profile = match self.store.load_profile().await? {
            Some(saved) => saved,
            None => {
                info!("no saved commute profile, using default");
                self.store.save_profile(&default_profile).await?;
                default_profile
            }
        };

        self.planning_mode = profile.default_planning_mode;
        self.profile = Some(profile);
        Ok(())
    }

    /// Compute a plan for the current controls.
    ///
    /// The outcome is also recorded in [`Self::load_state`]. A successful
    /// plan is handed to the notifier.
    pub async fn refresh_plan(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<CommutePlan, DashboardError> {
        let Some(profile) = self.profile.as_ref() else {
            let error = DashboardError::MissingProfile;
            self.load_state = LoadState::Failed(error.to_string());
            return Err(error);
        };

        self.load_state = LoadState::Loading;
        let request = TripRequest::new(
            self.direction,
            ModePreference::Auto,
            self.planning_mode,
            self.target,
        );

        match self.planner.compute_plan(profile, &request, now).await {
            Ok(plan) => {
                self.load_state = LoadState::Loaded(plan.clone());
                self.notifier.schedule(&plan, &request).await;
                Ok(plan)
            }
            Err(e) => {
                warn!(error = %e, "commute planning failed");
                let error = DashboardError::Plan(e);
                self.load_state = LoadState::Failed(error.to_string());
                Err(error)
            }
        }
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn current_profile(&self) -> Option<&CommuteProfile> {
        self.profile.as_ref()
    }

    /// Replace the profile wholesale and persist it.
    pub async fn set_profile(&mut self, profile: CommuteProfile) -> Result<(), ProfileError> {
        self.store.save_profile(&profile).await?;
        self.planning_mode = profile.default_planning_mode;
        self.profile = Some(profile);
        Ok(())
    }

    /// Edit the addresses and coordinates of the current profile and persist it.
    pub async fn update_addresses(
        &mut self,
        home_address: String,
        work_address: String,
        home_coordinates: Option<Coordinates>,
        work_coordinates: Option<Coordinates>,
    ) -> Result<&CommuteProfile, DashboardError> {
        let mut profile = self
            .profile
            .clone()
            .ok_or(DashboardError::MissingProfile)?;

        profile.home_address = home_address;
        profile.work_address = work_address;
        profile.home_coordinates = home_coordinates;
        profile.work_coordinates = work_coordinates;

        self.store.save_profile(&profile).await?;
        Ok(&*self.profile.insert(profile))
    }
}

/// Summary cards for a plan: the car, the selected train, and the
/// alternative. Clock times are rendered in `tz`.
pub fn route_cards<Tz>(plan: &CommutePlan, tz: &Tz) -> Vec<RouteCard>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let car = plan.car_option();
    let multimodal = plan.multimodal_option();
    let selected = &multimodal.selected_train;
    let minutes_until = |at: DateTime<Utc>| (at - plan.generated_at()).num_minutes();
    let clock = |at: DateTime<Utc>| at.with_timezone(tz).format("%H:%M").to_string();

    let (alternative_subtitle, alternative_eta) = match &multimodal.fallback_train {
        Some(fallback) => (
            format!("Fallback {}", fallback.trip_id),
            minutes_until(fallback.arrival),
        ),
        None => (
            "Alternative route".to_string(),
            minutes_until(selected.arrival) + ALTERNATIVE_ROUTE_PENALTY_MINUTES,
        ),
    };

    vec![
        RouteCard {
            id: "car",
            title: "Car".to_string(),
            subtitle: if car.is_traffic_good {
                "Traffic is good"
            } else {
                "Traffic is heavy"
            }
            .to_string(),
            detail: car.reason.clone(),
            eta_minutes: car.eta.num_minutes(),
        },
        RouteCard {
            id: "train",
            title: "Bike and train".to_string(),
            subtitle: format!("Train {}", selected.trip_id),
            detail: format!("Depart {}", clock(selected.departure)),
            eta_minutes: minutes_until(selected.arrival),
        },
        RouteCard {
            id: "alternative",
            title: "Alternative".to_string(),
            subtitle: alternative_subtitle,
            detail: format!("Too late at {}", clock(multimodal.attempt_times.too_late_at)),
            eta_minutes: alternative_eta,
        },
    ]
}
