//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use chrono::{Duration, Local, Utc};
use tracing::{error, warn};

use crate::dashboard::DashboardError;
use crate::domain::{CommuteProfile, MAX_PROFILE_MINUTES};
use crate::notify::NotificationScheduler;
use crate::planner::{CommutePlanner, PlanError};
use crate::profile::{ProfileError, ProfileStore};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router<P, S, N>(state: AppState<P, S, N>) -> Router
where
    P: CommutePlanner + 'static,
    S: ProfileStore + 'static,
    N: NotificationScheduler + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/plan", get(plan::<P, S, N>))
        .route(
            "/profile",
            get(get_profile::<P, S, N>).put(put_profile::<P, S, N>),
        )
        .route("/profile/addresses", put(put_addresses::<P, S, N>))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Compute a plan for the query, falling back to the dashboard's controls.
async fn plan<P, S, N>(
    State(state): State<AppState<P, S, N>>,
    Query(query): Query<PlanQuery>,
) -> Result<Json<PlanResponse>, AppError>
where
    P: CommutePlanner,
    S: ProfileStore,
    N: NotificationScheduler,
{
    let now = Utc::now();
    let mut dashboard = state.dashboard.lock().await;

    if let Some(direction) = query.direction {
        dashboard.direction = direction;
    }
    if let Some(mode) = query.planning_mode {
        dashboard.planning_mode = mode;
    }
    dashboard.target = query.target.unwrap_or(now + Duration::hours(1));

    let plan = dashboard.refresh_plan(now).await?;

    Ok(Json(PlanResponse::from_plan(&plan, &Local)))
}

async fn get_profile<P, S, N>(
    State(state): State<AppState<P, S, N>>,
) -> Result<Json<CommuteProfile>, AppError>
where
    P: CommutePlanner,
    S: ProfileStore,
    N: NotificationScheduler,
{
    let dashboard = state.dashboard.lock().await;
    dashboard
        .current_profile()
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound {
            message: DashboardError::MissingProfile.to_string(),
        })
}

/// Replace the saved profile.
async fn put_profile<P, S, N>(
    State(state): State<AppState<P, S, N>>,
    Json(profile): Json<CommuteProfile>,
) -> Result<Json<CommuteProfile>, AppError>
where
    P: CommutePlanner,
    S: ProfileStore,
    N: NotificationScheduler,
{
    validate_profile(&profile)?;

    let mut dashboard = state.dashboard.lock().await;
    dashboard.set_profile(profile.clone()).await?;

    Ok(Json(profile))
}

/// Edit the saved addresses, keeping every other setting.
async fn put_addresses<P, S, N>(
    State(state): State<AppState<P, S, N>>,
    Json(update): Json<AddressUpdate>,
) -> Result<Json<CommuteProfile>, AppError>
where
    P: CommutePlanner,
    S: ProfileStore,
    N: NotificationScheduler,
{
    require_non_empty("home_address", &update.home_address)?;
    require_non_empty("work_address", &update.work_address)?;

    let mut dashboard = state.dashboard.lock().await;
    let profile = dashboard
        .update_addresses(
            update.home_address,
            update.work_address,
            update.home_coordinates,
            update.work_coordinates,
        )
        .await?;

    Ok(Json(profile.clone()))
}

fn validate_profile(profile: &CommuteProfile) -> Result<(), AppError> {
    require_non_empty("home_address", &profile.home_address)?;
    require_non_empty("work_address", &profile.work_address)?;
    require_non_empty("home_station", &profile.home_station)?;
    require_non_empty("work_station", &profile.work_station)?;
    require_non_empty("train_line", &profile.train_line)?;

    let minutes = [
        ("bike_buffer_minutes", profile.bike_buffer_minutes),
        (
            "station_safety_buffer_minutes",
            profile.station_safety_buffer_minutes,
        ),
        ("prep_lead_time_minutes", profile.prep_lead_time_minutes),
        ("car_good_delta_minutes", profile.car_good_delta_minutes),
    ];
    for (field, value) in minutes {
        if value < 0 {
            return Err(AppError::BadRequest {
                message: format!("{field} must not be negative"),
            });
        }
        if value > MAX_PROFILE_MINUTES {
            return Err(AppError::BadRequest {
                message: format!("{field} must be at most {MAX_PROFILE_MINUTES} minutes"),
            });
        }
    }

    Ok(())
}

fn require_non_empty(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest {
            message: format!("{field} must not be empty"),
        });
    }
    Ok(())
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    /// An upstream time source failed
    BadGateway { message: String },
    /// No train data to plan with
    Unavailable { message: String },
    Internal { message: String },
}

impl From<DashboardError> for AppError {
    fn from(e: DashboardError) -> Self {
        let message = match &e {
            DashboardError::Plan(source) => format!("{e}: {source}"),
            _ => e.to_string(),
        };

        match e {
            DashboardError::MissingProfile => AppError::NotFound { message },
            DashboardError::Plan(PlanError::NoTrainData) => AppError::Unavailable { message },
            DashboardError::Plan(_) => AppError::BadGateway { message },
            DashboardError::Profile(_) => AppError::Internal { message },
        }
    }
}

impl From<ProfileError> for AppError {
    fn from(e: ProfileError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            AppError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::BadRequest { message }
            | AppError::NotFound { message }
            | AppError::BadGateway { message }
            | AppError::Unavailable { message }
            | AppError::Internal { message } => message,
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::Dashboard;
    use crate::domain::{Direction, PlanningMode};
    use crate::notify::NoopNotifier;
    use crate::planner::Planner;
    use crate::profile::InMemoryProfileStore;
    use crate::sources::{MockCycling, MockDriving, MockTransit};

    type MockPlanner = Planner<MockDriving, MockTransit, MockCycling>;
    type MockState = AppState<MockPlanner, InMemoryProfileStore, NoopNotifier>;

    fn profile() -> CommuteProfile {
        CommuteProfile::new("Home", "Work", "Station 1", "Station 2", "Blue")
    }

    async fn state_with(transit: MockTransit, profile: Option<CommuteProfile>) -> MockState {
        let planner = Planner::new(MockDriving::default(), transit, MockCycling::default());
        let mut dashboard = Dashboard::new(
            planner,
            InMemoryProfileStore::default(),
            NoopNotifier,
            Utc::now(),
        );
        if let Some(profile) = profile {
            dashboard.bootstrap(profile).await.unwrap();
        }
        AppState::new(dashboard)
    }

    async fn sample_state() -> MockState {
        state_with(MockTransit::sample(Utc::now()), Some(profile())).await
    }

    #[tokio::test]
    async fn health_is_ok() {
        assert_eq!(health().await, "ok");
    }

    #[tokio::test]
    async fn plan_returns_selected_train_and_cards() {
        let state = sample_state().await;

        let Json(response) = plan(State(state), Query(PlanQuery::default()))
            .await
            .unwrap();

        assert_eq!(response.train.selected.trip_id, "T-002");
        assert!(response.train.fallback.is_none());
        assert!(response.car.is_traffic_good);
        assert_eq!(response.cards.len(), 3);
        assert_eq!(response.cards[2].subtitle, "Alternative route");
    }

    #[tokio::test]
    async fn plan_query_updates_dashboard_controls() {
        let state = sample_state().await;
        let target = Utc::now() + Duration::minutes(10);
        let query = PlanQuery {
            direction: Some(Direction::WorkToHome),
            planning_mode: Some(PlanningMode::LeaveAt),
            target: Some(target),
        };

        let Json(response) = plan(State(state.clone()), Query(query)).await.unwrap();

        // Leaving in ten minutes: T-001 at +12 is the first departure after
        // the target, but 13 minutes of cycling rules it out.
        assert_eq!(response.train.selected.trip_id, "T-002");

        let dashboard = state.dashboard.lock().await;
        assert_eq!(dashboard.direction, Direction::WorkToHome);
        assert_eq!(dashboard.planning_mode, PlanningMode::LeaveAt);
        assert_eq!(dashboard.target, target);
    }

    #[tokio::test]
    async fn plan_without_trains_is_unavailable() {
        let state = state_with(MockTransit::default(), Some(profile())).await;

        let err = plan(State(state), Query(PlanQuery::default()))
            .await
            .unwrap_err();

        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn plan_without_profile_is_not_found() {
        let state = state_with(MockTransit::sample(Utc::now()), None).await;

        let err = plan(State(state), Query(PlanQuery::default()))
            .await
            .unwrap_err();

        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn profile_round_trip_through_handlers() {
        let state = sample_state().await;

        let replacement = CommuteProfile::new("Flat 2", "Lab", "North", "South", "Red")
            .with_default_planning_mode(PlanningMode::LeaveAt);
        put_profile(State(state.clone()), Json(replacement.clone()))
            .await
            .unwrap();

        let Json(current) = get_profile(State(state.clone())).await.unwrap();
        assert_eq!(current, replacement);
        assert_eq!(
            state.dashboard.lock().await.planning_mode,
            PlanningMode::LeaveAt
        );
    }

    #[tokio::test]
    async fn invalid_profile_is_rejected() {
        let state = sample_state().await;
        let invalid = profile().with_bike_buffer_minutes(-1);

        let err = put_profile(State(state.clone()), Json(invalid))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let Json(current) = get_profile(State(state)).await.unwrap();
        assert_eq!(current, profile());
    }

    #[tokio::test]
    async fn oversized_minutes_are_rejected_and_plans_still_work() {
        let state = sample_state().await;
        let invalid = profile().with_prep_lead_time_minutes(100_000_000_000_000);

        let err = put_profile(State(state.clone()), Json(invalid))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let Json(current) = get_profile(State(state.clone())).await.unwrap();
        assert_eq!(current, profile());

        let Json(response) = plan(State(state), Query(PlanQuery::default()))
            .await
            .unwrap();
        assert_eq!(response.train.selected.trip_id, "T-002");
    }

    #[tokio::test]
    async fn a_full_day_is_the_largest_accepted_value() {
        let state = sample_state().await;

        let day = profile().with_car_good_delta_minutes(MAX_PROFILE_MINUTES);
        put_profile(State(state.clone()), Json(day)).await.unwrap();

        let over = profile().with_car_good_delta_minutes(MAX_PROFILE_MINUTES + 1);
        let err = put_profile(State(state), Json(over)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn get_profile_before_bootstrap_is_not_found() {
        let state = state_with(MockTransit::default(), None).await;

        let err = get_profile(State(state)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn addresses_update_keeps_other_settings() {
        let state = sample_state().await;
        let update = AddressUpdate {
            home_address: "1 New St".into(),
            work_address: "2 Old Rd".into(),
            home_coordinates: None,
            work_coordinates: None,
        };

        let Json(updated) = put_addresses(State(state), Json(update)).await.unwrap();

        assert_eq!(updated.home_address, "1 New St");
        assert_eq!(updated.work_address, "2 Old Rd");
        assert_eq!(updated.train_line, "Blue");
    }

    #[tokio::test]
    async fn blank_address_is_rejected() {
        let state = sample_state().await;
        let update = AddressUpdate {
            home_address: "  ".into(),
            work_address: "2 Old Rd".into(),
            home_coordinates: None,
            work_coordinates: None,
        };

        let err = put_addresses(State(state), Json(update)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn planning_failures_map_to_gateway_errors() {
        let source = crate::sources::SourceError::Unauthorized;
        let err = AppError::from(DashboardError::Plan(PlanError::Transit(source)));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);

        let err = AppError::from(DashboardError::Plan(PlanError::NoTrainData));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
