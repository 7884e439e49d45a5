use chrono::{Duration, Utc};
use tracing::info;
use tracing_subscriber::EnvFilter;

use commute_planner::cache::CachedDriving;
use commute_planner::config::{AppConfig, ProviderMode};
use commute_planner::dashboard::Dashboard;
use commute_planner::notify::LogNotifier;
use commute_planner::planner::{CommutePlanner, Planner};
use commute_planner::profile::{
    InMemoryProfileStore, JsonProfileStore, ProfileStore, ProfileStoreConfig,
};
use commute_planner::sources::{MockCycling, MockDriving, MockTransit, OsrmClient, TransitClient};
use commute_planner::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    match config.profile_path.clone() {
        Some(path) => {
            info!(path = %path.display(), "storing commute profile on disk");
            let store = JsonProfileStore::new(ProfileStoreConfig::new(path));
            with_store(config, store).await;
        }
        None => {
            info!("storing commute profile in memory");
            with_store(config, InMemoryProfileStore::default()).await;
        }
    }
}

/// Build the planner for the configured providers.
async fn with_store<S: ProfileStore + 'static>(config: AppConfig, store: S) {
    match config.providers {
        ProviderMode::Mock => {
            info!("using mock time sources");
            let planner = Planner::with_config(
                MockDriving::default(),
                MockTransit::sample(Utc::now()),
                MockCycling::default(),
                config.planner.clone(),
            );
            serve(config, planner, store).await;
        }
        ProviderMode::Live => {
            let routing =
                OsrmClient::new(config.osrm.clone()).expect("Failed to create routing client");
            let transit_config = config
                .transit
                .clone()
                .expect("TRANSIT_URL is checked when loading config");
            let transit =
                TransitClient::new(transit_config).expect("Failed to create transit client");
            info!(
                routing_url = %config.osrm.routing_url,
                geocoding_url = %config.osrm.geocoding_url,
                "using live time sources"
            );

            let driving = CachedDriving::new(routing.clone(), &config.eta_cache);
            let planner = Planner::with_config(driving, transit, routing, config.planner.clone());
            serve(config, planner, store).await;
        }
    }
}

async fn serve<P, S>(config: AppConfig, planner: P, store: S)
where
    P: CommutePlanner + 'static,
    S: ProfileStore + 'static,
{
    let mut dashboard = Dashboard::new(
        planner,
        store,
        LogNotifier::new(),
        Utc::now() + Duration::hours(1),
    );
    dashboard
        .bootstrap(config.default_profile.clone())
        .await
        .expect("Failed to load commute profile");

    let app = create_router(AppState::new(dashboard));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind listen address");
    info!(addr = %config.bind_addr, "commute planner listening");
    info!("  GET  /health             - Health check");
    info!("  GET  /plan               - Compute a commute plan");
    info!("  GET  /profile            - Read the saved profile");
    info!("  PUT  /profile            - Replace the saved profile");
    info!("  PUT  /profile/addresses  - Edit home and work addresses");

    axum::serve(listener, app).await.expect("Server error");
}
