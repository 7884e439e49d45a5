//! Live routing client.
//!
//! Resolves free-text addresses through a Nominatim-compatible `/search`
//! endpoint and computes travel times through an OSRM-compatible
//! `/route/v1/{profile}` endpoint. Serves as the live driving backend
//! behind the ETA cache and as the live cycling source.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::domain::{Coordinates, TimeReference};

use super::error::SourceError;
use super::{CyclingEta, RoutingBackend};

/// Default base URL for route computation.
const DEFAULT_ROUTING_URL: &str = "https://router.project-osrm.org";

/// Default base URL for address resolution.
const DEFAULT_GEOCODING_URL: &str = "https://nominatim.openstreetmap.org";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 2;

/// Configuration for the routing client.
#[derive(Debug, Clone)]
pub struct OsrmConfig {
    /// Base URL for route requests
    pub routing_url: String,
    /// Base URL for address search
    pub geocoding_url: String,
    /// User agent sent with every request (required by public geocoders)
    pub user_agent: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl OsrmConfig {
    pub fn new() -> Self {
        Self {
            routing_url: DEFAULT_ROUTING_URL.to_string(),
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
            user_agent: concat!("commute-planner/", env!("CARGO_PKG_VERSION")).to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 15,
        }
    }

    pub fn with_routing_url(mut self, url: impl Into<String>) -> Self {
        self.routing_url = url.into();
        self
    }

    pub fn with_geocoding_url(mut self, url: impl Into<String>) -> Self {
        self.geocoding_url = url.into();
        self
    }

    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    code: String,
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
struct Route {
    /// Travel time in seconds.
    duration: f64,
}

/// Routing and geocoding HTTP client.
///
/// A semaphore bounds concurrent requests; public instances of both
/// services rate-limit aggressively.
#[derive(Debug, Clone)]
pub struct OsrmClient {
    http: reqwest::Client,
    routing_url: String,
    geocoding_url: String,
    semaphore: Arc<Semaphore>,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            routing_url: config.routing_url.trim_end_matches('/').to_string(),
            geocoding_url: config.geocoding_url.trim_end_matches('/').to_string(),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
        })
    }

    /// Resolve a free-text address to coordinates.
    pub async fn geocode(&self, address: &str) -> Result<Coordinates, SourceError> {
        let url = format!("{}/search", self.geocoding_url);
        let request = self
            .http
            .get(&url)
            .query(&[("q", address), ("format", "json"), ("limit", "1")]);

        let places: Vec<Place> = self.get_json(request).await?;
        first_place(places, address)
    }

    /// Travel time between two points for an OSRM profile
    /// (`driving`, `cycling`, ...).
    pub async fn travel_time(
        &self,
        profile: &str,
        from: Coordinates,
        to: Coordinates,
    ) -> Result<Duration, SourceError> {
        let url = route_url(&self.routing_url, profile, from, to);
        let request = self.http.get(&url).query(&[("overview", "false")]);

        let response: RouteResponse = self.get_json(request).await?;
        route_duration(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, SourceError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| SourceError::Api {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(SourceError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimited("routing"));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| SourceError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })
    }
}

fn route_url(base: &str, profile: &str, from: Coordinates, to: Coordinates) -> String {
    // OSRM takes longitude first.
    format!(
        "{}/route/v1/{}/{},{};{},{}",
        base, profile, from.longitude, from.latitude, to.longitude, to.latitude
    )
}

fn first_place(places: Vec<Place>, address: &str) -> Result<Coordinates, SourceError> {
    let place = places
        .into_iter()
        .next()
        .ok_or_else(|| SourceError::UnresolvedAddress(address.to_string()))?;

    let parse = |value: &str| {
        value.parse::<f64>().map_err(|e| SourceError::Json {
            message: format!("invalid coordinate {value:?}: {e}"),
            body: None,
        })
    };

    Ok(Coordinates::new(parse(&place.lat)?, parse(&place.lon)?))
}

/// Longest route duration accepted from the routing service.
const MAX_ROUTE_SECONDS: i64 = 7 * 24 * 60 * 60;

fn route_duration(response: RouteResponse) -> Result<Duration, SourceError> {
    if response.code != "Ok" {
        return Err(SourceError::NoRoute);
    }

    let route = response.routes.first().ok_or(SourceError::NoRoute)?;
    let seconds = route.duration.round();
    if !(0.0..=MAX_ROUTE_SECONDS as f64).contains(&seconds) {
        return Err(SourceError::Json {
            message: format!("route duration {} out of range", route.duration),
            body: None,
        });
    }
    Ok(Duration::seconds(seconds as i64))
}

impl RoutingBackend for OsrmClient {
    async fn resolve(&self, address: &str) -> Result<Coordinates, SourceError> {
        self.geocode(address).await
    }

    async fn route(
        &self,
        from: Coordinates,
        to: Coordinates,
        reference: TimeReference,
    ) -> Result<Duration, SourceError> {
        // OSRM has no time-dependent routing; the reference only keys the cache.
        debug!(?reference, "requesting driving route");
        self.travel_time("driving", from, to).await
    }
}

impl CyclingEta for OsrmClient {
    async fn cycling_eta(
        &self,
        from: &str,
        to: &str,
        _at: DateTime<Utc>,
    ) -> Result<Duration, SourceError> {
        let (from, to) = tokio::try_join!(self.geocode(from), self.geocode(to))?;
        self.travel_time("cycling", from, to).await
    }
}
