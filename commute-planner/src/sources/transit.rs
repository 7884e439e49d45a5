//! Live departures client.
//!
//! Queries a departures endpoint of the form
//! `GET {base}/departures?station=&line=&after=&limit=` returning
//! `{"departures": [{"trip_id", "departure", "arrival", "delay_secs", "platform"}]}`
//! with RFC 3339 instants.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::domain::TrainDeparture;

use super::Departures;
use super::error::SourceError;

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Configuration for the departures client.
#[derive(Debug, Clone)]
pub struct TransitConfig {
    /// Base URL for the departures API
    pub base_url: String,
    /// Optional API key sent as `x-apikey`
    pub api_key: Option<String>,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl TransitConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 30,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
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

#[derive(Debug, Deserialize)]
struct DeparturesResponse {
    #[serde(default)]
    departures: Vec<DepartureDto>,
}

#[derive(Debug, Deserialize)]
struct DepartureDto {
    trip_id: String,
    departure: DateTime<Utc>,
    arrival: DateTime<Utc>,
    #[serde(default)]
    delay_secs: i64,
    platform: Option<String>,
}

impl From<DepartureDto> for TrainDeparture {
    fn from(dto: DepartureDto) -> Self {
        TrainDeparture {
            trip_id: dto.trip_id,
            departure: dto.departure,
            arrival: dto.arrival,
            delay_seconds: dto.delay_secs,
            platform: dto.platform,
        }
    }
}

/// Departures HTTP client.
#[derive(Debug, Clone)]
pub struct TransitClient {
    http: reqwest::Client,
    base_url: String,
    semaphore: Arc<Semaphore>,
}

impl TransitClient {
    pub fn new(config: TransitConfig) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();

        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key).map_err(|_| SourceError::Api {
                status: 0,
                message: "Invalid API key format".to_string(),
            })?;
            headers.insert("x-apikey", value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
        })
    }
}

impl Departures for TransitClient {
    async fn next_departures(
        &self,
        station: &str,
        line: &str,
        after: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<TrainDeparture>, SourceError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| SourceError::Api {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        let url = format!("{}/departures", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("station", station.to_string()),
                ("line", line.to_string()),
                ("after", after.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ("limit", limit.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(SourceError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimited("transit"));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        let departures = parse_departures(&body, limit)?;
        debug!(station, line, count = departures.len(), "fetched departures");
        Ok(departures)
    }
}

/// Decode a departures body, sorted ascending and truncated to `limit`.
fn parse_departures(body: &str, limit: usize) -> Result<Vec<TrainDeparture>, SourceError> {
    let response: DeparturesResponse =
        serde_json::from_str(body).map_err(|e| SourceError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })?;

    let mut departures: Vec<TrainDeparture> =
        response.departures.into_iter().map(Into::into).collect();
    departures.sort_by_key(|d| d.departure);
    departures.truncate(limit);
    Ok(departures)
}
