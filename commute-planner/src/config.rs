//! Process configuration read from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::EtaCacheConfig;
use crate::domain::CommuteProfile;
use crate::planner::PlannerConfig;
use crate::sources::{OsrmConfig, TransitConfig};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Error in process configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set when COMMUTE_PROVIDERS=live")]
    Missing(&'static str),
}

/// Which time sources back the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderMode {
    /// Fixed offline values
    Mock,
    /// Routing and transit services over HTTP
    Live,
}

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub providers: ProviderMode,
    pub osrm: OsrmConfig,
    /// Present whenever `TRANSIT_URL` is set; required in live mode.
    pub transit: Option<TransitConfig>,
    /// JSON profile file; the profile lives in memory when unset.
    pub profile_path: Option<PathBuf>,
    pub eta_cache: EtaCacheConfig,
    pub planner: PlannerConfig,
    /// Profile adopted when none has been saved yet.
    pub default_profile: CommuteProfile,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup`, which returns a variable's value
    /// if it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bind_addr_text = var("COMMUTE_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr: SocketAddr = bind_addr_text
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                var: "COMMUTE_BIND_ADDR",
                value: bind_addr_text.clone(),
                reason: e.to_string(),
            })?;

        let providers = match var("COMMUTE_PROVIDERS").as_deref() {
            None | Some("mock") => ProviderMode::Mock,
            Some("live") => ProviderMode::Live,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "COMMUTE_PROVIDERS",
                    value: other.to_string(),
                    reason: "expected \"mock\" or \"live\"".to_string(),
                });
            }
        };

        let mut osrm = OsrmConfig::default();
        if let Some(url) = var("OSRM_URL") {
            osrm = osrm.with_routing_url(url);
        }
        if let Some(url) = var("NOMINATIM_URL") {
            osrm = osrm.with_geocoding_url(url);
        }

        let transit = var("TRANSIT_URL").map(|url| {
            let config = TransitConfig::new(url);
            match var("TRANSIT_API_KEY") {
                Some(key) => config.with_api_key(key),
                None => config,
            }
        });
        if providers == ProviderMode::Live && transit.is_none() {
            return Err(ConfigError::Missing("TRANSIT_URL"));
        }

        let mut eta_cache = EtaCacheConfig::default();
        if let Some(text) = var("ETA_CACHE_TTL_SECS") {
            let secs: u64 = text.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    var: "ETA_CACHE_TTL_SECS",
                    value: text.clone(),
                    reason: e.to_string(),
                }
            })?;
            eta_cache = eta_cache.with_ttl(Duration::from_secs(secs));
        }

        let default_profile = CommuteProfile::new(
            var("COMMUTE_HOME_ADDRESS").unwrap_or_else(|| "Home".into()),
            var("COMMUTE_WORK_ADDRESS").unwrap_or_else(|| "Work".into()),
            var("COMMUTE_HOME_STATION").unwrap_or_else(|| "Station 1".into()),
            var("COMMUTE_WORK_STATION").unwrap_or_else(|| "Station 2".into()),
            var("COMMUTE_TRAIN_LINE").unwrap_or_else(|| "Blue".into()),
        );

        Ok(Self {
            bind_addr,
            providers,
            osrm,
            transit,
            profile_path: var("COMMUTE_PROFILE_PATH").map(PathBuf::from),
            eta_cache,
            planner: PlannerConfig::default(),
            default_profile,
        })
    }
}
