//! Caching layer in front of the live driving backend.
//!
//! Routing lookups are slow and rate-limited, and a planning call should
//! never fail because of them. Two memo tables sit in front of the backend:
//!
//! - resolved addresses, keyed by trimmed lowercase text and kept for the
//!   life of the cache (addresses are stable for a session);
//! - driving ETAs, keyed by (from, to, minute bucket of the reference
//!   instant, reference kind) and considered fresh for a TTL.
//!
//! When the backend fails, the latest known-good ETA is returned and stored
//! under the requested key instead of propagating the error.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use moka::future::Cache as MokaCache;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::domain::{Coordinates, Direction, TimeReference};
use crate::sources::{DrivingEta, RoutingBackend, SourceError};

/// Configuration for the ETA cache.
#[derive(Debug, Clone)]
pub struct EtaCacheConfig {
    /// How long a cached ETA stays fresh.
    pub ttl: StdDuration,

    /// Width of a reference-time bucket in seconds.
    pub bucket_secs: i64,

    /// Fallback ETA before any live lookup has succeeded.
    pub initial_eta: Duration,
}

impl EtaCacheConfig {
    pub fn with_ttl(mut self, ttl: StdDuration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_initial_eta(mut self, eta: Duration) -> Self {
        self.initial_eta = eta;
        self
    }
}

impl Default for EtaCacheConfig {
    fn default() -> Self {
        Self {
            ttl: StdDuration::from_secs(45),
            bucket_secs: 60,
            initial_eta: Duration::minutes(35),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ReferenceKind {
    LeaveAt,
    ArriveBy,
}

/// Cache key for driving ETAs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RouteKey {
    from: String,
    to: String,
    bucket: i64,
    kind: ReferenceKind,
}

#[derive(Debug, Clone, Copy)]
struct CachedEta {
    value: Duration,
    cached_at: Instant,
}

/// ETA entries and the fallback value, guarded together.
#[derive(Debug)]
struct EtaTable {
    entries: HashMap<RouteKey, CachedEta>,
    latest_good: Duration,
}

/// Trimmed, lowercased address text.
fn normalize(address: &str) -> String {
    address.trim().to_lowercase()
}

/// Driving-ETA source that memoizes a live [`RoutingBackend`] and absorbs
/// its failures.
///
/// Safe to share between concurrent planning calls. The ETA table and the
/// fallback value sit behind one lock, which is never held across a backend
/// request; a slow lookup only delays its own caller.
pub struct CachedDriving<B> {
    backend: B,

    /// Resolved addresses. Unbounded and never expired.
    addresses: MokaCache<String, Coordinates>,

    table: Mutex<EtaTable>,

    ttl: StdDuration,
    bucket_secs: i64,
}

impl<B: RoutingBackend> CachedDriving<B> {
    pub fn new(backend: B, config: &EtaCacheConfig) -> Self {
        Self {
            backend,
            addresses: MokaCache::builder().build(),
            table: Mutex::new(EtaTable {
                entries: HashMap::new(),
                latest_good: config.initial_eta,
            }),
            ttl: config.ttl,
            bucket_secs: config.bucket_secs.max(1),
        }
    }

    fn route_key(&self, from: &str, to: &str, reference: TimeReference) -> RouteKey {
        let kind = match reference {
            TimeReference::LeaveAt(_) => ReferenceKind::LeaveAt,
            TimeReference::ArriveBy(_) => ReferenceKind::ArriveBy,
        };

        RouteKey {
            from: normalize(from),
            to: normalize(to),
            bucket: reference.instant().timestamp().div_euclid(self.bucket_secs),
            kind,
        }
    }

    /// Driving ETA between two addresses. Never fails.
    pub async fn car_eta(&self, from: &str, to: &str, reference: TimeReference) -> Duration {
        let requested_at = Instant::now();
        let key = self.route_key(from, to, reference);

        {
            let mut table = self.table.lock().await;
            if let Some(cached) = table.entries.get(&key).copied() {
                if requested_at.duration_since(cached.cached_at) <= self.ttl {
                    debug!(
                        from,
                        to,
                        eta_secs = cached.value.num_seconds(),
                        "driving ETA cache hit"
                    );
                    table.latest_good = cached.value;
                    return cached.value;
                }
            }
        }

        let fetched = self.fetch(from, to, reference).await;

        let mut table = self.table.lock().await;
        let value = match fetched {
            Ok(eta) => {
                debug!(from, to, eta_secs = eta.num_seconds(), "fetched live driving ETA");
                table.latest_good = eta;
                eta
            }
            Err(err) => {
                warn!(
                    from,
                    to,
                    error = %err,
                    fallback_secs = table.latest_good.num_seconds(),
                    "live driving ETA unavailable, using latest known value"
                );
                table.latest_good
            }
        };

        table.entries.insert(
            key,
            CachedEta {
                value,
                cached_at: requested_at,
            },
        );

        value
    }

    /// The most recent ETA obtained from the cache or the backend.
    pub async fn latest_known_eta(&self) -> Duration {
        self.table.lock().await.latest_good
    }

    async fn fetch(
        &self,
        from: &str,
        to: &str,
        reference: TimeReference,
    ) -> Result<Duration, Arc<SourceError>> {
        let (source, destination) = tokio::try_join!(self.resolve(from), self.resolve(to))?;
        self.backend
            .route(source, destination, reference)
            .await
            .map_err(Arc::new)
    }

    /// Resolve an address, consulting the address table first.
    ///
    /// Concurrent lookups of the same address share one backend request.
    async fn resolve(&self, address: &str) -> Result<Coordinates, Arc<SourceError>> {
        self.addresses
            .try_get_with(normalize(address), self.backend.resolve(address))
            .await
    }
}

impl<B: RoutingBackend> DrivingEta for CachedDriving<B> {
    async fn driving_eta(
        &self,
        from: &str,
        to: &str,
        reference: TimeReference,
    ) -> Result<Duration, SourceError> {
        Ok(self.car_eta(from, to, reference).await)
    }

    /// Current conditions stand in for normal ones: the baseline is the
    /// latest known-good ETA.
    async fn baseline_driving_eta(
        &self,
        _direction: Direction,
        _at: DateTime<Utc>,
    ) -> Result<Duration, SourceError> {
        Ok(self.latest_known_eta().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend with a switchable route result that counts its calls.
    struct ScriptedBackend {
        route_eta: StdMutex<Option<Duration>>,
        resolvable: bool,
        resolve_calls: AtomicUsize,
        route_calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn returning(eta: Duration) -> Self {
            Self {
                route_eta: StdMutex::new(Some(eta)),
                resolvable: true,
                resolve_calls: AtomicUsize::new(0),
                route_calls: AtomicUsize::new(0),
            }
        }

        fn unresolvable() -> Self {
            Self {
                resolvable: false,
                ..Self::returning(Duration::minutes(1))
            }
        }

        fn set_route(&self, eta: Option<Duration>) {
            *self.route_eta.lock().unwrap() = eta;
        }

        fn resolve_calls(&self) -> usize {
            self.resolve_calls.load(Ordering::SeqCst)
        }

        fn route_calls(&self) -> usize {
            self.route_calls.load(Ordering::SeqCst)
        }
    }

    impl RoutingBackend for ScriptedBackend {
        async fn resolve(&self, address: &str) -> Result<Coordinates, SourceError> {
            self.resolve_calls.fetch_add(1, Ordering::SeqCst);
            if self.resolvable {
                Ok(Coordinates::new(address.len() as f64, 0.0))
            } else {
                Err(SourceError::UnresolvedAddress(address.to_string()))
            }
        }

        async fn route(
            &self,
            _from: Coordinates,
            _to: Coordinates,
            _reference: TimeReference,
        ) -> Result<Duration, SourceError> {
            self.route_calls.fetch_add(1, Ordering::SeqCst);
            let eta = *self.route_eta.lock().unwrap();
            eta.ok_or(SourceError::NoRoute)
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn leave_at(secs: i64) -> TimeReference {
        TimeReference::LeaveAt(at(secs))
    }

    fn cache(backend: ScriptedBackend) -> CachedDriving<ScriptedBackend> {
        CachedDriving::new(backend, &EtaCacheConfig::default())
    }

    #[test]
    fn default_config() {
        let config = EtaCacheConfig::default();
        assert_eq!(config.ttl, StdDuration::from_secs(45));
        assert_eq!(config.bucket_secs, 60);
        assert_eq!(config.initial_eta, Duration::minutes(35));
    }

    #[test]
    fn key_normalizes_and_buckets() {
        let cache = cache(ScriptedBackend::returning(Duration::minutes(20)));

        // 600_000 is a whole minute; 600_059 is the same bucket.
        let a = cache.route_key("  12 High St ", "Office", leave_at(600_000));
        let b = cache.route_key("12 high st", "OFFICE", leave_at(600_059));
        assert_eq!(a, b);

        let next_minute = cache.route_key("12 high st", "office", leave_at(600_060));
        assert_ne!(a, next_minute);

        let arrive = cache.route_key("12 high st", "office", TimeReference::ArriveBy(at(600_000)));
        assert_ne!(a, arrive);
    }

    #[tokio::test(start_paused = true)]
    async fn hit_within_ttl_skips_backend() {
        let cache = cache(ScriptedBackend::returning(Duration::minutes(20)));

        let first = cache.car_eta("Home", "Work", leave_at(600_000)).await;
        tokio::time::advance(StdDuration::from_secs(30)).await;
        let second = cache.car_eta("home ", "WORK", leave_at(600_030)).await;

        assert_eq!(first, Duration::minutes(20));
        assert_eq!(second, Duration::minutes(20));
        assert_eq!(cache.backend.route_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_entry_is_refetched() {
        let cache = cache(ScriptedBackend::returning(Duration::minutes(20)));

        cache.car_eta("Home", "Work", leave_at(600_000)).await;
        cache.backend.set_route(Some(Duration::minutes(26)));
        tokio::time::advance(StdDuration::from_secs(46)).await;

        let eta = cache.car_eta("Home", "Work", leave_at(600_000)).await;
        assert_eq!(eta, Duration::minutes(26));
        assert_eq!(cache.backend.route_calls(), 2);
        assert_eq!(cache.latest_known_eta().await, Duration::minutes(26));
    }

    #[tokio::test(start_paused = true)]
    async fn hit_refreshes_latest_good() {
        let cache = cache(ScriptedBackend::returning(Duration::minutes(20)));

        cache.car_eta("Home", "Work", leave_at(600_000)).await;
        cache.backend.set_route(Some(Duration::minutes(30)));
        cache.car_eta("Gym", "Work", leave_at(600_000)).await;
        assert_eq!(cache.latest_known_eta().await, Duration::minutes(30));

        tokio::time::advance(StdDuration::from_secs(10)).await;
        let hit = cache.car_eta("Home", "Work", leave_at(600_000)).await;

        assert_eq!(hit, Duration::minutes(20));
        assert_eq!(cache.backend.route_calls(), 2);
        assert_eq!(cache.latest_known_eta().await, Duration::minutes(20));
        let baseline = cache
            .baseline_driving_eta(Direction::HomeToWork, at(600_000))
            .await
            .unwrap();
        assert_eq!(baseline, Duration::minutes(20));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_falls_back_to_latest_good() {
        let cache = cache(ScriptedBackend::returning(Duration::minutes(22)));

        let good = cache.car_eta("Home", "Work", leave_at(600_000)).await;
        assert_eq!(good, Duration::minutes(22));

        // Different bucket, so a miss; the backend now fails.
        cache.backend.set_route(None);
        let fallback = cache.car_eta("Home", "Work", leave_at(600_120)).await;
        assert_eq!(fallback, Duration::minutes(22));

        // The fallback was cached under the requested key.
        cache.backend.set_route(Some(Duration::minutes(40)));
        let again = cache.car_eta("Home", "Work", leave_at(600_120)).await;
        assert_eq!(again, Duration::minutes(22));
        assert_eq!(cache.backend.route_calls(), 2);
    }

    #[tokio::test]
    async fn unresolvable_address_uses_initial_eta() {
        let config = EtaCacheConfig::default().with_initial_eta(Duration::minutes(31));
        let cache = CachedDriving::new(ScriptedBackend::unresolvable(), &config);

        let eta = cache.car_eta("Nowhere", "Work", leave_at(600_000)).await;
        assert_eq!(eta, Duration::minutes(31));
        assert_eq!(cache.backend.route_calls(), 0);
    }

    #[tokio::test]
    async fn addresses_resolve_once_per_session() {
        let cache = cache(ScriptedBackend::returning(Duration::minutes(20)));

        cache.car_eta("Home", "Work", leave_at(600_000)).await;
        cache.car_eta(" HOME", "work", leave_at(700_000)).await;
        cache.car_eta("home", "Work", TimeReference::ArriveBy(at(800_000))).await;

        assert_eq!(cache.backend.resolve_calls(), 2);
        assert_eq!(cache.backend.route_calls(), 3);
    }

    #[tokio::test]
    async fn baseline_is_latest_good() {
        let cache = cache(ScriptedBackend::returning(Duration::minutes(18)));

        let before = cache
            .baseline_driving_eta(Direction::HomeToWork, at(0))
            .await
            .unwrap();
        assert_eq!(before, Duration::minutes(35));

        cache
            .driving_eta("Home", "Work", leave_at(600_000))
            .await
            .unwrap();
        let after = cache
            .baseline_driving_eta(Direction::WorkToHome, at(0))
            .await
            .unwrap();
        assert_eq!(after, Duration::minutes(18));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_see_consistent_values() {
        let cache = Arc::new(cache(ScriptedBackend::returning(Duration::minutes(25))));

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let cache = cache.clone();
                tokio::spawn(async move {
                    let origin = if i % 2 == 0 { "Home" } else { "Gym" };
                    cache.car_eta(origin, "Work", leave_at(600_000 + i * 60)).await
                })
            })
            .collect();

        for handle in futures::future::join_all(handles).await {
            assert_eq!(handle.unwrap(), Duration::minutes(25));
        }

        assert_eq!(cache.latest_known_eta().await, Duration::minutes(25));
        // Three distinct addresses, each resolved once.
        assert_eq!(cache.backend.resolve_calls(), 3);
    }
}
