//! Offline time sources for development and testing.
//!
//! Each mock answers from fixed values and never fails, so the planner can
//! run without routing or transit credentials.

use chrono::{DateTime, Duration, Utc};

use crate::domain::{Direction, TimeReference, TrainDeparture};

use super::error::SourceError;
use super::{CyclingEta, Departures, DrivingEta};

/// Driving source returning fixed current and baseline ETAs.
#[derive(Debug, Clone)]
pub struct MockDriving {
    pub current_eta: Duration,
    pub baseline_eta: Duration,
}

impl MockDriving {
    pub fn new(current_eta: Duration, baseline_eta: Duration) -> Self {
        Self {
            current_eta,
            baseline_eta,
        }
    }
}

impl Default for MockDriving {
    fn default() -> Self {
        Self::new(Duration::minutes(34), Duration::minutes(28))
    }
}

impl DrivingEta for MockDriving {
    async fn driving_eta(
        &self,
        _from: &str,
        _to: &str,
        _reference: TimeReference,
    ) -> Result<Duration, SourceError> {
        Ok(self.current_eta)
    }

    async fn baseline_driving_eta(
        &self,
        _direction: Direction,
        _at: DateTime<Utc>,
    ) -> Result<Duration, SourceError> {
        Ok(self.baseline_eta)
    }
}

/// Transit source serving a fixed timetable.
///
/// Station and line are ignored: every query sees the same departures.
#[derive(Debug, Clone, Default)]
pub struct MockTransit {
    departures: Vec<TrainDeparture>,
}

impl MockTransit {
    pub fn new(departures: Vec<TrainDeparture>) -> Self {
        Self { departures }
    }

    /// Three trains fifteen minutes apart, the first leaving twelve minutes
    /// after `reference_now`.
    pub fn sample(reference_now: DateTime<Utc>) -> Self {
        let train = |id: &str, dep_mins: i64, platform: &str| {
            TrainDeparture::new(
                id,
                reference_now + Duration::minutes(dep_mins),
                reference_now + Duration::minutes(dep_mins + 24),
            )
            .with_platform(platform)
        };

        Self::new(vec![
            train("T-001", 12, "1"),
            train("T-002", 27, "2"),
            train("T-003", 42, "2"),
        ])
    }
}

impl Departures for MockTransit {
    async fn next_departures(
        &self,
        _station: &str,
        _line: &str,
        after: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<TrainDeparture>, SourceError> {
        let mut upcoming: Vec<TrainDeparture> = self
            .departures
            .iter()
            .filter(|d| d.departure >= after)
            .cloned()
            .collect();
        upcoming.sort_by_key(|d| d.departure);
        upcoming.truncate(limit);
        Ok(upcoming)
    }
}

/// Cycling source returning a fixed ETA.
#[derive(Debug, Clone)]
pub struct MockCycling {
    pub eta: Duration,
}

impl MockCycling {
    pub fn new(eta: Duration) -> Self {
        Self { eta }
    }
}

impl Default for MockCycling {
    fn default() -> Self {
        Self::new(Duration::minutes(8))
    }
}

impl CyclingEta for MockCycling {
    async fn cycling_eta(
        &self,
        _from: &str,
        _to: &str,
        _at: DateTime<Utc>,
    ) -> Result<Duration, SourceError> {
        Ok(self.eta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_000_000, 0).unwrap()
    }

    #[tokio::test]
    async fn transit_filters_sorts_and_truncates() {
        let now = now();
        let transit = MockTransit::new(vec![
            TrainDeparture::new("late", now + Duration::minutes(30), now + Duration::minutes(50)),
            TrainDeparture::new("gone", now - Duration::minutes(1), now + Duration::minutes(20)),
            TrainDeparture::new("soon", now + Duration::minutes(5), now + Duration::minutes(25)),
            TrainDeparture::new("mid", now + Duration::minutes(15), now + Duration::minutes(35)),
        ]);

        let departures = transit.next_departures("Any", "Blue", now, 2).await.unwrap();
        let ids: Vec<_> = departures.iter().map(|d| d.trip_id.as_str()).collect();
        assert_eq!(ids, vec!["soon", "mid"]);
    }

    #[tokio::test]
    async fn sample_timetable() {
        let now = now();
        let departures = MockTransit::sample(now)
            .next_departures("Any", "Blue", now, 8)
            .await
            .unwrap();

        assert_eq!(departures.len(), 3);
        assert_eq!(departures[0].trip_id, "T-001");
        assert_eq!(departures[0].departure, now + Duration::minutes(12));
        assert_eq!(departures[0].arrival, now + Duration::minutes(36));
        assert_eq!(departures[2].platform.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn fixed_etas() {
        let driving = MockDriving::default();
        let reference = TimeReference::LeaveAt(now());
        assert_eq!(
            driving.driving_eta("a", "b", reference).await.unwrap(),
            Duration::minutes(34)
        );
        assert_eq!(
            driving
                .baseline_driving_eta(Direction::HomeToWork, now())
                .await
                .unwrap(),
            Duration::minutes(28)
        );

        let cycling = MockCycling::default();
        assert_eq!(
            cycling.cycling_eta("a", "b", now()).await.unwrap(),
            Duration::minutes(8)
        );
    }
}
