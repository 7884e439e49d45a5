//! The planner's output: car assessment, selected train, and urgency state.

use chrono::{DateTime, Duration, Utc};

use super::departure::TrainDeparture;

/// The three instants that drive the urgency state machine.
///
/// For a cycling time longer than the feasibility margin and a non-negative
/// prep lead time, `get_ready_at <= leave_at < too_late_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptTimes {
    pub get_ready_at: DateTime<Utc>,
    pub leave_at: DateTime<Utc>,
    pub too_late_at: DateTime<Utc>,
}

impl AttemptTimes {
    /// Derive the anchors for catching a train that departs at `departure`.
    ///
    /// `too_late_at` uses the same margin as train selection, so a selected
    /// train is always consistent with its own thresholds. Anchors saturate
    /// at the ends of the representable range.
    pub fn for_departure(
        departure: DateTime<Utc>,
        cycling_with_buffer: Duration,
        prep_lead_time: Duration,
        feasibility_margin: Duration,
    ) -> Self {
        let leave_at = saturating_sub(departure, cycling_with_buffer);
        Self {
            get_ready_at: saturating_sub(leave_at, prep_lead_time),
            leave_at,
            too_late_at: saturating_sub(departure, feasibility_margin),
        }
    }
}

fn saturating_sub(at: DateTime<Utc>, by: Duration) -> DateTime<Utc> {
    at.checked_sub_signed(by).unwrap_or(if by < Duration::zero() {
        DateTime::<Utc>::MAX_UTC
    } else {
        DateTime::<Utc>::MIN_UTC
    })
}

/// How urgent the multimodal option is at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommuteState {
    OnTrack,
    LeaveNow,
    TooLate,
    RolledToNextTrain,
}

impl CommuteState {
    /// Evaluate the state at `now`. The first matching rule wins.
    ///
    /// `TooLate` is only reachable when `get_ready_at` falls after the
    /// departure itself, which takes a prep lead time longer than the
    /// time left before the train.
    pub fn evaluate(now: DateTime<Utc>, attempts: &AttemptTimes, departure: DateTime<Utc>) -> Self {
        if now > attempts.too_late_at {
            CommuteState::RolledToNextTrain
        } else if now >= attempts.leave_at {
            CommuteState::LeaveNow
        } else if now >= attempts.get_ready_at {
            CommuteState::OnTrack
        } else if now >= departure {
            CommuteState::TooLate
        } else {
            CommuteState::OnTrack
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CommuteState::OnTrack => "on_track",
            CommuteState::LeaveNow => "leave_now",
            CommuteState::TooLate => "too_late",
            CommuteState::RolledToNextTrain => "rolled_to_next_train",
        }
    }
}

/// Driving assessment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarOption {
    pub eta: Duration,
    pub baseline_eta: Duration,
    pub is_traffic_good: bool,
    pub reason: String,
}

impl CarOption {
    /// Traffic is good when the drive takes at most `allowed_delta` longer
    /// than the baseline.
    pub fn assess(eta: Duration, baseline_eta: Duration, allowed_delta: Duration) -> Self {
        let is_traffic_good = baseline_eta
            .checked_add(&allowed_delta)
            .map_or(allowed_delta > Duration::zero(), |limit| eta <= limit);
        let reason = if is_traffic_good {
            "Traffic is within threshold"
        } else {
            "Traffic exceeds baseline threshold"
        };

        Self {
            eta,
            baseline_eta,
            is_traffic_good,
            reason: reason.to_string(),
        }
    }
}

/// Bike-to-train assessment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultimodalOption {
    pub selected_train: TrainDeparture,
    pub attempt_times: AttemptTimes,
    /// The candidate after the selected one, if any.
    pub fallback_train: Option<TrainDeparture>,
}

/// Immutable result of one planning call.
///
/// The state is computed at construction from `generated_at` and the
/// selected attempt times, and cannot drift from them afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommutePlan {
    generated_at: DateTime<Utc>,
    car_option: CarOption,
    multimodal_option: MultimodalOption,
    state: CommuteState,
}

impl CommutePlan {
    pub fn new(
        generated_at: DateTime<Utc>,
        car_option: CarOption,
        multimodal_option: MultimodalOption,
    ) -> Self {
        let state = CommuteState::evaluate(
            generated_at,
            &multimodal_option.attempt_times,
            multimodal_option.selected_train.departure,
        );

        Self {
            generated_at,
            car_option,
            multimodal_option,
            state,
        }
    }

    /// A new plan carrying the same options, stamped and evaluated at `now`.
    pub fn reevaluated_at(&self, now: DateTime<Utc>) -> Self {
        Self::new(now, self.car_option.clone(), self.multimodal_option.clone())
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn car_option(&self) -> &CarOption {
        &self.car_option
    }

    pub fn multimodal_option(&self) -> &MultimodalOption {
        &self.multimodal_option
    }

    pub fn state(&self) -> CommuteState {
        self.state
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn anchor_arithmetic(
            departure_secs in 0i64..10_000_000,
            cycling_secs in 61i64..7_200,
            prep_mins in 0i64..120,
        ) {
            let departure = Utc.timestamp_opt(departure_secs, 0).unwrap();
            let cycling = Duration::seconds(cycling_secs);
            let prep = Duration::minutes(prep_mins);
            let attempts = AttemptTimes::for_departure(departure, cycling, prep, Duration::seconds(60));

            prop_assert_eq!(attempts.too_late_at, departure - Duration::seconds(60));
            prop_assert_eq!(attempts.leave_at, departure - cycling);
            prop_assert_eq!(attempts.get_ready_at, attempts.leave_at - prep);
            prop_assert!(attempts.get_ready_at <= attempts.leave_at);
            prop_assert!(attempts.leave_at < attempts.too_late_at);
        }

        #[test]
        fn state_is_monotonic_in_now(
            cycling_secs in 61i64..3_600,
            prep_mins in 0i64..60,
            offsets in proptest::collection::vec(-7_200i64..7_200, 2..20),
        ) {
            let departure = Utc.timestamp_opt(1_000_000, 0).unwrap();
            let attempts = AttemptTimes::for_departure(
                departure,
                Duration::seconds(cycling_secs),
                Duration::minutes(prep_mins),
                Duration::seconds(60),
            );

            let rank = |s: CommuteState| match s {
                CommuteState::OnTrack => 0,
                CommuteState::LeaveNow => 1,
                CommuteState::TooLate => 2,
                CommuteState::RolledToNextTrain => 3,
            };

            let mut offsets = offsets;
            offsets.sort();
            let ranks: Vec<_> = offsets
                .iter()
                .map(|o| rank(CommuteState::evaluate(departure + Duration::seconds(*o), &attempts, departure)))
                .collect();

            for window in ranks.windows(2) {
                prop_assert!(window[0] <= window[1]);
            }
            // Well-formed anchors never produce TooLate.
            prop_assert!(!ranks.contains(&2));
        }
    }
}
