//! Train candidate filtering and selection.

use chrono::{DateTime, Duration, Utc};

use crate::domain::{PlanningMode, TrainDeparture, TripRequest};

/// The train to aim for and the one after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainChoice {
    pub selected: TrainDeparture,
    pub fallback: Option<TrainDeparture>,
}

/// Narrow sorted departures to those matching the planning mode, and pick
/// the instant the traveler sets off from.
///
/// - Arrive-by keeps trains arriving by the target, or every train when none
///   does, and measures from `now`.
/// - Leave-at keeps trains departing at or after the target, and measures
///   from the target.
pub fn candidates_for<'a>(
    request: &TripRequest,
    departures: &'a [TrainDeparture],
    now: DateTime<Utc>,
) -> (Vec<&'a TrainDeparture>, DateTime<Utc>) {
    match request.planning_mode {
        PlanningMode::ArriveBy => {
            let arriving_in_time: Vec<_> = departures
                .iter()
                .filter(|d| d.arrival <= request.target)
                .collect();

            if arriving_in_time.is_empty() {
                (departures.iter().collect(), now)
            } else {
                (arriving_in_time, now)
            }
        }
        PlanningMode::LeaveAt => {
            let after_target = departures
                .iter()
                .filter(|d| d.departure >= request.target)
                .collect();
            (after_target, request.target)
        }
    }
}

/// Pick the first train the traveler can reach with `margin` to spare when
/// setting off at `start`, or the first candidate when none is reachable.
///
/// Returns `None` only for an empty candidate list.
pub fn first_feasible_train(
    candidates: &[&TrainDeparture],
    start: DateTime<Utc>,
    cycling_with_buffer: Duration,
    margin: Duration,
) -> Option<TrainChoice> {
    // An arrival past the representable range reaches no train.
    let index = start
        .checked_add_signed(cycling_with_buffer)
        .and_then(|at_station| {
            candidates.iter().position(|d| {
                d.departure
                    .checked_sub_signed(margin)
                    .is_some_and(|latest| at_station <= latest)
            })
        })
        .unwrap_or(0);

    let selected = (*candidates.get(index)?).clone();
    let fallback = candidates.get(index + 1).map(|d| (*d).clone());

    Some(TrainChoice { selected, fallback })
}
