//! Get-ready reminders.
//!
//! The dashboard hands every freshly computed plan to a scheduler. Delivery
//! is up to the implementation; the server only logs reminders.

use std::collections::HashMap;
use std::future::Future;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::info;

use crate::domain::{CommutePlan, Direction, TripRequest};

/// Schedules and cancels reminders for a trip.
pub trait NotificationScheduler: Send + Sync {
    fn schedule(
        &self,
        plan: &CommutePlan,
        request: &TripRequest,
    ) -> impl Future<Output = ()> + Send;

    fn cancel(&self, request: &TripRequest) -> impl Future<Output = ()> + Send;
}

/// Scheduler that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl NotificationScheduler for NoopNotifier {
    async fn schedule(&self, _plan: &CommutePlan, _request: &TripRequest) {}

    async fn cancel(&self, _request: &TripRequest) {}
}

/// Scheduler that logs each reminder and remembers the pending one per
/// direction. A new plan for a direction replaces its previous reminder.
#[derive(Debug, Default)]
pub struct LogNotifier {
    pending: Mutex<HashMap<Direction, DateTime<Utc>>>,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// The get-ready instant currently scheduled for `direction`.
    pub async fn pending(&self, direction: Direction) -> Option<DateTime<Utc>> {
        self.pending.lock().await.get(&direction).copied()
    }
}

impl NotificationScheduler for LogNotifier {
    async fn schedule(&self, plan: &CommutePlan, request: &TripRequest) {
        let multimodal = plan.multimodal_option();
        let get_ready_at = multimodal.attempt_times.get_ready_at;

        info!(
            direction = ?request.direction,
            train = %multimodal.selected_train.trip_id,
            %get_ready_at,
            leave_at = %multimodal.attempt_times.leave_at,
            state = plan.state().as_str(),
            "scheduled get-ready reminder"
        );

        self.pending
            .lock()
            .await
            .insert(request.direction, get_ready_at);
    }

    async fn cancel(&self, request: &TripRequest) {
        if self.pending.lock().await.remove(&request.direction).is_some() {
            info!(direction = ?request.direction, "cancelled get-ready reminder");
        }
    }
}
