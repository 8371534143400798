//! Background lifecycle worker
//!
//! Ticks every minute: reload the booking directory, run due tasks, send
//! reminders and backfill missing rooms. Every hour it also sweeps expired
//! meetings. Failures are logged and retried on the next tick.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::state::AppState;

pub const TICK_INTERVAL: Duration = Duration::from_secs(60);
const CLEANUP_EVERY_TICKS: u64 = 60;

pub fn start_lifecycle_worker(state: AppState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        let mut tick: u64 = 0;
        loop {
            interval.tick().await;
            run_tick(&state, tick).await;
            tick = tick.wrapping_add(1);
        }
    })
}

/// One pass of the worker. Tick 0 includes the cleanup sweep.
pub async fn run_tick(state: &AppState, tick: u64) {
    if let Err(err) = state.directory().reload().await {
        warn!("Failed to reload booking directory: {}", err);
    }

    let now = state.now();
    let lifecycle = state.lifecycle();

    let ran = lifecycle.run_due(now).await;
    if ran > 0 {
        debug!(ran, "Ran scheduled meeting tasks");
    }
    if let Err(err) = lifecycle.check_reminders(now).await {
        warn!("Reminder sweep failed: {}", err);
    }
    if let Err(err) = lifecycle.create_missing_rooms(now).await {
        warn!("Missing room backfill failed: {}", err);
    }
    if tick % CLEANUP_EVERY_TICKS == 0 {
        if let Err(err) = lifecycle.cleanup_all_expired(now).await {
            warn!("Expired meeting sweep failed: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{at, build_state, BOOKING_ID, HOST_ID};
    use meetgate_core::claims::Role;

    #[tokio::test]
    async fn first_tick_after_the_meeting_cleans_it_up() {
        let (state, _tmp) = build_state(at(10, 45)).await;
        let ctx = state.access().context(at(10, 45), None);
        assert!(state
            .access()
            .issuer()
            .existing_token(BOOKING_ID, HOST_ID, Role::Host, &ctx)
            .await
            .unwrap()
            .is_some());

        run_tick(&state, 0).await;

        assert!(state.lifecycle().queue().is_empty().await);
        assert!(state
            .access()
            .issuer()
            .existing_token(BOOKING_ID, HOST_ID, Role::Host, &ctx)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn ticks_before_the_meeting_keep_tasks_queued() {
        let (state, _tmp) = build_state(at(9, 0)).await;
        run_tick(&state, 1).await;
        assert_eq!(state.lifecycle().queue().len().await, 3);
    }
}
