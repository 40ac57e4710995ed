//! Tick scheduler background task

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{error, info};

use crate::state::AppState;

/// Trigger cadence; sub-second so the displayed countdown never lags a full
/// second, but carrying no timing truth of its own
pub const TICK_INTERVAL_MS: u64 = 100;

/// Background task that re-evaluates the timer at a fixed cadence
///
/// The task is a trigger, not a clock: evaluation recomputes remaining time
/// from the persisted wall-clock anchor, so missed or delayed ticks cost
/// nothing in accuracy. Ticks while the timer is not running are no-ops
/// inside `evaluate`.
pub async fn tick_scheduler_task(state: Arc<AppState>) {
    info!("Starting tick scheduler task ({}ms interval)", TICK_INTERVAL_MS);

    let mut ticker = interval(Duration::from_millis(TICK_INTERVAL_MS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        // The lock result must not live across an await, so back off only
        // after the match has dropped it
        let lock_failed = match state.timer.lock() {
            Ok(mut timer) => {
                timer.evaluate();
                false
            }
            Err(e) => {
                error!("Failed to lock timer for tick evaluation: {}", e);
                true
            }
        };

        if lock_failed {
            sleep(Duration::from_secs(1)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::notifier::NullNotifier;
    use crate::state::TimerStatus;
    use crate::storage::MemoryStore;
    use crate::utils::clock::FakeClock;

    fn app_state(clock: FakeClock) -> Arc<AppState> {
        Arc::new(AppState::new(
            0,
            "127.0.0.1".to_string(),
            Box::new(clock),
            Box::new(MemoryStore::new()),
            Box::new(NullNotifier),
        ))
    }

    #[test]
    fn task_future_can_cross_threads() {
        fn assert_send<T: Send>(_: &T) {}

        let task = tick_scheduler_task(app_state(FakeClock::default()));
        assert_send(&task);
    }

    #[tokio::test]
    async fn spawned_ticks_drive_evaluation_to_completion() {
        let clock = FakeClock::default();
        let state = app_state(clock.clone());

        state.with_timer("start", |t| t.start(1, None)).unwrap();
        clock.advance(Duration::from_secs(2));

        tokio::spawn(tick_scheduler_task(Arc::clone(&state)));
        sleep(Duration::from_millis(300)).await;

        let snapshot = state.read_timer(|t| t.snapshot()).unwrap();
        assert_eq!(snapshot.status, TimerStatus::Completed);
        assert_eq!(snapshot.time_remaining, 0);
    }
}
