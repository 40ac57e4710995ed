//! Shared application state wiring the timer to the HTTP layer

use std::{
    sync::Mutex,
    time::Instant,
};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::services::notifier::Notifier;
use crate::storage::KvStore;
use crate::utils::clock::Clock;

use super::RestTimer;

/// Snapshot pushed to watchers on every observed tick and on completion
#[derive(Debug, Clone, Copy, Default)]
pub struct TimerUpdate {
    pub remaining_seconds: u64,
    pub completed: bool,
}

/// Application state shared between handlers and background tasks
///
/// The timer is session-scoped and owned here, not global; tests build their
/// own instances with fake dependencies.
#[derive(Debug)]
pub struct AppState {
    /// The rest timer state machine, serialized behind one lock
    pub timer: Mutex<RestTimer>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
    /// Channel for timer updates
    pub timer_update_tx: watch::Sender<TimerUpdate>,
    /// Keep the receiver alive to prevent channel closure
    pub _timer_update_rx: watch::Receiver<TimerUpdate>,
}

impl AppState {
    /// Build the application state around injected timer dependencies
    ///
    /// Wires the timer callbacks into the update channel, then runs the
    /// recovery reconciler exactly once so state persisted before a restart
    /// is caught up (or retroactively completed) before anything observes it.
    pub fn new(
        port: u16,
        host: String,
        clock: Box<dyn Clock>,
        store: Box<dyn KvStore>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let (timer_update_tx, timer_update_rx) = watch::channel(TimerUpdate::default());

        let mut timer = RestTimer::new(clock, store, notifier);

        let tick_tx = timer_update_tx.clone();
        timer.set_on_tick(Box::new(move |remaining| {
            let _ = tick_tx.send(TimerUpdate {
                remaining_seconds: remaining,
                completed: false,
            });
        }));

        let complete_tx = timer_update_tx.clone();
        timer.set_on_complete(Box::new(move || {
            let _ = complete_tx.send(TimerUpdate {
                remaining_seconds: 0,
                completed: true,
            });
        }));

        timer.reconcile();

        Self {
            timer: Mutex::new(timer),
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
            timer_update_tx,
            _timer_update_rx: timer_update_rx,
        }
    }

    /// Run an operation against the timer under the lock
    pub fn with_timer<F, R>(&self, action: &str, op: F) -> Result<R, String>
    where
        F: FnOnce(&mut RestTimer) -> R,
    {
        let mut timer = self
            .timer
            .lock()
            .map_err(|e| format!("Failed to lock timer state: {}", e))?;
        let result = op(&mut timer);
        drop(timer);

        self.record_action(action);
        Ok(result)
    }

    /// Read the timer without recording an action
    pub fn read_timer<F, R>(&self, op: F) -> Result<R, String>
    where
        F: FnOnce(&RestTimer) -> R,
    {
        self.timer
            .lock()
            .map(|timer| op(&timer))
            .map_err(|e| format!("Failed to lock timer state: {}", e))
    }

    fn record_action(&self, action: &str) {
        info!("Timer action: {}", action);
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        } else {
            warn!("Failed to record last action");
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}
