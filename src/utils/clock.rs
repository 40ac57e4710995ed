//! Wall-clock abstraction for testable time handling

use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Source of wall-clock time in epoch milliseconds
///
/// The timer recomputes remaining time from absolute timestamps, so this is
/// the only time dependency the state machine has. Injecting a fake clock
/// lets tests simulate arbitrary gaps without real waits.
pub trait Clock: Send {
    fn now_ms(&self) -> i64;
}

/// Real wall clock backed by `chrono::Utc`
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Controllable clock for tests and simulations
#[derive(Debug, Clone)]
pub struct FakeClock {
    now_ms: Arc<Mutex<i64>>,
}

impl FakeClock {
    /// Create a fake clock starting at the given epoch milliseconds
    pub fn at(epoch_ms: i64) -> Self {
        Self {
            now_ms: Arc::new(Mutex::new(epoch_ms)),
        }
    }

    /// Advance the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        if let Ok(mut now) = self.now_ms.lock() {
            *now += duration.as_millis() as i64;
        }
    }

    /// Jump the clock to an absolute epoch millisecond value
    pub fn set_ms(&self, epoch_ms: i64) {
        if let Ok(mut now) = self.now_ms.lock() {
            *now = epoch_ms;
        }
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::at(1_000_000_000_000)
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.lock().map(|now| *now).unwrap_or(0)
    }
}
