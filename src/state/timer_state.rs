//! Persisted rest timer state record

use serde::{Deserialize, Serialize};

/// Lifecycle status of the rest timer
///
/// `Completed` is terminal until an explicit `start` or `reset`; it also
/// doubles as the completion guard — the completion path only runs while the
/// status is still `Running`, so side effects cannot fire twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
    Completed,
}

/// Rest timer state, persisted across host restarts
///
/// `started_at` anchors the running segment in wall-clock time; remaining
/// time is always recomputed from it rather than decremented per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestTimerState {
    /// Seconds remaining on the timer
    pub time_remaining: u64,
    /// Duration the current timer was started or adjusted with, in seconds
    pub total_time: u64,
    /// Whether a running segment is active
    pub is_running: bool,
    /// Opaque reference to the set this rest period follows, owned by the caller
    pub set_id: Option<i64>,
    /// Current lifecycle status
    pub status: TimerStatus,
    /// Epoch milliseconds when the current running segment began
    pub started_at: Option<i64>,
    /// Epoch milliseconds of the most recent pause, informational only
    pub paused_at: Option<i64>,
}

impl RestTimerState {
    /// The idle default written by `reset` and used when nothing is persisted
    pub fn idle() -> Self {
        Self {
            time_remaining: 0,
            total_time: 0,
            is_running: false,
            set_id: None,
            status: TimerStatus::Idle,
            started_at: None,
            paused_at: None,
        }
    }

    /// A freshly started running state anchored at `now_ms`
    pub fn running(seconds: u64, set_id: Option<i64>, now_ms: i64) -> Self {
        Self {
            time_remaining: seconds,
            total_time: seconds,
            is_running: true,
            set_id,
            status: TimerStatus::Running,
            started_at: Some(now_ms),
            paused_at: None,
        }
    }
}

impl Default for RestTimerState {
    fn default() -> Self {
        Self::idle()
    }
}
