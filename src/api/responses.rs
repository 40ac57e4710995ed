//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{RestTimerState, TimerSettings, TimerStatus, DEFAULT_REST_INTERVALS};

/// Timer state as read by callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub time_remaining: u64,
    pub total_time: u64,
    pub is_running: bool,
    pub status: TimerStatus,
    pub set_id: Option<i64>,
    /// Remaining time formatted m:ss for display
    pub remaining_display: String,
}

impl From<RestTimerState> for TimerSnapshot {
    fn from(state: RestTimerState) -> Self {
        Self {
            remaining_display: format_seconds(state.time_remaining),
            time_remaining: state.time_remaining,
            total_time: state.total_time,
            is_running: state.is_running,
            status: state.status,
            set_id: state.set_id,
        }
    }
}

/// Format whole seconds as m:ss
pub fn format_seconds(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// API response structure for timer operation endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: TimerSnapshot,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: String, message: String, timer: TimerSnapshot) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
            timer,
        }
    }

    /// Create an ok response
    pub fn ok(message: String, timer: TimerSnapshot) -> Self {
        Self::new("ok".to_string(), message, timer)
    }
}

/// Settings response with the preset intervals callers can offer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsResponse {
    pub settings: TimerSettings,
    pub preset_intervals: Vec<u64>,
}

impl SettingsResponse {
    pub fn new(settings: TimerSettings) -> Self {
        Self {
            settings,
            preset_intervals: DEFAULT_REST_INTERVALS.to_vec(),
        }
    }
}

/// Enhanced status response with timer and server information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timer: TimerSnapshot,
    pub settings: TimerSettings,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_seconds_for_display() {
        assert_eq!(format_seconds(0), "0:00");
        assert_eq!(format_seconds(9), "0:09");
        assert_eq!(format_seconds(90), "1:30");
        assert_eq!(format_seconds(600), "10:00");
    }

    #[test]
    fn snapshot_carries_display_form() {
        let snapshot = TimerSnapshot::from(RestTimerState::running(90, Some(2), 0));
        assert_eq!(snapshot.remaining_display, "1:30");
        assert_eq!(snapshot.set_id, Some(2));
    }
}
