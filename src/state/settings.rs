//! Persisted timer settings and partial updates

use serde::{Deserialize, Serialize};

/// Preset rest intervals offered to callers, in seconds
pub const DEFAULT_REST_INTERVALS: [u64; 5] = [30, 60, 90, 120, 180];

/// User preferences for timer behavior, persisted independently of timer state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSettings {
    /// Default rest time in seconds, used when a start request omits a duration
    pub default_rest_time: u64,
    /// Whether to play a sound when the timer completes naturally
    pub sound_enabled: bool,
    /// Whether to vibrate when the timer completes naturally
    pub vibration_enabled: bool,
    /// Custom intervals the user has saved, in seconds
    pub custom_intervals: Vec<u64>,
    /// Whether the session layer should auto-start the timer after a set
    pub auto_start_on_set_complete: bool,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            default_rest_time: 90,
            sound_enabled: true,
            vibration_enabled: true,
            custom_intervals: Vec::new(),
            auto_start_on_set_complete: true,
        }
    }
}

/// Partial settings update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerSettingsPatch {
    pub default_rest_time: Option<u64>,
    pub sound_enabled: Option<bool>,
    pub vibration_enabled: Option<bool>,
    pub custom_intervals: Option<Vec<u64>>,
    pub auto_start_on_set_complete: Option<bool>,
}

impl TimerSettings {
    /// Shallow-merge a patch into the current settings
    pub fn merge(&mut self, patch: TimerSettingsPatch) {
        if let Some(default_rest_time) = patch.default_rest_time {
            self.default_rest_time = default_rest_time;
        }
        if let Some(sound_enabled) = patch.sound_enabled {
            self.sound_enabled = sound_enabled;
        }
        if let Some(vibration_enabled) = patch.vibration_enabled {
            self.vibration_enabled = vibration_enabled;
        }
        if let Some(custom_intervals) = patch.custom_intervals {
            self.custom_intervals = custom_intervals;
        }
        if let Some(auto_start) = patch.auto_start_on_set_complete {
            self.auto_start_on_set_complete = auto_start;
        }
    }
}
