//! State management module
//!
//! Timer state, user settings, the rest timer state machine, and the shared
//! application state that exposes them to the HTTP layer.

pub mod app_state;
pub mod rest_timer;
pub mod settings;
pub mod timer_state;

// Re-export main types
pub use app_state::{AppState, TimerUpdate};
pub use rest_timer::RestTimer;
pub use settings::{TimerSettings, TimerSettingsPatch, DEFAULT_REST_INTERVALS};
pub use timer_state::{RestTimerState, TimerStatus};
