//! Rest Timer - a drift-corrected, persistent rest timer service
//!
//! This library models the countdown between exercise sets: it survives host
//! restarts through durable state and a one-shot recovery reconciliation,
//! stays accurate under unreliable ticking by recomputing remaining time
//! from wall-clock timestamps, and fires completion side effects exactly
//! once per natural expiry.

pub mod api;
pub mod config;
pub mod services;
pub mod state;
pub mod storage;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use state::{AppState, RestTimer, RestTimerState, TimerSettings, TimerStatus};
pub use utils::signals::shutdown_signal;
