//! Utility functions module
//!
//! Clock abstraction and process signal handling.

pub mod clock;
pub mod signals;

// Re-export main items
pub use clock::{Clock, FakeClock, SystemClock};
pub use signals::shutdown_signal;
