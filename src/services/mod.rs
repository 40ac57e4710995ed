//! Side-effect services module
//!
//! Best-effort collaborators the timer notifies on natural completion.

pub mod notifier;

// Re-export main types
pub use notifier::{ConsoleNotifier, Notifier, NullNotifier};
