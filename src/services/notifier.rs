//! Completion notification dispatch
//!
//! Sound and vibration are best-effort side effects fired once on natural
//! completion. A failing or absent actuator is logged and ignored; it never
//! disturbs the state machine.

use std::io::Write;

use anyhow::{Context, Result};
use tracing::{info, warn};

/// Vibration pattern for timer completion: three short pulses
pub const COMPLETION_VIBRATION_MS: [u64; 5] = [100, 50, 100, 50, 100];

/// Best-effort audio and vibration actuator
pub trait Notifier: Send {
    /// Play the completion sound
    fn play_sound(&self) -> Result<()>;

    /// Trigger the completion vibration pattern
    fn vibrate(&self) -> Result<()>;
}

/// Dispatch completion effects per the enabled flags, swallowing failures
pub fn dispatch_completion(notifier: &dyn Notifier, sound: bool, vibration: bool) {
    if sound {
        if let Err(e) = notifier.play_sound() {
            warn!("Completion sound failed: {}", e);
        }
    }
    if vibration {
        if let Err(e) = notifier.vibrate() {
            warn!("Completion vibration failed: {}", e);
        }
    }
}

/// Notifier for terminal hosts: rings the bell for sound, logs for vibration
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn play_sound(&self) -> Result<()> {
        let mut stdout = std::io::stdout();
        stdout.write_all(b"\x07").context("Failed to ring terminal bell")?;
        stdout.flush().context("Failed to flush terminal bell")?;
        Ok(())
    }

    fn vibrate(&self) -> Result<()> {
        // No vibration actuator on a terminal host
        info!("Timer complete, vibration pattern {:?}ms", COMPLETION_VIBRATION_MS);
        Ok(())
    }
}

/// Notifier that does nothing, for headless deployments
#[derive(Debug, Clone, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn play_sound(&self) -> Result<()> {
        Ok(())
    }

    fn vibrate(&self) -> Result<()> {
        Ok(())
    }
}
