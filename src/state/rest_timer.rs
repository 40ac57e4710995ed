//! Rest timer state machine
//!
//! The timer never counts down by decrementing per tick. Every evaluation
//! recomputes remaining time from the wall-clock anchor `started_at`, so the
//! countdown stays accurate across tick jitter, main-thread stalls, and host
//! suspension. Ticks are only a trigger to re-evaluate.

use tracing::{debug, info};

use crate::services::notifier::{dispatch_completion, Notifier};
use crate::storage::{load_record, save_record, KvStore, TIMER_SETTINGS_KEY, TIMER_STATE_KEY};
use crate::utils::clock::Clock;

use super::{RestTimerState, TimerSettings, TimerSettingsPatch, TimerStatus};

/// Callback invoked with the new remaining seconds on each observed decrease
pub type TickCallback = Box<dyn FnMut(u64) + Send>;

/// Callback invoked exactly once per natural expiry
pub type CompleteCallback = Box<dyn FnMut() + Send>;

/// Drift-corrected rest timer with durable state and best-effort notifications
///
/// All operations are synchronous, non-blocking, and safe to call from any
/// state; calls that do not apply (pausing an idle timer, say) are no-ops.
/// Every mutating operation persists before returning, best-effort.
pub struct RestTimer {
    state: RestTimerState,
    settings: TimerSettings,
    clock: Box<dyn Clock>,
    store: Box<dyn KvStore>,
    notifier: Box<dyn Notifier>,
    on_tick: Option<TickCallback>,
    on_complete: Option<CompleteCallback>,
}

impl RestTimer {
    /// Attach to persisted state, falling back to defaults for anything
    /// missing or unreadable
    pub fn new(clock: Box<dyn Clock>, store: Box<dyn KvStore>, notifier: Box<dyn Notifier>) -> Self {
        let state: RestTimerState = load_record(store.as_ref(), TIMER_STATE_KEY).unwrap_or_default();
        let settings: TimerSettings =
            load_record(store.as_ref(), TIMER_SETTINGS_KEY).unwrap_or_default();

        Self {
            state,
            settings,
            clock,
            store,
            notifier,
            on_tick: None,
            on_complete: None,
        }
    }

    /// Register the per-decrease tick callback
    pub fn set_on_tick(&mut self, on_tick: TickCallback) {
        self.on_tick = Some(on_tick);
    }

    /// Register the natural-expiry callback
    pub fn set_on_complete(&mut self, on_complete: CompleteCallback) {
        self.on_complete = Some(on_complete);
    }

    /// Current timer state
    pub fn snapshot(&self) -> RestTimerState {
        self.state.clone()
    }

    /// Current settings
    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    /// Start a new countdown, silently replacing any in-flight timer
    pub fn start(&mut self, seconds: u64, set_id: Option<i64>) {
        info!("Starting rest timer: {}s, set_id={:?}", seconds, set_id);
        self.state = RestTimerState::running(seconds, set_id, self.clock.now_ms());
        self.persist_state();
    }

    /// Freeze the countdown; no-op unless running
    ///
    /// Remaining time is refreshed from the wall clock before freezing, so
    /// the stored value is accurate even if no tick intervened. `started_at`
    /// stays put; `resume` re-anchors it.
    pub fn pause(&mut self) {
        if self.state.status != TimerStatus::Running {
            debug!("Ignoring pause while {:?}", self.state.status);
            return;
        }

        self.refresh_remaining();
        self.state.is_running = false;
        self.state.status = TimerStatus::Paused;
        self.state.paused_at = Some(self.clock.now_ms());
        info!("Rest timer paused with {}s remaining", self.state.time_remaining);
        self.persist_state();
    }

    /// Resume the countdown from the stored remaining time
    ///
    /// Re-anchors `started_at` to `now - elapsed_before_pause` so the
    /// timestamp-based recomputation is immediately consistent with the
    /// remaining time at the moment of pause. Accepted defensively from any
    /// state, meaningful only after a pause.
    pub fn resume(&mut self) {
        let elapsed_before = self.state.total_time.saturating_sub(self.state.time_remaining);
        self.state.started_at = Some(self.clock.now_ms() - (elapsed_before as i64) * 1000);
        self.state.is_running = true;
        self.state.status = TimerStatus::Running;
        self.state.paused_at = None;
        info!("Rest timer resumed with {}s remaining", self.state.time_remaining);
        self.persist_state();
    }

    /// Return to the idle default state
    pub fn reset(&mut self) {
        info!("Resetting rest timer");
        self.state = RestTimerState::idle();
        self.persist_state();
    }

    /// Cancel the countdown without completion side effects
    ///
    /// Distinct from natural expiry: neither the notifier nor `on_complete`
    /// fires.
    pub fn skip(&mut self) {
        info!("Skipping rest timer");
        self.state.time_remaining = 0;
        self.state.is_running = false;
        self.state.status = TimerStatus::Idle;
        self.persist_state();
    }

    /// Extend both the total duration and the remaining time
    ///
    /// Refreshes remaining time first and re-anchors `started_at`, so the new
    /// value is readable immediately instead of on the next tick.
    pub fn add_time(&mut self, seconds: u64) {
        self.refresh_remaining();
        self.state.total_time = self.state.total_time.saturating_add(seconds);
        self.state.time_remaining = self.state.time_remaining.saturating_add(seconds);
        self.reanchor();
        debug!("Added {}s, {}s remaining", seconds, self.state.time_remaining);
        self.persist_state();
    }

    /// Shorten the remaining time, clamped at zero; total duration unchanged
    pub fn subtract_time(&mut self, seconds: u64) {
        self.refresh_remaining();
        self.state.time_remaining = self.state.time_remaining.saturating_sub(seconds);
        self.reanchor();
        debug!("Subtracted {}s, {}s remaining", seconds, self.state.time_remaining);
        self.persist_state();

        // Cutting past the remaining time expires the timer right away
        if self.state.time_remaining == 0 {
            self.complete();
        }
    }

    /// Shallow-merge a settings patch and persist it; timer state untouched
    pub fn update_settings(&mut self, patch: TimerSettingsPatch) {
        self.settings.merge(patch);
        info!("Timer settings updated: {:?}", self.settings);
        save_record(self.store.as_ref(), TIMER_SETTINGS_KEY, &self.settings);
    }

    /// Re-evaluate the countdown against the wall clock
    ///
    /// Called by the tick scheduler at a sub-second cadence; also safe to
    /// call directly. An unchanged remaining value writes nothing. A decrease
    /// fires `on_tick`; reaching zero while running triggers the completion
    /// path.
    pub fn evaluate(&mut self) {
        if !self.state.is_running || self.state.status != TimerStatus::Running {
            return;
        }
        let Some(elapsed) = self.elapsed_secs() else {
            return;
        };

        let new_remaining = self.state.total_time.saturating_sub(elapsed);
        if new_remaining != self.state.time_remaining {
            let decreased = new_remaining < self.state.time_remaining;
            self.state.time_remaining = new_remaining;
            self.persist_state();

            if decreased {
                if let Some(on_tick) = self.on_tick.as_mut() {
                    on_tick(new_remaining);
                }
            }
        }

        if new_remaining == 0 {
            self.complete();
        }
    }

    /// One-shot recovery for state that went stale while the host was down
    ///
    /// Compares the persisted `started_at` against the current wall clock:
    /// a timer that expired unobserved completes retroactively (side effects
    /// fire once); one still in flight gets its remaining time corrected and
    /// keeps running. Anything not persisted as running is left alone.
    pub fn reconcile(&mut self) {
        if self.state.status != TimerStatus::Running || !self.state.is_running {
            return;
        }
        let Some(elapsed) = self.elapsed_secs() else {
            return;
        };

        if elapsed >= self.state.time_remaining {
            info!(
                "Rest timer expired while unobserved ({}s elapsed), completing retroactively",
                elapsed
            );
            self.complete();
        } else {
            self.state.time_remaining = self.state.total_time.saturating_sub(elapsed);
            self.reanchor();
            info!(
                "Recovered running rest timer with {}s remaining",
                self.state.time_remaining
            );
            self.persist_state();
        }
    }

    /// Completion path, structurally guarded by the status check: the
    /// transition to `Completed` happens before any side effect, so repeated
    /// evaluation cannot fire effects twice
    fn complete(&mut self) {
        if self.state.status != TimerStatus::Running {
            return;
        }

        info!("Rest timer completed");
        self.state.time_remaining = 0;
        self.state.is_running = false;
        self.state.status = TimerStatus::Completed;
        self.persist_state();

        dispatch_completion(
            self.notifier.as_ref(),
            self.settings.sound_enabled,
            self.settings.vibration_enabled,
        );

        if let Some(on_complete) = self.on_complete.as_mut() {
            on_complete();
        }
    }

    /// Whole seconds elapsed since `started_at`, clamped non-negative
    fn elapsed_secs(&self) -> Option<u64> {
        let started_at = self.state.started_at?;
        let elapsed_ms = (self.clock.now_ms() - started_at).max(0);
        Some((elapsed_ms / 1000) as u64)
    }

    /// Recompute `time_remaining` from the anchor while running
    fn refresh_remaining(&mut self) {
        if !self.state.is_running {
            return;
        }
        if let Some(elapsed) = self.elapsed_secs() {
            self.state.time_remaining = self.state.total_time.saturating_sub(elapsed);
        }
    }

    /// Move `started_at` so the anchor matches the stored remaining time
    fn reanchor(&mut self) {
        if !self.state.is_running {
            return;
        }
        let elapsed = self.state.total_time.saturating_sub(self.state.time_remaining);
        self.state.started_at = Some(self.clock.now_ms() - (elapsed as i64) * 1000);
    }

    fn persist_state(&self) {
        save_record(self.store.as_ref(), TIMER_STATE_KEY, &self.state);
    }
}

impl std::fmt::Debug for RestTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestTimer")
            .field("state", &self.state)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::notifier::NullNotifier;
    use crate::storage::MemoryStore;
    use crate::utils::clock::FakeClock;
    use anyhow::Result;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct RecordingNotifier {
        sounds: Arc<AtomicUsize>,
        vibrations: Arc<AtomicUsize>,
    }

    impl Notifier for RecordingNotifier {
        fn play_sound(&self) -> Result<()> {
            self.sounds.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn vibrate(&self) -> Result<()> {
            self.vibrations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Harness {
        timer: RestTimer,
        clock: FakeClock,
        notifier: RecordingNotifier,
        completions: Arc<AtomicUsize>,
        ticks: Arc<Mutex<Vec<u64>>>,
    }

    fn harness() -> Harness {
        harness_with_store(Arc::new(MemoryStore::new()))
    }

    fn harness_with_store(store: Arc<MemoryStore>) -> Harness {
        let clock = FakeClock::default();
        let notifier = RecordingNotifier::default();
        let mut timer = RestTimer::new(
            Box::new(clock.clone()),
            Box::new(Arc::clone(&store)),
            Box::new(notifier.clone()),
        );

        let completions = Arc::new(AtomicUsize::new(0));
        let completions_hook = Arc::clone(&completions);
        timer.set_on_complete(Box::new(move || {
            completions_hook.fetch_add(1, Ordering::SeqCst);
        }));

        let ticks = Arc::new(Mutex::new(Vec::new()));
        let ticks_hook = Arc::clone(&ticks);
        timer.set_on_tick(Box::new(move |remaining| {
            ticks_hook.lock().unwrap().push(remaining);
        }));

        Harness {
            timer,
            clock,
            notifier,
            completions,
            ticks,
        }
    }

    fn advance_secs(h: &Harness, secs: u64) {
        h.clock.advance(Duration::from_secs(secs));
    }

    #[test]
    fn starts_running_with_full_duration() {
        let mut h = harness();
        h.timer.start(90, Some(12));

        let state = h.timer.snapshot();
        assert_eq!(state.status, TimerStatus::Running);
        assert!(state.is_running);
        assert_eq!(state.time_remaining, 90);
        assert_eq!(state.total_time, 90);
        assert_eq!(state.set_id, Some(12));
        assert_eq!(state.started_at, Some(h.clock.now_ms()));
    }

    #[test]
    fn start_replaces_a_running_timer_without_error() {
        let mut h = harness();
        h.timer.start(90, Some(1));
        advance_secs(&h, 20);
        h.timer.start(60, Some(2));

        let state = h.timer.snapshot();
        assert_eq!(state.time_remaining, 60);
        assert_eq!(state.total_time, 60);
        assert_eq!(state.set_id, Some(2));
    }

    #[test]
    fn evaluate_recomputes_from_timestamp_not_tick_count() {
        let mut h = harness();
        h.timer.start(60, None);

        // One evaluation after a long stall still lands on the right value
        advance_secs(&h, 17);
        h.timer.evaluate();
        assert_eq!(h.timer.snapshot().time_remaining, 43);

        // Redundant evaluations in the same second change nothing
        h.timer.evaluate();
        h.timer.evaluate();
        assert_eq!(h.timer.snapshot().time_remaining, 43);
        assert_eq!(h.ticks.lock().unwrap().as_slice(), &[43]);
    }

    #[test]
    fn remaining_never_exceeds_total() {
        let mut h = harness();
        h.timer.start(30, None);
        advance_secs(&h, 5);
        h.timer.evaluate();
        h.timer.add_time(20);
        h.timer.subtract_time(100);
        h.timer.resume();
        h.timer.evaluate();

        let state = h.timer.snapshot();
        assert!(state.time_remaining <= state.total_time);
    }

    #[test]
    fn completion_fires_exactly_once() {
        let mut h = harness();
        h.timer.start(1, None);
        advance_secs(&h, 2);

        h.timer.evaluate();
        h.timer.evaluate();
        h.timer.evaluate();

        let state = h.timer.snapshot();
        assert_eq!(state.status, TimerStatus::Completed);
        assert!(!state.is_running);
        assert_eq!(state.time_remaining, 0);
        assert_eq!(h.completions.load(Ordering::SeqCst), 1);
        assert_eq!(h.notifier.sounds.load(Ordering::SeqCst), 1);
        assert_eq!(h.notifier.vibrations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn completion_respects_disabled_effects() {
        let mut h = harness();
        h.timer.update_settings(TimerSettingsPatch {
            sound_enabled: Some(false),
            vibration_enabled: Some(false),
            ..Default::default()
        });

        h.timer.start(1, None);
        advance_secs(&h, 5);
        h.timer.evaluate();

        assert_eq!(h.completions.load(Ordering::SeqCst), 1);
        assert_eq!(h.notifier.sounds.load(Ordering::SeqCst), 0);
        assert_eq!(h.notifier.vibrations.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn pause_is_idempotent() {
        let mut h = harness();
        h.timer.start(90, None);
        advance_secs(&h, 30);

        h.timer.pause();
        let once = h.timer.snapshot();
        h.timer.pause();
        let twice = h.timer.snapshot();

        assert_eq!(once, twice);
        assert_eq!(once.status, TimerStatus::Paused);
        assert_eq!(once.time_remaining, 60);
    }

    #[test]
    fn pause_while_idle_is_a_no_op() {
        let mut h = harness();
        h.timer.pause();
        assert_eq!(h.timer.snapshot(), RestTimerState::idle());
    }

    #[test]
    fn resume_preserves_elapsed_time() {
        let mut h = harness();
        h.timer.start(90, None);

        advance_secs(&h, 30);
        h.timer.pause();
        assert_eq!(h.timer.snapshot().time_remaining, 60);

        // A long pause must not eat into the countdown
        advance_secs(&h, 300);
        h.timer.resume();
        assert_eq!(h.timer.snapshot().time_remaining, 60);

        advance_secs(&h, 10);
        h.timer.evaluate();
        assert_eq!(h.timer.snapshot().time_remaining, 50);
    }

    #[test]
    fn skip_suppresses_completion_effects() {
        let mut h = harness();
        h.timer.start(60, Some(4));
        h.timer.skip();

        let state = h.timer.snapshot();
        assert_eq!(state.status, TimerStatus::Idle);
        assert_eq!(state.time_remaining, 0);
        assert!(!state.is_running);
        assert_eq!(h.completions.load(Ordering::SeqCst), 0);
        assert_eq!(h.notifier.sounds.load(Ordering::SeqCst), 0);
        assert_eq!(h.notifier.vibrations.load(Ordering::SeqCst), 0);

        // Later ticks stay inert
        advance_secs(&h, 120);
        h.timer.evaluate();
        assert_eq!(h.completions.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn reset_returns_to_idle_default() {
        let mut h = harness();
        h.timer.start(60, Some(9));
        advance_secs(&h, 10);
        h.timer.reset();

        assert_eq!(h.timer.snapshot(), RestTimerState::idle());
        assert_eq!(h.completions.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn add_time_is_readable_immediately() {
        let mut h = harness();
        h.timer.start(30, None);
        advance_secs(&h, 5);

        // No evaluate in between: add_time refreshes from the clock itself
        h.timer.add_time(20);

        let state = h.timer.snapshot();
        assert_eq!(state.time_remaining, 45);
        assert_eq!(state.total_time, 50);

        // The re-anchored timestamp keeps later ticks consistent
        advance_secs(&h, 5);
        h.timer.evaluate();
        assert_eq!(h.timer.snapshot().time_remaining, 40);
    }

    #[test]
    fn add_time_while_paused_keeps_the_timer_paused() {
        let mut h = harness();
        h.timer.start(60, None);
        advance_secs(&h, 10);
        h.timer.pause();
        h.timer.add_time(30);

        let state = h.timer.snapshot();
        assert_eq!(state.status, TimerStatus::Paused);
        assert_eq!(state.time_remaining, 80);
        assert_eq!(state.total_time, 90);
    }

    #[test]
    fn subtract_time_clamps_at_zero_and_expires() {
        let mut h = harness();
        h.timer.start(30, None);
        advance_secs(&h, 5);
        h.timer.subtract_time(100);

        let state = h.timer.snapshot();
        assert_eq!(state.time_remaining, 0);
        assert_eq!(state.status, TimerStatus::Completed);
        assert_eq!(h.completions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn subtract_time_partial_keeps_running() {
        let mut h = harness();
        h.timer.start(60, None);
        advance_secs(&h, 10);
        h.timer.subtract_time(20);

        let state = h.timer.snapshot();
        assert_eq!(state.time_remaining, 30);
        assert_eq!(state.status, TimerStatus::Running);

        advance_secs(&h, 10);
        h.timer.evaluate();
        assert_eq!(h.timer.snapshot().time_remaining, 20);
    }

    #[test]
    fn recovery_completes_a_timer_that_expired_unobserved() {
        let seeded = Arc::new(MemoryStore::new());
        {
            let clock = FakeClock::default();
            let mut timer = RestTimer::new(
                Box::new(clock.clone()),
                Box::new(Arc::clone(&seeded)),
                Box::new(NullNotifier),
            );
            timer.start(90, Some(7));
        }

        // Reattach 125 seconds later, as after a host restart
        let mut h = harness_with_store(seeded);
        advance_secs(&h, 125);
        h.timer.reconcile();

        let state = h.timer.snapshot();
        assert_eq!(state.status, TimerStatus::Completed);
        assert!(!state.is_running);
        assert_eq!(state.time_remaining, 0);
        assert_eq!(h.completions.load(Ordering::SeqCst), 1);
        assert_eq!(h.notifier.sounds.load(Ordering::SeqCst), 1);

        // Reconciliation is one-shot; evaluating further changes nothing
        h.timer.evaluate();
        assert_eq!(h.completions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn recovery_corrects_a_timer_still_in_flight() {
        let seeded = Arc::new(MemoryStore::new());
        {
            let clock = FakeClock::default();
            let mut timer = RestTimer::new(
                Box::new(clock.clone()),
                Box::new(Arc::clone(&seeded)),
                Box::new(NullNotifier),
            );
            timer.start(90, None);
        }

        let mut h = harness_with_store(seeded);
        advance_secs(&h, 40);
        h.timer.reconcile();

        let state = h.timer.snapshot();
        assert_eq!(state.status, TimerStatus::Running);
        assert!(state.is_running);
        assert_eq!(state.time_remaining, 50);
        assert_eq!(h.completions.load(Ordering::SeqCst), 0);

        // The countdown continues from the corrected value
        advance_secs(&h, 10);
        h.timer.evaluate();
        assert_eq!(h.timer.snapshot().time_remaining, 40);
    }

    #[test]
    fn recovery_ignores_non_running_state() {
        let seeded = Arc::new(MemoryStore::new());
        {
            let clock = FakeClock::default();
            let mut timer = RestTimer::new(
                Box::new(clock.clone()),
                Box::new(Arc::clone(&seeded)),
                Box::new(NullNotifier),
            );
            timer.start(90, None);
            timer.pause();
        }

        let mut h = harness_with_store(seeded);
        advance_secs(&h, 500);
        h.timer.reconcile();

        let state = h.timer.snapshot();
        assert_eq!(state.status, TimerStatus::Paused);
        assert_eq!(state.time_remaining, 90);
        assert_eq!(h.completions.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn state_survives_a_round_trip_through_the_store() {
        let store = Arc::new(MemoryStore::new());
        let mut h = harness_with_store(Arc::clone(&store));
        h.timer.start(75, Some(3));
        advance_secs(&h, 5);
        h.timer.evaluate();

        let reloaded = RestTimer::new(
            Box::new(h.clock.clone()),
            Box::new(store),
            Box::new(NullNotifier),
        );
        assert_eq!(reloaded.snapshot(), h.timer.snapshot());
    }

    #[test]
    fn settings_update_does_not_touch_timer_state() {
        let mut h = harness();
        h.timer.start(60, None);
        let before = h.timer.snapshot();

        h.timer.update_settings(TimerSettingsPatch {
            default_rest_time: Some(120),
            ..Default::default()
        });

        assert_eq!(h.timer.snapshot(), before);
        assert_eq!(h.timer.settings().default_rest_time, 120);
    }

    #[test]
    fn timer_works_without_usable_persistence() {
        struct BrokenStore;

        impl crate::storage::KvStore for BrokenStore {
            fn get(&self, _key: &str) -> Option<String> {
                None
            }

            fn set(&self, _key: &str, _value: &str) -> Result<()> {
                anyhow::bail!("storage offline")
            }
        }

        let clock = FakeClock::default();
        let mut timer = RestTimer::new(
            Box::new(clock.clone()),
            Box::new(BrokenStore),
            Box::new(NullNotifier),
        );

        timer.start(10, None);
        clock.advance(Duration::from_secs(4));
        timer.evaluate();
        assert_eq!(timer.snapshot().time_remaining, 6);

        clock.advance(Duration::from_secs(10));
        timer.evaluate();
        assert_eq!(timer.snapshot().status, TimerStatus::Completed);
    }
}
