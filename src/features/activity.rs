//! Shared user-activity state
//!
//! The chat session writes it; the proactive scheduler only reads it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Last interaction time and whether the conversation is in the background
#[derive(Debug)]
pub struct ActivityTracker {
    last_interaction: Mutex<Instant>,
    hidden: AtomicBool,
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityTracker {
    /// Starts in the foreground with an interaction recorded now
    pub fn new() -> Self {
        Self {
            last_interaction: Mutex::new(Instant::now()),
            hidden: AtomicBool::new(false),
        }
    }

    /// Records an interaction now
    pub fn touch(&self) {
        self.touch_at(Instant::now());
    }

    /// Records an interaction at a given instant
    pub fn touch_at(&self, at: Instant) {
        *self.last_interaction() = at;
    }

    /// Time since the last interaction
    pub fn idle_for(&self) -> Duration {
        self.last_interaction().elapsed()
    }

    // A panic elsewhere cannot leave an `Instant` half-written, so a poisoned
    // lock is still safe to use.
    fn last_interaction(&self) -> MutexGuard<'_, Instant> {
        self.last_interaction.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Activity lock poisoned, recovering last interaction time");
            PoisonError::into_inner(poisoned)
        })
    }

    /// Marks the conversation as backgrounded or foregrounded
    pub fn set_hidden(&self, hidden: bool) {
        self.hidden.store(hidden, Ordering::Relaxed);
    }

    /// Returns true when the conversation is in the background
    pub fn is_hidden(&self) -> bool {
        self.hidden.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tracker_is_visible_and_fresh() {
        let tracker = ActivityTracker::new();
        assert!(!tracker.is_hidden());
        assert!(tracker.idle_for() < Duration::from_secs(5));
    }

    #[test]
    fn test_visibility_toggle() {
        let tracker = ActivityTracker::new();
        tracker.set_hidden(true);
        assert!(tracker.is_hidden());
        tracker.set_hidden(false);
        assert!(!tracker.is_hidden());
    }

    #[test]
    fn test_poisoned_lock_still_tracks_activity() {
        let tracker = std::sync::Arc::new(ActivityTracker::new());
        let poisoner = std::sync::Arc::clone(&tracker);
        let result = std::thread::spawn(move || {
            let _guard = poisoner.last_interaction.lock();
            panic!("poison the lock");
        })
        .join();
        assert!(result.is_err());
        assert!(tracker.last_interaction.is_poisoned());

        if let Some(past) = Instant::now().checked_sub(Duration::from_secs(600)) {
            tracker.touch_at(past);
            assert!(tracker.idle_for() >= Duration::from_secs(600));
        }
        tracker.touch();
        assert!(tracker.idle_for() < Duration::from_secs(5));
    }

    #[test]
    fn test_touch_at_past_instant_reports_idle() {
        let tracker = ActivityTracker::new();
        if let Some(past) = Instant::now().checked_sub(Duration::from_secs(600)) {
            tracker.touch_at(past);
            assert!(tracker.idle_for() >= Duration::from_secs(600));
        }
        tracker.touch();
        assert!(tracker.idle_for() < Duration::from_secs(5));
    }
}
