//! Proactive re-engagement
//!
//! A background task that checks periodically whether the user has gone
//! quiet with the conversation in the background, and if so sends a short
//! message through the notifier.

use crate::config::ProactiveConfig;
use crate::features::activity::ActivityTracker;
use crate::features::notify::{Notification, Notifier};

use rand::seq::IndexedRandom;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Lines sent after a period of inactivity
pub const PROACTIVE_MESSAGES: &[&str] = &[
    "Hi! How are you doing today? 💕",
    "I was wondering what you're up to... 😊",
    "Do you have a moment to chat? 🥰",
    "I miss you! How is your day going? 💖",
    "I'm thinking about you... How about a chat? 💭",
];

/// Decides whether a proactive message is due
///
/// # Examples
///
/// ```
/// use bella::features::should_reach_out;
/// use std::time::Duration;
///
/// let threshold = Duration::from_secs(300);
/// assert!(should_reach_out(true, true, Duration::from_secs(301), threshold));
/// assert!(!should_reach_out(true, false, Duration::from_secs(900), threshold));
/// ```
pub fn should_reach_out(enabled: bool, hidden: bool, idle: Duration, threshold: Duration) -> bool {
    enabled && hidden && idle > threshold
}

/// Periodic idle check that sends re-engagement notifications
pub struct ProactiveScheduler {
    interval: Duration,
    threshold: Duration,
    title: String,
    enabled: Arc<AtomicBool>,
    activity: Arc<ActivityTracker>,
    notifier: Arc<dyn Notifier>,
    handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for ProactiveScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProactiveScheduler")
            .field("interval", &self.interval)
            .field("threshold", &self.threshold)
            .field("enabled", &self.is_enabled())
            .field("running", &self.is_running())
            .finish()
    }
}

impl ProactiveScheduler {
    /// Creates a stopped scheduler
    ///
    /// # Arguments
    ///
    /// * `config` - Interval, idle threshold and initial enabled flag
    /// * `title` - Notification title, usually the persona name
    /// * `activity` - Shared activity state written by the session
    /// * `notifier` - Where messages are delivered
    pub fn new(
        config: &ProactiveConfig,
        title: impl Into<String>,
        activity: Arc<ActivityTracker>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            interval: Duration::from_secs(config.check_interval_seconds.max(1)),
            threshold: Duration::from_secs(config.idle_threshold_seconds),
            title: title.into(),
            enabled: Arc::new(AtomicBool::new(config.enabled)),
            activity,
            notifier,
            handle: None,
        }
    }

    /// Turns proactive messages on or off without stopping the task
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
        tracing::info!("Proactive mode {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Returns true when messages may be sent
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Returns true while the background task is alive
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Runs one check and sends a message if one is due
    ///
    /// Returns true when a notification was delivered.
    pub fn tick(&self) -> bool {
        check(
            &self.enabled,
            &self.activity,
            self.notifier.as_ref(),
            &self.title,
            self.threshold,
        )
    }

    /// Spawns the periodic task on the current tokio runtime
    ///
    /// Calling this while already running does nothing.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }

        let interval = self.interval;
        let threshold = self.threshold;
        let title = self.title.clone();
        let enabled = Arc::clone(&self.enabled);
        let activity = Arc::clone(&self.activity);
        let notifier = Arc::clone(&self.notifier);

        self.handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                check(&enabled, &activity, notifier.as_ref(), &title, threshold);
            }
        }));
        tracing::debug!("Proactive scheduler started, checking every {:?}", interval);
    }

    /// Cancels the periodic task
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!("Proactive scheduler stopped");
        }
    }
}

impl Drop for ProactiveScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn check(
    enabled: &AtomicBool,
    activity: &ActivityTracker,
    notifier: &dyn Notifier,
    title: &str,
    threshold: Duration,
) -> bool {
    let idle = activity.idle_for();
    if !should_reach_out(
        enabled.load(Ordering::Relaxed),
        activity.is_hidden(),
        idle,
        threshold,
    ) {
        return false;
    }

    let message = PROACTIVE_MESSAGES
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(PROACTIVE_MESSAGES[0]);
    let delivered = notifier.notify(&Notification::new(title, message));
    if delivered {
        tracing::info!("Sent proactive message after {:?} idle", idle);
        // Avoid repeating on every tick while the user stays away
        activity.touch();
    } else {
        tracing::debug!("Proactive message not delivered");
    }
    delivered
}
