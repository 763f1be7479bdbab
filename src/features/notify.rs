//! Notification port

use colored::Colorize;

/// A message shown outside the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Heading
    pub title: String,
    /// Message text
    pub body: String,
}

impl Notification {
    /// Creates a notification
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Something that can surface a notification to the user
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    /// Shows a notification; returns false if it could not be shown
    fn notify(&self, notification: &Notification) -> bool;
}

/// Notifier that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _notification: &Notification) -> bool {
        false
    }
}

/// Prints notifications as a highlighted line on the terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

impl TerminalNotifier {
    /// Renders the line that [`Notifier::notify`] prints
    pub fn render(notification: &Notification) -> String {
        format!(
            "{} {}",
            format!("[{}]", notification.title).magenta().bold(),
            notification.body
        )
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: &Notification) -> bool {
        println!("\n{}", Self::render(notification));
        true
    }
}
