//! Notification surface for operation outcomes.
//!
//! One port, swappable implementations: the terminal variant prints
//! transient styled lines (never blocking the interaction loop), the
//! recording variant backs tests and embedding.

use std::sync::{Arc, Mutex};

use console::style;

/// Kind of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// A single notification: short title plus description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

/// Port for surfacing operation outcomes to the user.
pub trait Notifier: Send + Sync {
    fn success(&self, title: &str, message: &str);
    fn error(&self, title: &str, message: &str);
}

/// Styled, non-blocking notifications on stderr.
#[derive(Debug, Default, Clone)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for ConsoleNotifier {
    fn success(&self, title: &str, message: &str) {
        eprintln!(
            "{} {} {}",
            style("+").green().bold(),
            style(title).green().bold(),
            message
        );
    }

    fn error(&self, title: &str, message: &str) {
        eprintln!(
            "{} {} {}",
            style("!").red().bold(),
            style(title).red().bold(),
            message
        );
    }
}

/// Recording notifier. Clones share the same buffer, so a test can keep a
/// handle while the service owns the boxed port.
#[derive(Debug, Default, Clone)]
pub struct MemoryNotifier {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications recorded so far.
    pub fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notifier lock poisoned").clone()
    }

    /// Recorded notifications of one kind.
    pub fn of_kind(&self, kind: NotificationKind) -> Vec<Notification> {
        self.events()
            .into_iter()
            .filter(|n| n.kind == kind)
            .collect()
    }

    fn push(&self, kind: NotificationKind, title: &str, message: &str) {
        self.events
            .lock()
            .expect("notifier lock poisoned")
            .push(Notification {
                kind,
                title: title.to_string(),
                message: message.to_string(),
            });
    }
}

impl Notifier for MemoryNotifier {
    fn success(&self, title: &str, message: &str) {
        self.push(NotificationKind::Success, title, message);
    }

    fn error(&self, title: &str, message: &str) {
        self.push(NotificationKind::Error, title, message);
    }
}
