//! User-visible notifications.
//!
//! Studio actions report their outcome through a [`Notifier`]. A front end
//! shows them as toasts; without one, [`TracingNotifier`] writes them to the
//! log.

use std::time::Duration;

use tracing::{info, warn};

/// How prominently a notice should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Default,
    /// A degraded outcome the user must not miss.
    Destructive,
}

/// A short message describing the outcome of an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub duration: Duration,
}

impl Notice {
    /// A regular notice shown for three seconds.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Default,
            duration: Duration::from_millis(3000),
        }
    }

    /// A destructive notice shown for five seconds.
    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Destructive,
            duration: Duration::from_millis(5000),
        }
    }

    pub fn is_destructive(&self) -> bool {
        self.severity == Severity::Destructive
    }
}

/// Sink for [`Notice`]s.
pub trait Notifier {
    fn notify(&mut self, notice: Notice);
}

/// Writes notices to the `tracing` log.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&mut self, notice: Notice) {
        match notice.severity {
            Severity::Default => info!(title = %notice.title, "{}", notice.description),
            Severity::Destructive => warn!(title = %notice.title, "{}", notice.description),
        }
    }
}

/// Keeps every notice in order. Useful for front ends that drain notices
/// once per frame, and for tests.
#[derive(Debug, Default)]
pub struct NoticeLog {
    notices: Vec<Notice>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn last(&self) -> Option<&Notice> {
        self.notices.last()
    }

    /// Removes and returns all pending notices.
    pub fn drain(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

impl Notifier for NoticeLog {
    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}
