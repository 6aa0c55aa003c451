//! Side effects the client triggers on the surrounding UI: transient
//! notifications and route changes.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// User-visible transient notification sink.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: &str);
}

/// Route changer (browser location, desktop router, CLI prompt).
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Writes notifications to the log. Default for headless use.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => tracing::info!(notice = message),
            NoticeLevel::Warning => tracing::warn!(notice = message),
            NoticeLevel::Error => tracing::error!(notice = message),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, path: &str) {
        tracing::info!(path, "navigation requested");
    }
}
