//! User-visible notifications, decoupled from whatever UI the host has.

/// Surface delivery problems to the person running the session.
///
/// Implementations must not block; they are called from the dispatch task.
pub trait Notifier: Send + Sync {
    /// Something went wrong but the service answered (e.g. a non-2xx status)
    fn warning(&self, message: &str);

    /// The request could not be completed at all
    fn error(&self, message: &str);
}

/// Sends notifications to the log only.
pub struct LoggingNotifier;

impl Notifier for LoggingNotifier {
    fn warning(&self, message: &str) {
        tracing::warn!(notification = true, "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(notification = true, "{}", message);
    }
}

/// Discards notifications.
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn warning(&self, _message: &str) {}

    fn error(&self, _message: &str) {}
}
