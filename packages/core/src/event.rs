//! The notification boundary.
//!
//! Stores and engines emit structured notifications; delivery and
//! formatting live outside the core. The default sink forwards to the
//! `log` crate so notifications show up wherever the host wired its
//! logger.

use std::fmt;

/// Coarse classification of a notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    /// Diagnostic chatter (bulk deletes, exports, probe cleanup).
    Debug,
    /// A secondary operation failed; the primary call already returned.
    Error,
    /// A store finished initializing and is ready for traffic.
    Ready,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::Debug => write!(f, "debug"),
            NotificationKind::Error => write!(f, "error"),
            NotificationKind::Ready => write!(f, "ready"),
        }
    }
}

/// One structured notification from a store or engine.
#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    /// Name of the originating store.
    pub store: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>, store: impl Into<String>) -> Self {
        Notification {
            kind,
            message: message.into(),
            store: store.into(),
        }
    }
}

/// Receives notifications. Implementations must tolerate being called
/// from multiple threads.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Default sink: forwards notifications to the `log` crate.
#[derive(Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Debug => {
                log::debug!("[{}] {}", notification.store, notification.message)
            }
            NotificationKind::Error => {
                log::error!("[{}] {}", notification.store, notification.message)
            }
            NotificationKind::Ready => {
                log::info!("[{}] {}", notification.store, notification.message)
            }
        }
    }
}

impl<T: NotificationSink + ?Sized> NotificationSink for Box<T> {
    fn notify(&self, notification: Notification) {
        self.as_ref().notify(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Sink that records everything it receives.
    pub struct RecordingSink {
        pub seen: Mutex<Vec<Notification>>,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            RecordingSink {
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl NotificationSink for RecordingSink {
        fn notify(&self, notification: Notification) {
            self.seen.lock().unwrap().push(notification);
        }
    }

    #[test]
    fn kinds_display_lowercase() {
        assert_eq!(NotificationKind::Debug.to_string(), "debug");
        assert_eq!(NotificationKind::Error.to_string(), "error");
        assert_eq!(NotificationKind::Ready.to_string(), "ready");
    }

    #[test]
    fn sink_receives_notification() {
        let sink = RecordingSink::new();
        sink.notify(Notification::new(
            NotificationKind::Ready,
            "store is ready",
            "test-store",
        ));

        let seen = sink.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].kind, NotificationKind::Ready);
        assert_eq!(seen[0].store, "test-store");
    }
}
