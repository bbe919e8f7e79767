//! Non-blocking user notifications ("toasts").
//!
//! The store never propagates a failure into rendering; it publishes a
//! [`Notification`] here and the UI shows it whenever it gets to it.

use tokio::sync::broadcast;

use crate::error::{ErrorKind, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    /// Set for errors.
    pub kind: Option<ErrorKind>,
}

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 64;

/// Fan-out of notifications to whoever renders them. Cheap to clone.
#[derive(Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn success(&self, message: impl Into<String>) {
        self.publish(Notification {
            level: NotificationLevel::Success,
            message: message.into(),
            kind: None,
        });
    }

    /// Report a failed operation. Validation and authentication messages
    /// are shown as-is; backend failures are prefixed with `context`.
    pub fn error(&self, context: &str, err: &StoreError) {
        let kind = err.kind();
        let message = match kind {
            ErrorKind::Validation | ErrorKind::Authentication => err.to_string(),
            ErrorKind::Remote | ErrorKind::SchemaMissing => format!("{context}: {err}"),
        };
        tracing::warn!(kind = ?kind, error = %err, "{context}");
        self.publish(Notification {
            level: NotificationLevel::Error,
            message,
            kind: Some(kind),
        });
    }

    fn publish(&self, notification: Notification) {
        // Nobody listening is fine.
        let _ = self.sender.send(notification);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
