//! Delivery of monitoring results to a chat.
//!
//! The pipeline produces one [`NotificationEvent`] per step and hands it to a
//! [`Notifier`]. [`TelegramNotifier`] delivers to a single configured chat.

pub mod error;
pub mod telegram;

pub use error::TelegramError;
pub use telegram::{TelegramConfig, TelegramNotifier};

use std::path::PathBuf;

/// How loudly an event is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Silent message, no push notification.
    Inform,
    /// Audible message carrying the configured mention.
    Alert,
}

/// A message plus optional attachments, consumed immediately by a notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub text: String,
    pub files: Vec<PathBuf>,
    pub severity: Severity,
}

impl NotificationEvent {
    pub fn inform(text: impl Into<String>) -> Self {
        Self { text: text.into(), files: Vec::new(), severity: Severity::Inform }
    }

    pub fn alert(text: impl Into<String>) -> Self {
        Self { text: text.into(), files: Vec::new(), severity: Severity::Alert }
    }

    /// Attach a file, sent as a document after the text.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }
}

/// Notification sink.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &NotificationEvent) -> Result<(), TelegramError>;
}
