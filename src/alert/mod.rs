//! Alert delivery subsystem.
//!
//! # Data Flow
//! ```text
//! Runner decides to alert
//!     → monitor::message (format subject, text, html, chat line)
//!     → dispatcher.rs (fan out to every configured channel)
//!     → email.rs (SMTP) / webhook.rs (chat webhook)
//! ```
//!
//! # Design Decisions
//! - Channels fail independently; a failure never affects the others
//! - No retries; a failed delivery is logged and counted, then dropped
//! - Throttle bookkeeping is already done before delivery starts

pub mod dispatcher;
pub mod email;
pub mod webhook;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use dispatcher::AlertDispatcher;
pub use email::EmailNotifier;
pub use webhook::WebhookNotifier;

/// What an alert is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Down,
    Slow,
    Recovered,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Down => "DOWN",
            Severity::Slow => "SLOW",
            Severity::Recovered => "RECOVERED",
        }
    }
}

/// A formatted alert, ready for any channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub target_url: String,
    pub severity: Severity,
    /// E-mail subject line.
    pub subject: String,
    /// Plain-text body.
    pub text: String,
    /// HTML body.
    pub html: String,
    /// One-line message for chat channels.
    pub chat: String,
}

/// Errors raised by alert channels.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The message could not be built (bad address, bad payload).
    #[error("failed to build message: {0}")]
    Build(String),

    /// The transport failed before getting an answer.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote end answered with a failure.
    #[error("rejected with status {status}")]
    Rejected { status: u16 },
}

/// An outbound alert channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name used in logs and metrics.
    fn channel(&self) -> &'static str;

    async fn send(&self, alert: &Alert) -> Result<(), NotifyError>;
}
