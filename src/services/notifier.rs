//! Notification dispatch
//!
//! Fire-and-forget: a notification failure is logged and never aborts
//! the state transition that triggered it.

use crate::utils::error::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{info, warn};

/// Notification templates the engine dispatches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationTemplate {
    /// Applicant: application received and queued for review
    ApplicationReceived,
    /// Applicant: application approved, role granted
    ApplicationApproved,
    /// Applicant: application rejected
    ApplicationRejected,
    /// Applicant: application withdrawn
    ApplicationWithdrawn,
    /// Admins: a new application awaits review
    AdminReviewRequested,
}

impl NotificationTemplate {
    /// Template key used by delivery backends
    pub fn key(&self) -> &'static str {
        match self {
            Self::ApplicationReceived => "application.received",
            Self::ApplicationApproved => "application.approved",
            Self::ApplicationRejected => "application.rejected",
            Self::ApplicationWithdrawn => "application.withdrawn",
            Self::AdminReviewRequested => "application.review_requested",
        }
    }
}

/// Notification dispatch boundary
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Dispatch a templated notification
    async fn notify(
        &self,
        recipient: &str,
        template: NotificationTemplate,
        context: serde_json::Value,
    ) -> Result<()>;
}

/// Notifier that logs instead of delivering
#[derive(Default)]
pub struct LoggingNotifier;

impl LoggingNotifier {
    /// Create a logging notifier
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn notify(
        &self,
        recipient: &str,
        template: NotificationTemplate,
        context: serde_json::Value,
    ) -> Result<()> {
        info!(recipient, template = template.key(), %context, "notification dispatched");
        Ok(())
    }
}

/// Notifier that records dispatches for assertions in tests
#[derive(Default)]
pub struct RecordingNotifier {
    sent: RwLock<Vec<(String, NotificationTemplate)>>,
}

impl RecordingNotifier {
    /// Create an empty recording notifier
    pub fn new() -> Self {
        Self::default()
    }

    /// All (recipient, template) pairs dispatched so far
    pub fn sent(&self) -> Vec<(String, NotificationTemplate)> {
        self.sent.read().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        recipient: &str,
        template: NotificationTemplate,
        _context: serde_json::Value,
    ) -> Result<()> {
        self.sent.write().push((recipient.to_string(), template));
        Ok(())
    }
}

/// Dispatch a notification, swallowing and logging any failure
pub async fn notify_best_effort(
    notifier: &dyn Notifier,
    recipient: &str,
    template: NotificationTemplate,
    context: serde_json::Value,
) {
    if let Err(error) = notifier.notify(recipient, template, context).await {
        warn!(recipient, template = template.key(), %error, "notification dispatch failed");
    }
}
