//! Ready-to-buy reminders pushed to an ntfy topic.
//!
//! Delivery is best effort. The core marks an item as notified before a
//! [`Notification`] is ever handed to the [`Dispatcher`], and the dispatcher
//! sends it from a detached task, so a slow or failing endpoint can neither
//! block the core nor cause a second attempt.

use crate::core::{item::Item, profile::ProfileSettings};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// `Title` header of every reminder.
pub const NOTIFICATION_TITLE: &str = "Impulse Pause reminder";

/// Upper bound for one delivery attempt.
pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(2);

/// How much of an error response body is kept for the log.
const ERROR_BODY_LIMIT: usize = 512;

/// Why a reminder could not be delivered.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Client(String),
    /// Connection, timeout or other transport failure
    #[error("notification request failed: {0}")]
    Transport(String),
    /// The server answered with a 5xx status
    #[error("notification endpoint returned {status}: {body}")]
    Upstream {
        /// HTTP status code
        status: u16,
        /// Start of the response body
        body: String,
    },
}

/// One reminder, fully addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// ntfy server base URL
    pub endpoint: String,
    /// ntfy topic
    pub topic: String,
    /// `Title` header
    pub title: String,
    /// Plain-text body
    pub message: String,
}

impl Notification {
    /// The URL the reminder is posted to.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), self.topic)
    }
}

/// Delivery seam, faked in tests.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one reminder.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// [`Notifier`] that POSTs to an ntfy server.
#[derive(Debug, Clone)]
pub struct NtfyNotifier {
    client: reqwest::Client,
}

impl NtfyNotifier {
    /// Builds a notifier with the standard [`NOTIFY_TIMEOUT`].
    pub fn new() -> Result<Self, NotifyError> {
        Self::with_timeout(NOTIFY_TIMEOUT)
    }

    /// Builds a notifier with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Notifier for NtfyNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(notification.url())
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .header("Title", notification.title.as_str())
            .body(notification.message.clone())
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            let bytes = response.bytes().await.unwrap_or_default();
            let body = String::from_utf8_lossy(&bytes[..bytes.len().min(ERROR_BODY_LIMIT)])
                .into_owned();
            return Err(NotifyError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = status.as_u16(), url = %notification.url(), "notification delivered");
        Ok(())
    }
}

/// Turns promoted items into reminders and sends them off the caller's task.
#[derive(Clone)]
pub struct Dispatcher {
    notifier: Arc<dyn Notifier>,
    dashboard_url: String,
}

impl Dispatcher {
    /// Creates a dispatcher whose messages link to `dashboard_url`.
    pub fn new(notifier: Arc<dyn Notifier>, dashboard_url: impl Into<String>) -> Self {
        let dashboard_url = dashboard_url.into().trim().trim_end_matches('/').to_string();
        Self {
            notifier,
            dashboard_url,
        }
    }

    /// Reminder text for an item title.
    #[must_use]
    pub fn message(&self, title: &str) -> String {
        format!("{title} is now ready to buy.\nDashboard: {}/", self.dashboard_url)
    }

    /// Addresses a reminder for `item`, or `None` when the profile has no
    /// complete ntfy target.
    #[must_use]
    pub fn prepare(&self, item: &Item, settings: &ProfileSettings) -> Option<Notification> {
        let Some((endpoint, topic)) = settings.notification_target() else {
            info!(item_id = item.id, "ntfy not configured; skipping notification");
            return None;
        };
        Some(Notification {
            endpoint: endpoint.to_string(),
            topic: topic.to_string(),
            title: NOTIFICATION_TITLE.to_string(),
            message: self.message(&item.title),
        })
    }

    /// Sends `outbox` from a detached task. Failures are logged, never retried.
    ///
    /// Returns the task handle, or `None` when there was nothing to send.
    pub fn dispatch(&self, outbox: Vec<Notification>) -> Option<JoinHandle<()>> {
        if outbox.is_empty() {
            return None;
        }
        let notifier = Arc::clone(&self.notifier);
        Some(tokio::spawn(async move {
            for notification in outbox {
                if let Err(e) = notifier.send(&notification).await {
                    warn!(url = %notification.url(), error = %e, "notification failed");
                }
            }
        }))
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("dashboard_url", &self.dashboard_url)
            .finish_non_exhaustive()
    }
}
