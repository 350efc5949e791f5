//! Shared test utilities for `ImpulsePause`.
//!
//! Database setup, fixed clocks, item fixtures, notifier and store fakes, and a
//! one-shot HTTP server for exercising the ntfy client.

#![allow(clippy::unwrap_used)]

use crate::{
    core::{
        item::{Item, ItemForm},
        profile::ProfileSettings,
        status::ItemStatus,
        wait::{Timestamp, WaitSpec},
    },
    errors::{Error, Result},
    notify::{Notification, Notifier, NotifyError},
    store::{MemoryStore, StoredProfile, WaitlistStore},
};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta};
use sea_orm::{DatabaseConnection, DbErr};
use std::{sync::Mutex, time::Duration};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    task::JoinHandle,
};
use tracing_subscriber::EnvFilter;

/// Routes `tracing` output through the test harness. `RUST_LOG` overrides the
/// default `trace` level; repeated calls are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace")),
        )
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Fixed "now" used across tests: 2026-01-15 12:00 UTC.
pub fn reference_now() -> Timestamp {
    DateTime::parse_from_rfc3339("2026-01-15T12:00:00+00:00").unwrap()
}

/// An add/edit form with only the title filled in.
pub fn item_form(title: &str) -> ItemForm {
    ItemForm {
        title: title.to_string(),
        ..ItemForm::default()
    }
}

/// An item with a one-day wait starting at `created_at`.
///
/// # Defaults
/// * link: `https://example.com/{id}`
/// * no price, note or tags
/// * notification not yet attempted
pub fn sample_item(id: i64, title: &str, status: ItemStatus, created_at: Timestamp) -> Item {
    Item {
        id,
        title: title.to_string(),
        price: String::new(),
        price_value: None,
        link: format!("https://example.com/{id}"),
        note: String::new(),
        tags: String::new(),
        status,
        wait: WaitSpec::default(),
        eligible_at: created_at + TimeDelta::hours(24),
        created_at,
        notification_attempted: false,
    }
}

/// Lets spawned dispatch tasks run to completion on the current-thread runtime.
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

/// [`Notifier`] that records every reminder it is asked to send.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    fail: bool,
}

impl RecordingNotifier {
    /// A notifier whose sends succeed.
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier that records, then reports a transport failure.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Reminders seen so far.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> std::result::Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification.clone());
        if self.fail {
            return Err(NotifyError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

/// [`Notifier`] whose sends never finish in test time.
#[derive(Debug, Default)]
pub struct HangingNotifier {
    started: Mutex<usize>,
}

impl HangingNotifier {
    /// How many sends have begun.
    pub fn started(&self) -> usize {
        *self.started.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Notifier for HangingNotifier {
    async fn send(&self, _notification: &Notification) -> std::result::Result<(), NotifyError> {
        *self.started.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }
}

/// [`MemoryStore`] whose status and notification-flag writes always fail.
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
}

fn write_failed() -> Error {
    Error::Database(DbErr::Custom("disk I/O error".to_string()))
}

#[async_trait]
impl WaitlistStore for FlakyStore {
    async fn load_all(&self, profile: &str) -> Result<StoredProfile> {
        self.inner.load_all(profile).await
    }

    async fn list_profiles(&self) -> Result<Vec<String>> {
        self.inner.list_profiles().await
    }

    async fn upsert_profile(&self, profile: &str, settings: &ProfileSettings) -> Result<()> {
        self.inner.upsert_profile(profile, settings).await
    }

    async fn rename_profile(&self, from: &str, to: &str) -> Result<()> {
        self.inner.rename_profile(from, to).await
    }

    async fn delete_profile(&self, profile: &str) -> Result<()> {
        self.inner.delete_profile(profile).await
    }

    async fn insert_item(&self, profile: &str, item: &Item) -> Result<i64> {
        self.inner.insert_item(profile, item).await
    }

    async fn update_item(&self, profile: &str, item: &Item) -> Result<()> {
        self.inner.update_item(profile, item).await
    }

    async fn update_item_status(
        &self,
        _profile: &str,
        _id: i64,
        _status: ItemStatus,
    ) -> Result<()> {
        Err(write_failed())
    }

    async fn mark_notification_attempted(&self, _profile: &str, _id: i64) -> Result<()> {
        Err(write_failed())
    }

    async fn delete_item(&self, profile: &str, id: i64) -> Result<()> {
        self.inner.delete_item(profile, id).await
    }
}

/// Serves exactly one HTTP request with `status_line` and `body`.
///
/// Returns the server's base URL and a handle resolving to the raw request.
pub async fn serve_one_request(status_line: &str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let response = format!(
        "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut chunk = [0_u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&chunk[..n]);
            if request_complete(&raw) {
                break;
            }
        }
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&raw).into_owned()
    });

    (base_url, handle)
}

fn request_complete(raw: &[u8]) -> bool {
    let text = String::from_utf8_lossy(raw);
    let Some((head, body)) = text.split_once("\r\n\r\n") else {
        return false;
    };
    let length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    body.len() >= length
}

/// A URL on localhost where nothing is listening.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
