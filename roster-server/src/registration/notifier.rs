//! Best-effort party notifications
//!
//! The manager enqueues a [`Notification`] after the state change that
//! caused it is committed. The [`NotificationWorker`] drains the queue and
//! hands each message to a [`Notifier`]; delivery failures are logged and
//! dropped, never retried and never reported back to the operation.

use async_trait::async_trait;
use serde::Serialize;
use shared::registration::{RegistrationEntry, Resource};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Message addressed to one party
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub party_id: String,
    pub title: String,
    pub body: String,
    pub metadata: BTreeMap<String, String>,
}

impl Notification {
    fn for_entry(
        entry: &RegistrationEntry,
        resource: &Resource,
        kind: &str,
        title: impl Into<String>,
        body: String,
    ) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert("type".to_string(), kind.to_string());
        metadata.insert("resource_id".to_string(), resource.id.clone());
        metadata.insert("resource_kind".to_string(), resource.kind.to_string());
        metadata.insert("entry_id".to_string(), entry.id.clone());
        Self {
            party_id: entry.party_id.clone(),
            title: title.into(),
            body,
            metadata,
        }
    }

    /// Waitlisted party was confirmed
    pub fn promoted(entry: &RegistrationEntry, resource: &Resource) -> Self {
        Self::for_entry(
            entry,
            resource,
            "promoted",
            "You're in!",
            format!(
                "A spot opened up in {} and your registration is now confirmed.",
                resource.name
            ),
        )
    }

    /// Waitlisted party was offered a held slot
    pub fn offered(entry: &RegistrationEntry, resource: &Resource, expires_at: i64) -> Self {
        let mut n = Self::for_entry(
            entry,
            resource,
            "offered",
            "A slot is waiting for you",
            format!(
                "{} is free. Claim it before {} or it goes to the next person.",
                resource.name,
                format_deadline(expires_at)
            ),
        );
        n.metadata
            .insert("expires_at".to_string(), expires_at.to_string());
        n
    }

    pub fn offer_expired(entry: &RegistrationEntry, resource: &Resource) -> Self {
        Self::for_entry(
            entry,
            resource,
            "offer_expired",
            "Your slot offer expired",
            format!(
                "The slot for {} was not claimed in time and was passed on.",
                resource.name
            ),
        )
    }

    pub fn resource_canceled(entry: &RegistrationEntry, resource: &Resource) -> Self {
        Self::for_entry(
            entry,
            resource,
            "resource_canceled",
            format!("{} was canceled", resource.name),
            format!(
                "{} has been canceled and your registration was released.",
                resource.name
            ),
        )
    }
}

/// Claim deadline as shown to the party
fn format_deadline(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|t| t.format("%H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "the offer runs out".to_string())
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification transport error: {0}")]
    Transport(String),

    #[error("Notification rejected with status {0}")]
    Rejected(u16),
}

/// Delivery capability keyed by party id
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Writes notifications to the log (default when no webhook is configured)
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            party_id = %notification.party_id,
            title = %notification.title,
            metadata = ?notification.metadata,
            "Notification"
        );
        Ok(())
    }
}

/// POSTs each notification as JSON to a push gateway
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let resp = self
            .client
            .post(&self.url)
            .json(notification)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}

/// Sending half of the notification queue
pub type NotificationSender = mpsc::UnboundedSender<Notification>;

/// Drains the notification queue
pub struct NotificationWorker {
    notifier: Arc<dyn Notifier>,
    rx: mpsc::UnboundedReceiver<Notification>,
    shutdown: CancellationToken,
}

impl NotificationWorker {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        rx: mpsc::UnboundedReceiver<Notification>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            notifier,
            rx,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!("Notification worker started");

        loop {
            tokio::select! {
                msg = self.rx.recv() => {
                    match msg {
                        Some(notification) => self.deliver(notification).await,
                        None => {
                            tracing::info!("Notification channel closed, shutting down worker");
                            return;
                        }
                    }
                }
                _ = self.shutdown.cancelled() => {
                    // flush what was already committed
                    while let Ok(notification) = self.rx.try_recv() {
                        self.deliver(notification).await;
                    }
                    tracing::info!("Notification worker received shutdown signal");
                    return;
                }
            }
        }
    }

    async fn deliver(&self, notification: Notification) {
        if let Err(e) = self.notifier.notify(&notification).await {
            tracing::warn!(
                party_id = %notification.party_id,
                title = %notification.title,
                error = %e,
                "Notification delivery failed"
            );
        }
    }
}
