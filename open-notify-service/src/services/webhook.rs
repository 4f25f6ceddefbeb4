use super::{Notifier, NotifyError};
use crate::config::WebhookConfig;
use crate::models::NotificationPayload;
use async_trait::async_trait;
use reqwest::Client;
use service_core::error::AppError;
use service_core::observability::TracedClientExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Posts payloads as JSON to the configured automation webhook.
pub struct WebhookNotifier {
    url: String,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(config: &WebhookConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Failed to build webhook client: {}", e))
            })?;

        Ok(Self {
            url: config.url.clone(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, payload: &NotificationPayload) -> Result<(), NotifyError> {
        let response = self
            .client
            .traced_post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| NotifyError::Connection(format!("Failed to reach webhook: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
            });
        }

        tracing::debug!(status = %status, url = %self.url, "Webhook accepted notification");

        Ok(())
    }
}

/// Notifier that never leaves the process. Used when the webhook is
/// disabled, and in tests.
pub struct MockNotifier {
    reject_with: Option<u16>,
    delay: Duration,
    send_count: AtomicU64,
    delivered_count: AtomicU64,
}

impl MockNotifier {
    pub fn accepting() -> Self {
        Self {
            reject_with: None,
            delay: Duration::ZERO,
            send_count: AtomicU64::new(0),
            delivered_count: AtomicU64::new(0),
        }
    }

    pub fn rejecting(status: u16) -> Self {
        Self {
            reject_with: Some(status),
            ..Self::accepting()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of sends started.
    pub fn send_count(&self) -> u64 {
        self.send_count.load(Ordering::SeqCst)
    }

    /// Number of sends that ran to completion and succeeded.
    pub fn delivered_count(&self) -> u64 {
        self.delivered_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send(&self, payload: &NotificationPayload) -> Result<(), NotifyError> {
        self.send_count.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if let Some(status) = self.reject_with {
            return Err(NotifyError::Rejected { status });
        }

        self.delivered_count.fetch_add(1, Ordering::SeqCst);

        tracing::info!(
            email = %payload.email,
            doc = %payload.doc,
            "[MOCK] Webhook notification would be sent"
        );

        Ok(())
    }
}
