//! Best-effort delivery of open events with a bounded wait.

use crate::models::NotificationPayload;
use async_trait::async_trait;
use metrics::counter;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::Instrument;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Webhook rejected notification with status {status}")]
    Rejected { status: u16 },
}

/// Something that can deliver a notification payload.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, payload: &NotificationPayload) -> Result<(), NotifyError>;
}

/// How the notification step ended. Callers treat every variant the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    Delivered,
    Rejected,
    TimedOut,
}

impl NotifyOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyOutcome::Delivered => "delivered",
            NotifyOutcome::Rejected => "rejected",
            NotifyOutcome::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for NotifyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deliver `payload`, waiting at most `timeout` for the result.
///
/// The delivery runs as its own task raced against a timer. If the timer
/// fires first the task is detached, not cancelled: it finishes in the
/// background and its result is dropped. Never fails.
pub async fn send_with_timeout(
    notifier: Arc<dyn Notifier>,
    payload: NotificationPayload,
    timeout: Duration,
) -> NotifyOutcome {
    tracing::info!(payload = ?payload, "Sending webhook notification");

    let delivery = tokio::spawn(
        async move { notifier.send(&payload).await }.instrument(tracing::Span::current()),
    );
    let timer = tokio::time::sleep(timeout);

    let outcome = tokio::select! {
        // a delivery that settles on the same poll as the timer counts
        biased;

        joined = delivery => match joined {
            Ok(Ok(())) => {
                tracing::info!("Webhook notification delivered");
                NotifyOutcome::Delivered
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Webhook notification failed");
                NotifyOutcome::Rejected
            }
            Err(e) => {
                tracing::error!(error = %e, "Webhook delivery task aborted");
                NotifyOutcome::Rejected
            }
        },
        _ = timer => {
            tracing::warn!(
                timeout_ms = timeout.as_millis() as u64,
                "Webhook notification timed out, redirecting without it"
            );
            NotifyOutcome::TimedOut
        }
    };

    counter!("webhook_notifications_total", "outcome" => outcome.as_str()).increment(1);

    outcome
}
