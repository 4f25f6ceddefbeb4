pub mod metrics;
pub mod notifier;
pub mod webhook;

pub use metrics::{get_metrics, init_metrics};
pub use notifier::{send_with_timeout, Notifier, NotifyError, NotifyOutcome};
pub use webhook::{MockNotifier, WebhookNotifier};
