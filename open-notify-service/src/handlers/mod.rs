//! HTTP handlers for open-notify-service.

pub mod health;
pub mod metrics;
pub mod open;

pub use health::health_check;
pub use metrics::metrics;
pub use open::open;
