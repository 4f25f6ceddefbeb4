use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Receiver used when `WEBHOOK_URL` is not set.
pub const DEFAULT_WEBHOOK_URL: &str = "https://hook.us2.make.com/lykie2r6pvzbig8sb994g8vliud9uhvm";

#[derive(Debug, Clone, Deserialize)]
pub struct OpenNotifyConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub webhook: WebhookConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
    /// How long a redirect waits for the webhook before giving up on it.
    pub timeout_ms: u64,
    /// Hard limit for the HTTP call itself, including after the redirect
    /// stopped waiting for it.
    pub request_timeout_secs: u64,
    /// When false, notifications are only logged.
    pub enabled: bool,
}

impl WebhookConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_WEBHOOK_URL.to_string(),
            timeout_ms: 2000,
            request_timeout_secs: 30,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

impl OpenNotifyConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let defaults = WebhookConfig::default();

        Ok(OpenNotifyConfig {
            common: common_config,
            webhook: WebhookConfig {
                url: get_env("WEBHOOK_URL", &defaults.url),
                timeout_ms: parse_env("WEBHOOK_TIMEOUT_MS", defaults.timeout_ms)?,
                request_timeout_secs: parse_env(
                    "WEBHOOK_REQUEST_TIMEOUT_SECS",
                    defaults.request_timeout_secs,
                )?,
                enabled: parse_env("WEBHOOK_ENABLED", defaults.enabled)?,
            },
            telemetry: TelemetryConfig {
                log_level: get_env("LOG_LEVEL", "info"),
                otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|e| !e.is_empty()),
            },
        })
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => parse_value(key, &val),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, val: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    val.trim().parse().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, val, e))
    })
}
