use open_notify_service::config::{OpenNotifyConfig, TelemetryConfig, WebhookConfig};
use open_notify_service::startup::Application;
use service_core::config::Config as CoreConfig;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    /// Client that does not follow redirects.
    pub client: reqwest::Client,
}

pub fn test_config(webhook_url: String, timeout_ms: u64) -> OpenNotifyConfig {
    OpenNotifyConfig {
        // Use random port for testing (port 0)
        common: CoreConfig { port: 0 },
        webhook: WebhookConfig {
            url: webhook_url,
            timeout_ms,
            request_timeout_secs: 30,
            enabled: true,
        },
        telemetry: TelemetryConfig {
            log_level: "debug".to_string(),
            otlp_endpoint: None,
        },
    }
}

impl TestApp {
    pub async fn spawn(webhook_url: String) -> Self {
        Self::spawn_with_config(test_config(webhook_url, 2000)).await
    }

    pub async fn spawn_with_config(config: OpenNotifyConfig) -> Self {
        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to build test client");

        // Wait for HTTP server to be ready by polling health endpoint
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
        }
    }

    /// `GET /open` with the given query pairs.
    pub async fn open(&self, query: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .get(format!("{}/open", self.address))
            .query(query)
            .send()
            .await
            .expect("Failed to execute request")
    }
}
