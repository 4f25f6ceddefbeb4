mod common;

use chrono::DateTime;
use common::{test_config, TestApp};
use reqwest::StatusCode;
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn webhook_responding(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

fn hook_url(server: &MockServer) -> String {
    format!("{}/hook", server.uri())
}

async fn received_payloads(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .expect("Request recording is enabled")
        .iter()
        .map(|request| serde_json::from_slice(&request.body).expect("Payload is JSON"))
        .collect()
}

fn assert_redirects_to(response: &reqwest::Response, destination: &str) {
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()["location"], destination);
    assert_eq!(response.headers()["cache-control"], "no-cache");
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn health_check_works() {
    let webhook = webhook_responding(200).await;
    let app = TestApp::spawn(hook_url(&webhook)).await;

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "open-notify-service");
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn missing_doc_returns_400_without_notifying() {
    let webhook = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&webhook)
        .await;
    let app = TestApp::spawn(hook_url(&webhook)).await;

    let response = app.open(&[("email", "a@b.com")]).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()["content-type"], "application/json");
    assert_eq!(
        response.text().await.unwrap(),
        r#"{"error":"Missing doc parameter"}"#
    );
}

#[tokio::test]
async fn empty_doc_returns_400_without_notifying() {
    let webhook = webhook_responding(200).await;
    let app = TestApp::spawn(hook_url(&webhook)).await;

    let response = app.open(&[("doc", ""), ("email", "a@b.com")]).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(received_payloads(&webhook).await.is_empty());
}

#[tokio::test]
async fn no_query_string_returns_400() {
    let webhook = webhook_responding(200).await;
    let app = TestApp::spawn(hook_url(&webhook)).await;

    let response = app.open(&[]).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(received_payloads(&webhook).await.is_empty());
}

#[tokio::test]
async fn doc_with_line_break_is_rejected() {
    let webhook = webhook_responding(200).await;
    let app = TestApp::spawn(hook_url(&webhook)).await;

    let response = app
        .open(&[("doc", "https://example.com/\r\nSet-Cookie: x=1")])
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid doc parameter");
    assert!(received_payloads(&webhook).await.is_empty());
}

// =============================================================================
// Redirect + notification
// =============================================================================

#[tokio::test]
async fn healthy_webhook_gets_payload_and_caller_is_redirected() {
    let webhook = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&webhook)
        .await;
    let app = TestApp::spawn(hook_url(&webhook)).await;

    let response = app
        .open(&[("doc", "https://example.com/file.pdf"), ("email", "a@b.com")])
        .await;

    assert_redirects_to(&response, "https://example.com/file.pdf");
    assert!(response.text().await.unwrap().is_empty());

    let payloads = received_payloads(&webhook).await;
    assert_eq!(payloads.len(), 1);
    let payload = &payloads[0];
    assert_eq!(payload["email"], "a@b.com");
    assert_eq!(payload["doc"], "https://example.com/file.pdf");
    let timestamp = payload["timestamp"].as_str().expect("timestamp is a string");
    assert!(DateTime::parse_from_rfc3339(timestamp).is_ok());
    assert_eq!(payload.as_object().unwrap().len(), 3);
}

#[tokio::test]
async fn attribution_parameters_pass_through_verbatim() {
    let webhook = webhook_responding(200).await;
    let app = TestApp::spawn(hook_url(&webhook)).await;

    let response = app
        .open(&[
            ("doc", "https://example.com/file.pdf"),
            ("utm_campaign", "spring"),
            ("utm_source", "newsletter"),
            ("source", "footer link"),
            ("partner_ref", "ab&c=d"),
        ])
        .await;

    assert_redirects_to(&response, "https://example.com/file.pdf");

    let payloads = received_payloads(&webhook).await;
    assert_eq!(payloads.len(), 1);
    let payload = &payloads[0];
    assert_eq!(payload["email"], "");
    assert_eq!(payload["utm_campaign"], "spring");
    assert_eq!(payload["utm_source"], "newsletter");
    assert_eq!(payload["source"], "footer link");
    assert_eq!(payload["partner_ref"], "ab&c=d");
}

#[tokio::test]
async fn failing_webhook_still_redirects() {
    let webhook = webhook_responding(500).await;
    let app = TestApp::spawn(hook_url(&webhook)).await;

    let response = app.open(&[("doc", "https://example.com/file.pdf")]).await;

    assert_redirects_to(&response, "https://example.com/file.pdf");
    assert_eq!(received_payloads(&webhook).await.len(), 1);
}

#[tokio::test]
async fn unreachable_webhook_still_redirects() {
    // nothing listens on port 1
    let app = TestApp::spawn("http://127.0.0.1:1/hook".to_string()).await;

    let response = app.open(&[("doc", "https://example.com/file.pdf")]).await;

    assert_redirects_to(&response, "https://example.com/file.pdf");
}

#[tokio::test]
async fn hanging_webhook_redirects_at_the_timeout() {
    let webhook = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&webhook)
        .await;
    let app = TestApp::spawn_with_config(test_config(hook_url(&webhook), 300)).await;

    let started = Instant::now();
    let response = app.open(&[("doc", "https://example.com/file.pdf")]).await;
    let elapsed = started.elapsed();

    assert_redirects_to(&response, "https://example.com/file.pdf");
    assert!(elapsed >= Duration::from_millis(300), "returned before the bound: {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(5), "waited too long: {:?}", elapsed);
}

#[tokio::test]
async fn slow_webhook_within_bound_is_awaited() {
    let webhook = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
        .expect(1)
        .mount(&webhook)
        .await;
    let app = TestApp::spawn(hook_url(&webhook)).await;

    let started = Instant::now();
    let response = app.open(&[("doc", "https://example.com/file.pdf")]).await;

    assert_redirects_to(&response, "https://example.com/file.pdf");
    assert!(started.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn disabled_webhook_redirects_without_calling_out() {
    let webhook = webhook_responding(200).await;
    let mut config = test_config(hook_url(&webhook), 2000);
    config.webhook.enabled = false;
    let app = TestApp::spawn_with_config(config).await;

    let response = app.open(&[("doc", "https://example.com/file.pdf")]).await;

    assert_redirects_to(&response, "https://example.com/file.pdf");
    assert!(received_payloads(&webhook).await.is_empty());
}
