use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use std::collections::HashMap;

use crate::models::OpenEvent;
use crate::services::send_with_timeout;
use crate::startup::AppState;
use service_core::error::AppError;

/// `GET /open?doc=<url>&email=<id>&...`
///
/// Notifies the webhook (waiting at most the configured timeout) and then
/// redirects to `doc` with a 302, whatever the webhook did.
#[tracing::instrument(skip_all)]
pub async fn open(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    tracing::info!(params = ?params, "Incoming open request");

    let event = OpenEvent::from_query(params)?;

    // CR/LF and other control bytes can't go into a Location header
    let location = HeaderValue::from_bytes(event.destination.as_bytes())
        .map_err(|_| AppError::BadRequest(anyhow::anyhow!("Invalid doc parameter")))?;

    let payload = event.to_payload(Utc::now());
    let outcome = send_with_timeout(
        state.notifier.clone(),
        payload,
        state.config.webhook.timeout(),
    )
    .await;

    tracing::info!(
        outcome = %outcome,
        destination = %event.destination,
        "Redirecting"
    );

    Ok((
        StatusCode::FOUND,
        [
            (header::LOCATION, location),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
        ],
    )
        .into_response())
}
