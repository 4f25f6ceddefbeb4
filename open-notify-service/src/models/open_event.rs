use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use service_core::error::AppError;
use std::collections::{BTreeMap, HashMap};

/// Query parameter holding the redirect target.
pub const DESTINATION_PARAM: &str = "doc";
/// Query parameter holding the email identifier.
pub const IDENTIFIER_PARAM: &str = "email";

const TIMESTAMP_FIELD: &str = "timestamp";

/// A link-open request: where to send the browser and who opened it.
///
/// Everything besides `doc` and `email` lands in `attributes` untouched, so
/// new campaign tags need no code change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenEvent {
    pub destination: String,
    pub identifier: String,
    pub attributes: BTreeMap<String, String>,
}

impl OpenEvent {
    /// Build an event from decoded query parameters.
    ///
    /// Fails only when `doc` is missing or empty.
    pub fn from_query(mut params: HashMap<String, String>) -> Result<Self, AppError> {
        let destination = params
            .remove(DESTINATION_PARAM)
            .filter(|doc| !doc.is_empty())
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Missing doc parameter")))?;

        let identifier = params.remove(IDENTIFIER_PARAM).unwrap_or_default();

        Ok(Self {
            destination,
            identifier,
            attributes: params.into_iter().collect(),
        })
    }

    /// Stamp the event for sending. A caller-supplied `timestamp` attribute
    /// is replaced by `sent_at`.
    pub fn to_payload(&self, sent_at: DateTime<Utc>) -> NotificationPayload {
        let mut attributes = self.attributes.clone();
        attributes.remove(TIMESTAMP_FIELD);

        NotificationPayload {
            email: self.identifier.clone(),
            doc: self.destination.clone(),
            attributes,
            timestamp: sent_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// JSON body posted to the webhook:
/// `{ "email", "doc", ...attributes, "timestamp" }`.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationPayload {
    pub email: String,
    pub doc: String,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, String>,
    pub timestamp: String,
}
