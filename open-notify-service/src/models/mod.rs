pub mod open_event;

pub use open_event::{NotificationPayload, OpenEvent, DESTINATION_PARAM, IDENTIFIER_PARAM};
