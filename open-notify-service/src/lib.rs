//! open-notify-service: redirects link opens to their document and reports
//! each open to an automation webhook.

pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
