//! # Notification dispatch
//!
//! Delivers a message to one recipient through the first configured
//! provider: Postman, then SendGrid. A provider's failure is returned to the
//! caller; there is no fallback to the next provider once one was tried.
//! Without any provider configured the message is written to the log at
//! `warn`, so local and test environments need no live credentials.

mod config;
mod dispatcher;
mod error;
pub mod provider;

pub use config::{resolve_route, DeliveryRoute, MailConfig, DEFAULT_POSTMAN_API_URL};
pub use dispatcher::NotificationDispatcher;
pub use error::{DeliveryError, DeliveryResult};
pub use provider::MailProvider;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One message to one recipient. `body` may contain HTML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl NotificationRequest {
    pub fn new(recipient: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// The request as log record fields.
    pub fn to_fields(&self) -> Value {
        serde_json::json!({
            "recipient": self.recipient,
            "subject": self.subject,
            "body": self.body,
        })
    }
}
