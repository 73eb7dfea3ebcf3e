//! Provider credentials and the route they select.

use serde::Serialize;
use std::fmt;

/// Postman transactional email endpoint.
pub const DEFAULT_POSTMAN_API_URL: &str = "https://api.postman.gov.sg/v1/transactional/email/send";

/// Provider credentials. A provider is configured when its credentials are
/// present; SendGrid additionally needs a verified sender address.
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Postman bearer credential.
    pub postman_api_key: Option<String>,
    /// Postman send endpoint.
    pub postman_api_url: String,
    /// SendGrid API key.
    pub sendgrid_api_key: Option<String>,
    /// Verified SendGrid sender.
    pub sendgrid_from_address: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            postman_api_key: None,
            postman_api_url: DEFAULT_POSTMAN_API_URL.to_string(),
            sendgrid_api_key: None,
            sendgrid_from_address: None,
            timeout_secs: 30,
        }
    }
}

impl MailConfig {
    /// Read credentials through `lookup`: `POSTMAN_API_KEY`,
    /// `POSTMAN_API_URL`, `SENDGRID_API_KEY`, `SENDGRID_FROM_ADDRESS`.
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            postman_api_key: get("POSTMAN_API_KEY"),
            postman_api_url: get("POSTMAN_API_URL").unwrap_or_else(|| DEFAULT_POSTMAN_API_URL.to_string()),
            sendgrid_api_key: get("SENDGRID_API_KEY"),
            sendgrid_from_address: get("SENDGRID_FROM_ADDRESS"),
            ..Default::default()
        }
    }

    pub fn postman_configured(&self) -> bool {
        self.postman_api_key.is_some()
    }

    pub fn sendgrid_configured(&self) -> bool {
        self.sendgrid_api_key.is_some() && self.sendgrid_from_address.is_some()
    }
}

/// Where a notification goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryRoute {
    Postman,
    Sendgrid,
    LogOnly,
}

impl DeliveryRoute {
    pub const fn as_str(self) -> &'static str {
        match self {
            DeliveryRoute::Postman => "postman",
            DeliveryRoute::Sendgrid => "sendgrid",
            DeliveryRoute::LogOnly => "log_only",
        }
    }
}

impl fmt::Display for DeliveryRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Route chosen by fixed precedence: Postman, then SendGrid, then log only.
pub fn resolve_route(config: &MailConfig) -> DeliveryRoute {
    if config.postman_configured() {
        DeliveryRoute::Postman
    } else if config.sendgrid_configured() {
        DeliveryRoute::Sendgrid
    } else {
        DeliveryRoute::LogOnly
    }
}
