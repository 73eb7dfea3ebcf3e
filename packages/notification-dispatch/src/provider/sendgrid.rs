//! SendGrid v3 mail send provider.

use super::{check_response, MailProvider};
use crate::{DeliveryError, DeliveryResult, NotificationRequest};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// SendGrid v3 mail send. Needs an API key and a verified sender address.
pub struct SendgridProvider {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    from_address: Option<String>,
}

impl SendgridProvider {
    pub fn new(client: Client, api_key: Option<String>, from_address: Option<String>) -> Self {
        Self {
            client,
            api_url: SENDGRID_SEND_URL.to_string(),
            api_key,
            from_address,
        }
    }

    /// Send to `api_url` instead of the public endpoint.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct MailSend<'a> {
    personalizations: [Personalization<'a>; 1],
    from: Address<'a>,
    subject: &'a str,
    content: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: [Address<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'a str,
}

/// `{from, to, subject, html}` as a SendGrid send body.
fn mail_send<'a>(from: &'a str, request: &'a NotificationRequest) -> MailSend<'a> {
    MailSend {
        personalizations: [Personalization {
            to: [Address {
                email: &request.recipient,
            }],
        }],
        from: Address { email: from },
        subject: &request.subject,
        content: [Content {
            kind: "text/html",
            value: &request.body,
        }],
    }
}

#[async_trait]
impl MailProvider for SendgridProvider {
    fn id(&self) -> &'static str {
        "sendgrid"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.from_address.is_some()
    }

    async fn send(&self, request: &NotificationRequest) -> DeliveryResult<()> {
        let (Some(api_key), Some(from)) = (&self.api_key, &self.from_address) else {
            return Err(DeliveryError::NotConfigured(self.id()));
        };

        debug!(recipient = %request.recipient, "Sending mail via SendGrid");

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&mail_send(from, request))
            .send()
            .await?;

        check_response(self.id(), response).await
    }
}
