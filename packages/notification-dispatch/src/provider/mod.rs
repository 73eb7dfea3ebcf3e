//! Outbound mail providers.

mod postman;
mod sendgrid;
#[cfg(test)]
mod stub_server;

pub use postman::PostmanProvider;
pub use sendgrid::SendgridProvider;

use crate::{DeliveryError, DeliveryResult, NotificationRequest};
use async_trait::async_trait;
use reqwest::Response;

/// A service able to deliver a [`NotificationRequest`].
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// Short identifier, used in logs and errors.
    fn id(&self) -> &'static str;

    /// Whether credentials for this provider are present.
    fn is_configured(&self) -> bool;

    /// Deliver one message. Failures are final; callers do not retry.
    async fn send(&self, request: &NotificationRequest) -> DeliveryResult<()>;
}

/// Map a non-success response to [`DeliveryError::Rejected`].
async fn check_response(provider: &'static str, response: Response) -> DeliveryResult<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(DeliveryError::Rejected {
        provider,
        status: status.as_u16(),
        body,
    })
}
