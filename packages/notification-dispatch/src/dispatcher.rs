//! Picks the first configured provider, or logs the mail when none is.

use crate::provider::{MailProvider, PostmanProvider, SendgridProvider};
use crate::{resolve_route, DeliveryResult, MailConfig, NotificationRequest};
use observability::Logger;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Sends each notification through at most one provider.
///
/// Providers are tried in priority order; the first configured one is used
/// and its outcome is final. With none configured the message is logged at
/// `warn` instead.
pub struct NotificationDispatcher {
    providers: Vec<Arc<dyn MailProvider>>,
}

impl NotificationDispatcher {
    /// Dispatcher over `providers`, highest priority first.
    pub fn new(providers: Vec<Arc<dyn MailProvider>>) -> Self {
        Self { providers }
    }

    /// Postman, then SendGrid, sharing one HTTP client.
    pub fn from_config(config: &MailConfig) -> DeliveryResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        info!(route = %resolve_route(config), "Notification route resolved");

        Ok(Self::new(vec![
            Arc::new(PostmanProvider::new(
                client.clone(),
                config.postman_api_url.clone(),
                config.postman_api_key.clone(),
            )),
            Arc::new(SendgridProvider::new(
                client,
                config.sendgrid_api_key.clone(),
                config.sendgrid_from_address.clone(),
            )),
        ]))
    }

    /// Id of the provider the next call would use.
    pub fn active_provider(&self) -> Option<&'static str> {
        self.providers
            .iter()
            .find(|p| p.is_configured())
            .map(|p| p.id())
    }

    pub async fn send(&self, request: &NotificationRequest, logger: &Logger) -> DeliveryResult<()> {
        if let Some(provider) = self.providers.iter().find(|p| p.is_configured()) {
            debug!(provider = provider.id(), "Dispatching notification");
            return provider.send(request).await;
        }

        logger.warn(
            request.to_fields(),
            format!(
                "POSTMAN_API_KEY or SENDGRID_API_KEY missing. Logging mail:\nTo: {}\nSubject: {}\n{}",
                request.recipient, request.subject, request.body
            ),
        );
        Ok(())
    }
}
