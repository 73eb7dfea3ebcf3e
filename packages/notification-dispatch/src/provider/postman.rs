//! Postman transactional email provider.

use super::{check_response, MailProvider};
use crate::{DeliveryError, DeliveryResult, NotificationRequest};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// Postman transactional email. Posts the request as-is with a bearer
/// credential.
pub struct PostmanProvider {
    client: Client,
    api_url: String,
    api_key: Option<String>,
}

impl PostmanProvider {
    pub fn new(client: Client, api_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl MailProvider for PostmanProvider {
    fn id(&self) -> &'static str {
        "postman"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn send(&self, request: &NotificationRequest) -> DeliveryResult<()> {
        let Some(api_key) = &self.api_key else {
            return Err(DeliveryError::NotConfigured(self.id()));
        };

        debug!(url = %self.api_url, recipient = %request.recipient, "Sending mail via Postman");

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await?;

        check_response(self.id(), response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::stub_server;
    use serde_json::json;

    #[tokio::test]
    async fn test_unconfigured_send_fails_without_network() {
        let provider = PostmanProvider::new(Client::new(), "http://127.0.0.1:9/send", None);
        assert!(!provider.is_configured());

        let request = NotificationRequest::new("a@b.com", "S", "B");
        let err = provider.send(&request).await.unwrap_err();
        assert!(matches!(err, DeliveryError::NotConfigured("postman")));
    }

    #[tokio::test]
    async fn test_posts_request_with_bearer_credential() {
        let (url, server) = stub_server::serve_once(202, "").await;
        let provider = PostmanProvider::new(stub_server::client(), url, Some("pm-key".into()));

        let request = NotificationRequest::new("a@b.com", "Welcome", "<p>hi</p>");
        provider.send(&request).await.unwrap();

        let seen = server.await.unwrap();
        assert_eq!(seen.request_line, "POST /send HTTP/1.1");
        assert_eq!(seen.header("authorization"), Some("Bearer pm-key"));
        assert_eq!(seen.header("content-type"), Some("application/json"));
        assert_eq!(
            seen.body,
            json!({ "recipient": "a@b.com", "subject": "Welcome", "body": "<p>hi</p>" })
        );
    }

    #[tokio::test]
    async fn test_error_status_is_rejected_with_body() {
        let (url, server) = stub_server::serve_once(500, "nope").await;
        let provider = PostmanProvider::new(stub_server::client(), url, Some("pm-key".into()));

        let request = NotificationRequest::new("a@b.com", "S", "B");
        let err = provider.send(&request).await.unwrap_err();
        server.await.unwrap();

        match err {
            DeliveryError::Rejected {
                provider,
                status,
                body,
            } => {
                assert_eq!(provider, "postman");
                assert_eq!(status, 500);
                assert_eq!(body, "nope");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }
}
