//! Provider precedence and the log-only fallback.
//!
//! Covered:
//! - provider A configured: only A is called, even when B is configured too
//! - A failing is terminal: B is never tried
//! - only B configured: B is called
//! - nothing configured: no error, one warn record with recipient and subject

use async_trait::async_trait;
use notification_dispatch::{
    DeliveryError, DeliveryResult, MailProvider, NotificationDispatcher, NotificationRequest,
};
use observability::sink::MemorySink;
use observability::{Environment, LogLevel, Logger};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct FakeProvider {
    id: &'static str,
    configured: bool,
    fail: bool,
    sent: AtomicUsize,
}

impl FakeProvider {
    fn new(id: &'static str, configured: bool) -> Arc<Self> {
        Arc::new(Self {
            id,
            configured,
            fail: false,
            sent: AtomicUsize::new(0),
        })
    }

    fn failing(id: &'static str) -> Arc<Self> {
        Arc::new(Self {
            id,
            configured: true,
            fail: true,
            sent: AtomicUsize::new(0),
        })
    }

    fn sent(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MailProvider for FakeProvider {
    fn id(&self) -> &'static str {
        self.id
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn send(&self, _request: &NotificationRequest) -> DeliveryResult<()> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(DeliveryError::Rejected {
                provider: self.id,
                status: 503,
                body: "unavailable".into(),
            });
        }
        Ok(())
    }
}

fn logger() -> (Logger, MemorySink) {
    let sink = MemorySink::new();
    let logger = Logger::with_sink(Environment::Test, LogLevel::Info, Arc::new(sink.clone()));
    (logger, sink)
}

fn request() -> NotificationRequest {
    NotificationRequest::new("a@b.com", "S", "B")
}

#[tokio::test]
async fn first_provider_wins_when_both_configured() {
    let (logger, sink) = logger();
    let postman = FakeProvider::new("postman", true);
    let sendgrid = FakeProvider::new("sendgrid", true);
    let dispatcher = NotificationDispatcher::new(vec![postman.clone(), sendgrid.clone()]);

    dispatcher.send(&request(), &logger).await.unwrap();

    assert_eq!(postman.sent(), 1);
    assert_eq!(sendgrid.sent(), 0);
    assert!(sink.records().is_empty());
}

#[tokio::test]
async fn first_provider_failure_is_terminal() {
    let (logger, _sink) = logger();
    let postman = FakeProvider::failing("postman");
    let sendgrid = FakeProvider::new("sendgrid", true);
    let dispatcher = NotificationDispatcher::new(vec![postman.clone(), sendgrid.clone()]);

    let err = dispatcher.send(&request(), &logger).await.unwrap_err();

    assert!(matches!(err, DeliveryError::Rejected { status: 503, .. }));
    assert_eq!(postman.sent(), 1);
    assert_eq!(sendgrid.sent(), 0);
}

#[tokio::test]
async fn second_provider_used_when_first_unconfigured() {
    let (logger, _sink) = logger();
    let postman = FakeProvider::new("postman", false);
    let sendgrid = FakeProvider::new("sendgrid", true);
    let dispatcher = NotificationDispatcher::new(vec![postman.clone(), sendgrid.clone()]);

    dispatcher.send(&request(), &logger).await.unwrap();

    assert_eq!(dispatcher.active_provider(), Some("sendgrid"));
    assert_eq!(postman.sent(), 0);
    assert_eq!(sendgrid.sent(), 1);
}

#[tokio::test]
async fn nothing_configured_logs_one_warning() {
    let (logger, sink) = logger();
    let postman = FakeProvider::new("postman", false);
    let sendgrid = FakeProvider::new("sendgrid", false);
    let dispatcher = NotificationDispatcher::new(vec![postman.clone(), sendgrid.clone()]);

    dispatcher.send(&request(), &logger).await.unwrap();

    assert_eq!(postman.sent() + sendgrid.sent(), 0);
    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].level(), LogLevel::Warn);
    assert!(records[0].message().contains("a@b.com"));
    assert!(records[0].message().contains("S"));
    assert_eq!(
        records[0].message(),
        "POSTMAN_API_KEY or SENDGRID_API_KEY missing. Logging mail:\nTo: a@b.com\nSubject: S\nB"
    );
    assert_eq!(records[0].get("recipient"), Some(&json!("a@b.com")));
    assert_eq!(records[0].get("subject"), Some(&json!("S")));
}

#[tokio::test]
async fn empty_dispatcher_degrades_to_log() {
    let (logger, sink) = logger();
    let dispatcher = NotificationDispatcher::new(Vec::new());

    dispatcher.send(&request(), &logger).await.unwrap();
    assert_eq!(sink.records_at(LogLevel::Warn).len(), 1);
}
