//! Test harness for procedure call scenarios.
//!
//! Provides:
//! - TestApp: a router with `getUser` (protected), `slow` (protected),
//!   `pause` and `health` (public), wired to a memory sink and an in-memory user store
//! - request helpers with and without correlation headers

use http::header::{HeaderName, HeaderValue};
use http::Method;
use observability::sink::MemorySink;
use observability::{Environment, LogLevel, LogRecord, Logger};
use procedure_middleware::{
    InMemoryUserStore, ProcedureFactory, RawRequest, Router, Session, SessionUser, UserRecord,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How long the `pause` procedure sleeps.
pub const PAUSE: Duration = Duration::from_millis(40);

pub struct TestApp {
    pub router: Router,
    pub sink: MemorySink,
    pub store: Arc<InMemoryUserStore>,
    pub handler_runs: Arc<AtomicUsize>,
}

impl TestApp {
    pub fn new() -> Self {
        let sink = MemorySink::new();
        let logger = Logger::with_sink(Environment::Test, LogLevel::Debug, Arc::new(sink.clone()));
        let store = Arc::new(InMemoryUserStore::with_users([
            UserRecord::new("u1"),
            UserRecord::new("u2"),
        ]));
        let handler_runs = Arc::new(AtomicUsize::new(0));
        let factory = ProcedureFactory::new(logger, store.clone());

        let runs = Arc::clone(&handler_runs);
        let get_user = factory.protected_procedure().query(move |ctx, _| {
            runs.fetch_add(1, Ordering::SeqCst);
            let session = ctx.session().cloned();
            async move { Ok(serde_json::to_value(session).unwrap_or(Value::Null)) }
        });

        let slow = factory.protected_procedure().mutation(|_, _| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Value::Null)
        });

        let pause = factory.public_procedure().query(|_, _| async {
            tokio::time::sleep(PAUSE).await;
            Ok(Value::Null)
        });

        let health = factory
            .public_procedure()
            .query(|_, _| async { Ok(json!({ "status": "ok" })) });

        let router = Router::new()
            .procedure("getUser", get_user)
            .procedure("slow", slow)
            .procedure("pause", pause)
            .procedure("health", health);

        Self {
            router,
            sink,
            store,
            handler_runs,
        }
    }

    pub fn handler_runs(&self) -> usize {
        self.handler_runs.load(Ordering::SeqCst)
    }

    /// Records whose message is a call exit line.
    pub fn exit_records(&self) -> Vec<LogRecord> {
        self.sink
            .records()
            .into_iter()
            .filter(|r| r.message().starts_with('['))
            .collect()
    }
}

pub fn session_for(id: &str) -> Option<Session> {
    Some(Session::for_user(SessionUser::new(id)))
}

pub fn request() -> RawRequest {
    RawRequest::new(Method::POST)
        .with_header(HeaderName::from_static("content-type"), HeaderValue::from_static("application/json"))
}

pub fn request_with_trace(trace_id: &'static str) -> RawRequest {
    request().with_header(
        HeaderName::from_static("x-datadog-trace-id"),
        HeaderValue::from_static(trace_id),
    )
}
