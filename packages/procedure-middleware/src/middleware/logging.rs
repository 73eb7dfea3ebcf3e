//! Logging interceptor: per-call child logger, span tagging, and exactly one
//! exit record per call.

use super::{Middleware, Next, ProcedureResult};
use crate::context::{CallContext, ProcedureType};
use crate::trace::{correlation_id, tag_active_span, DEFAULT_TRACE_ID_HEADER};
use crate::{ErrorCode, RpcError};
use futures_util::future::BoxFuture;
use http::header::HeaderName;
use observability::Logger;
use serde_json::{json, Value};
use std::time::Instant;

/// First stage of every procedure.
#[derive(Debug, Clone)]
pub struct LoggingMiddleware {
    base: Logger,
    trace_header: HeaderName,
}

impl LoggingMiddleware {
    pub fn new(base: Logger) -> Self {
        Self {
            base,
            trace_header: HeaderName::from_static(DEFAULT_TRACE_ID_HEADER),
        }
    }

    /// Read the correlation id from `header` instead of `x-datadog-trace-id`.
    pub fn with_trace_header(mut self, header: HeaderName) -> Self {
        self.trace_header = header;
        self
    }

    pub fn trace_header(&self) -> &HeaderName {
        &self.trace_header
    }

    fn call_logger(&self, ctx: &CallContext) -> Logger {
        let request = ctx.raw_request();
        let mut bindings = json!({
            "path": ctx.procedure_path(),
            "requestHeaders": request.headers_json(),
        });
        if let Some(trace_id) = correlation_id(request, &self.trace_header) {
            bindings["trace_id"] = Value::String(trace_id);
        }
        self.base.child(bindings)
    }
}

impl Middleware for LoggingMiddleware {
    fn name(&self) -> &'static str {
        "logging"
    }

    fn handle<'a>(&'a self, ctx: CallContext, next: Next<'a>) -> BoxFuture<'a, ProcedureResult> {
        let start = Instant::now();
        let logger = self.call_logger(&ctx);
        tag_active_span(&ctx.raw_request().method, ctx.procedure_path());

        let mut exit = ExitRecord {
            logger: logger.clone(),
            procedure_type: ctx.procedure_type(),
            path: ctx.procedure_path().to_string(),
            start,
            written: false,
        };
        let ctx = ctx.with_logger(logger);

        Box::pin(async move {
            let outcome = next.run(ctx).await;
            exit.write(&outcome);
            outcome
        })
    }
}

/// Writes the exit record. If the call future is dropped first (client went
/// away, outer timeout) or the handler panics, the record is written on drop.
struct ExitRecord {
    logger: Logger,
    procedure_type: ProcedureType,
    path: String,
    start: Instant,
    written: bool,
}

impl ExitRecord {
    fn write(&mut self, outcome: &ProcedureResult) {
        match outcome {
            Ok(_) => self.success(),
            Err(err) => self.failure(err),
        }
        self.written = true;
    }

    fn duration_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn success(&self) {
        let duration = self.duration_ms();
        self.logger.info(
            json!({ "durationInMs": duration }),
            format!("[{}]: {} - {}ms - OK", self.procedure_type, self.path, duration),
        );
    }

    fn failure(&self, err: &RpcError) {
        let duration = self.duration_ms();
        self.logger.error(
            json!({
                "durationInMs": duration,
                "error_code": err.code(),
                "error_message": err.message(),
                "error_stack": err.stack(),
            }),
            format!(
                "[{}]: {} - {}ms - {} {}",
                self.procedure_type,
                self.path,
                duration,
                err.code(),
                err.message()
            ),
        );
    }
}

impl Drop for ExitRecord {
    fn drop(&mut self) {
        if self.written {
            return;
        }
        let err = if std::thread::panicking() {
            RpcError::with_message(ErrorCode::InternalServerError, "procedure panicked")
        } else {
            RpcError::new(ErrorCode::ClientClosedRequest)
        };
        self.failure(&err);
    }
}
