//! Correlation between call logs and the active distributed trace.

use crate::context::RawRequest;
use http::header::HeaderName;
use opentelemetry::trace::TraceContextExt;
use opentelemetry::{Context, KeyValue};

/// Header carrying the upstream trace id.
pub const DEFAULT_TRACE_ID_HEADER: &str = "x-datadog-trace-id";

/// Trace id of the span active in the current OpenTelemetry context.
pub fn active_trace_id() -> Option<String> {
    let cx = Context::current();
    let span = cx.span();
    let span_context = span.span_context();
    span_context
        .is_valid()
        .then(|| span_context.trace_id().to_string())
}

/// Tag the active span with the resource name `<METHOD> /api/trpc/<path>`.
/// Returns whether a span was active.
pub fn tag_active_span(method: &http::Method, path: &str) -> bool {
    let cx = Context::current();
    if !cx.has_active_span() {
        return false;
    }
    cx.span().set_attribute(KeyValue::new(
        "resource.name",
        format!("{method} /api/trpc/{path}"),
    ));
    true
}

/// Correlation id for a call: the inbound header when present and non-empty,
/// else the active trace id.
pub fn correlation_id(request: &RawRequest, header: &HeaderName) -> Option<String> {
    request
        .header(header)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .or_else(active_trace_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::HeaderValue;
    use http::Method;
    use opentelemetry::trace::{SpanContext, SpanId, TraceFlags, TraceId, TraceState};

    fn remote_context(trace_hex: &str) -> Context {
        let span_context = SpanContext::new(
            TraceId::from_hex(trace_hex).unwrap(),
            SpanId::from_hex("00f067aa0ba902b7").unwrap(),
            TraceFlags::SAMPLED,
            true,
            TraceState::default(),
        );
        Context::current().with_remote_span_context(span_context)
    }

    #[test]
    fn test_no_span_means_no_trace_id() {
        assert_eq!(active_trace_id(), None);
        assert!(!tag_active_span(&Method::GET, "me.get"));
    }

    #[test]
    fn test_header_wins_over_active_span() {
        let header = HeaderName::from_static(DEFAULT_TRACE_ID_HEADER);
        let request = RawRequest::new(Method::GET)
            .with_header(header.clone(), HeaderValue::from_static("1234567890"));

        let _guard = remote_context("4bf92f3577b34da6a3ce929d0e0e4736").attach();
        assert_eq!(correlation_id(&request, &header).as_deref(), Some("1234567890"));
    }

    #[test]
    fn test_falls_back_to_active_span() {
        let header = HeaderName::from_static(DEFAULT_TRACE_ID_HEADER);
        let request = RawRequest::new(Method::GET)
            .with_header(header.clone(), HeaderValue::from_static("  "));

        assert_eq!(correlation_id(&request, &header), None);

        let _guard = remote_context("4bf92f3577b34da6a3ce929d0e0e4736").attach();
        assert_eq!(
            correlation_id(&request, &header).as_deref(),
            Some("4bf92f3577b34da6a3ce929d0e0e4736")
        );
        assert!(tag_active_span(&Method::GET, "me.get"));
    }
}
