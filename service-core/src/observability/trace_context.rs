//! W3C Trace Context propagation for outbound HTTP calls.
//!
//! Upstream calls made while handling a request carry the current span's
//! `traceparent` (and `tracestate`, when present) so the upstream's own traces
//! can be joined with ours.
//!
//! See: https://www.w3.org/TR/trace-context/

use opentelemetry::trace::TraceContextExt;
use reqwest::header::HeaderMap;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Header name for W3C traceparent
pub const TRACEPARENT_HEADER: &str = "traceparent";

/// Header name for W3C tracestate
pub const TRACESTATE_HEADER: &str = "tracestate";

/// Writes the current span's trace context into `headers`.
///
/// Leaves `headers` untouched when there is no valid OpenTelemetry context,
/// e.g. when OTLP export is disabled.
pub fn inject_trace_context(headers: &mut HeaderMap) {
    let context = Span::current().context();
    let otel_span = context.span();
    let span_context = otel_span.span_context();

    if !span_context.is_valid() {
        return;
    }

    // version-trace_id-span_id-trace_flags
    let traceparent = format!(
        "00-{}-{}-{:02x}",
        span_context.trace_id(),
        span_context.span_id(),
        span_context.trace_flags().to_u8()
    );
    if let Ok(value) = traceparent.parse() {
        headers.insert(TRACEPARENT_HEADER, value);
    }

    let tracestate = span_context.trace_state().header();
    if !tracestate.is_empty() {
        if let Ok(value) = tracestate.parse() {
            headers.insert(TRACESTATE_HEADER, value);
        }
    }
}

/// Extension for `reqwest::RequestBuilder` that attaches trace headers.
pub trait TracedRequestExt {
    fn with_trace_context(self) -> Self;
}

impl TracedRequestExt for reqwest::RequestBuilder {
    fn with_trace_context(self) -> Self {
        let mut headers = HeaderMap::new();
        inject_trace_context(&mut headers);
        self.headers(headers)
    }
}
