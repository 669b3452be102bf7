//! Trace-context extraction from inbound message headers.
//!
//! Headers are read with the W3C `traceparent`/`tracestate` propagator. The
//! propagator is owned here rather than taken from the global registry, so
//! extraction works without any process-wide setup.

use opentelemetry::propagation::{Extractor, TextMapPropagator};
use opentelemetry::trace::TraceContextExt;
use opentelemetry::Context;
use opentelemetry_sdk::propagation::TraceContextPropagator;

use super::message::MessageHeaders;

impl Extractor for MessageHeaders {
    fn get(&self, key: &str) -> Option<&str> {
        MessageHeaders::get(self, key)
    }

    fn keys(&self) -> Vec<&str> {
        MessageHeaders::keys(self).collect()
    }
}

/// Extract the remote parent context carried by `headers`
pub fn extract_context(headers: &MessageHeaders) -> Context {
    TraceContextPropagator::new().extract(headers)
}

/// Trace id of the remote parent, if the headers carried a valid one
pub fn trace_id(headers: &MessageHeaders) -> Option<String> {
    if headers.is_empty() {
        return None;
    }
    let context = extract_context(headers);
    let span = context.span();
    let span_context = span.span_context();
    span_context
        .is_valid()
        .then(|| span_context.trace_id().to_string())
}
