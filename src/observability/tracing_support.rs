//! Tracing integration for structured logging and spans.

use crate::linkage::BindReport;
use tracing::{Level, Span, span};

/// Create a span for one negotiation with a library.
///
/// # Example
///
/// ```rust,ignore
/// use uxlink::observability::span_negotiation;
///
/// let span = span_negotiation("ux_render", 1.0);
/// let _guard = span.enter();
/// // Size query, fill and bind here...
/// ```
#[inline]
pub fn span_negotiation(library: &str, version: f64) -> Span {
    span!(Level::INFO, "negotiation", library = %library, version = version)
}

/// Create a span for walking a filled link table.
#[inline]
pub fn span_bind(library: &str, records: usize) -> Span {
    span!(Level::DEBUG, "bind", library = %library, records = records)
}

/// Instrument a negotiation with tracing.
///
/// This is a convenience wrapper that enters a span and returns a guard.
pub fn instrument_negotiation(library: &str, version: f64) -> tracing::span::EnteredSpan {
    span_negotiation(library, version).entered()
}

/// Log the result of a bind walk.
#[inline]
pub fn trace_bind_report(library: &str, report: &BindReport) {
    tracing::info!(
        library = %library,
        published = report.published,
        bound = report.bound.len(),
        skipped = report.skipped.len(),
        foreign = report.foreign_records,
        null = report.null_pointers.len(),
        "link table bound"
    );
}

/// Log a negotiation failure.
#[inline]
pub fn trace_error(library: &str, error: &dyn std::error::Error) {
    tracing::error!(
        library = %library,
        error = %error,
        "negotiation failed"
    );
}

/// Log a client state change.
#[inline]
pub fn trace_state_change(library: &str, from: &str, to: &str) {
    tracing::info!(
        library = %library,
        from = %from,
        to = %to,
        "client state changed"
    );
}
