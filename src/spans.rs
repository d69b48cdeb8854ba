//! OpenTelemetry span helpers for NTT operations
//!
//! Every route operation runs inside one of these spans. Span names are
//! static, attributes are structured, and error attributes start out empty
//! so they can be filled in by [`record_error`] or
//! [`record_error_with_context`] when an operation fails.
//!
//! # Example
//!
//! ```rust,no_run
//! use ntt_rs::{spans, Chain};
//!
//! let span = spans::validate(Chain::Sepolia, Chain::BaseSepolia, "1.5", "manual");
//! let _guard = span.enter();
//! // custom validation logic here
//! ```

use alloy_primitives::B256;
use tracing::Span;
use url::Url;

use crate::protocol::Chain;

/// Span for parameter validation. Never performs I/O.
#[inline]
pub fn validate(
    source_chain: Chain,
    destination_chain: Chain,
    amount: &str,
    route: &'static str,
) -> Span {
    tracing::info_span!(
        "ntt_rs.validate",
        source_chain = %source_chain,
        destination_chain = %destination_chain,
        amount = amount,
        route = route,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.context = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Span for quoting a validated transfer.
///
/// Children: adapter reads (capacities, delivery price)
#[inline]
pub fn quote(source_chain: Chain, destination_chain: Chain, route: &'static str) -> Span {
    tracing::info_span!(
        "ntt_rs.quote",
        source_chain = %source_chain,
        destination_chain = %destination_chain,
        route = route,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.context = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Span for building and submitting the source-chain transactions.
#[inline]
pub fn initiate(
    source_chain: Chain,
    destination_chain: Chain,
    route: &'static str,
    amount: &str,
) -> Span {
    tracing::info_span!(
        "ntt_rs.initiate",
        source_chain = %source_chain,
        destination_chain = %destination_chain,
        route = route,
        amount = amount,
        tx_count = tracing::field::Empty,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.context = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Span for one resumption of a tracking stream.
///
/// One span per advance, so an abandoned stream leaves no open span behind.
#[inline]
pub fn track_step(origin_txid: &str, state: &'static str) -> Span {
    tracing::info_span!(
        "ntt_rs.track",
        origin_txid = origin_txid,
        state = state,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.context = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Span for a manual destination-chain completion.
#[inline]
pub fn complete(destination_chain: Chain, digest: &B256, state: &'static str) -> Span {
    tracing::info_span!(
        "ntt_rs.complete",
        destination_chain = %destination_chain,
        digest = %digest,
        state = state,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.context = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Span for releasing a transfer from the source outbound queue.
#[inline]
pub fn release_outbound(source_chain: Chain, origin_txid: &str) -> Span {
    tracing::info_span!(
        "ntt_rs.release_outbound",
        source_chain = %source_chain,
        origin_txid = origin_txid,
        queue_sequence = tracing::field::Empty,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.context = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Span for a single attestation lookup.
///
/// Children: HTTP client request spans (from reqwest instrumentation)
#[inline]
pub fn fetch_attestation(url: &Url, chain: Chain) -> Span {
    tracing::info_span!(
        "ntt_rs.fetch_attestation",
        url = %url,
        chain = %chain,
        http.status_code = tracing::field::Empty,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.context = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Span for resolving the ABI binding of a manager deployment.
#[inline]
pub fn resolve_binding(chain: Chain, version: &str) -> Span {
    tracing::debug_span!(
        "ntt_rs.resolve_binding",
        chain = %chain,
        version = version,
        binding = tracing::field::Empty,
    )
}

/// Record error attributes on the current span.
///
/// Sets `error.type` to the error's leading display segment and marks the
/// span status as `ERROR`.
///
/// ```rust,no_run
/// use ntt_rs::{spans, NttError};
///
/// # fn example() {
/// let span = tracing::info_span!("ntt_rs.operation");
/// let _guard = span.enter();
///
/// let err = NttError::InvalidState("not attested".into());
/// spans::record_error(&err);
/// # }
/// ```
pub fn record_error<E: std::error::Error>(error: &E) {
    let current_span = Span::current();
    let message = error.to_string();
    current_span.record("error.type", message.split(':').next().unwrap_or("Unknown"));
    current_span.record("error.message", message.as_str());
    current_span.record("otel.status_code", "ERROR");

    if let Some(source) = error.source() {
        current_span.record("error.context", source.to_string());
    }
}

/// Record error attributes with a custom type and context.
pub fn record_error_with_context(
    error_type: &str,
    error_message: &str,
    additional_context: Option<&str>,
) {
    let current_span = Span::current();
    current_span.record("error.type", error_type);
    current_span.record("error.message", error_message);
    current_span.record("otel.status_code", "ERROR");

    if let Some(context) = additional_context {
        current_span.record("error.context", context);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NttError;

    #[test]
    fn test_spans_accept_error_recording() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("ntt_rs=trace")
            .with_test_writer()
            .try_init();

        let span = validate(Chain::Sepolia, Chain::BaseSepolia, "1", "manual");
        let _guard = span.enter();
        record_error(&NttError::InvalidState("boom".to_string()));
        record_error_with_context("Timeout", "gave up", Some("attestation"));
    }

    #[test]
    fn test_fetch_attestation_span_name() {
        let url = Url::parse("https://api.wormholescan.io/api/v1/operations").unwrap();
        let span = fetch_attestation(&url, Chain::Ethereum);
        if let Some(metadata) = span.metadata() {
            assert_eq!(metadata.name(), "ntt_rs.fetch_attestation");
        }
    }
}
