//! Helpers for the tracing spans the coordinators open.

use std::fmt::Debug;
use tracing::{warn, Span};

/// For the current span, record `field_value` under `field_name`. The field
/// must already be declared on the span, usually as `field = tracing::field::Empty`.
///
/// Every event emitted inside the span then carries the field:
/// ```text
///   2026-10-18T09:12:44.203114Z  INFO tss_wallet_client::signing: Signing state changed, state: RShareOffered
///     at tss-wallet-client/src/signing.rs:103
///     in tss_wallet_client::signing::sign_tx_request with trace_id: 0f6c02b1-3c4e-4f0c-9d55-81b94ad3b7a1, tx_request_id: "randomId", state: "RShareOffered"
/// ```
///
/// In debug builds a warning is logged if the field was never declared.
pub fn record_field(field_name: &str, field_value: &dyn Debug) {
    if cfg!(debug_assertions) && !Span::current().has_field(field_name) {
        warn!("Field {} not defined in current span!", field_name);
    }

    let _ = Span::current().record(field_name, &format!("{field_value:?}"));
}
