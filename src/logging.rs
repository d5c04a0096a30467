//! Optional diagnostics for gateway traffic and callback validation
//!
//! Both the gateway client and the callback validator take a
//! [`DiagnosticsLogger`] at construction. The default is [`NoopLogger`];
//! [`TracingLogger`] forwards everything to `tracing` with credentials masked.

use crate::callback::{CallbackPayload, RejectReason};
use crate::error::ImePayError;
use crate::mask;
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, warn};

/// Sink for diagnostic events. Every method defaults to doing nothing.
pub trait DiagnosticsLogger: Debug + Send + Sync {
    /// An API request is about to be sent
    fn request(&self, _url: &str, _body: &Value) {}

    /// An API response was received and decoded
    fn response(&self, _url: &str, _http_status: u16, _body: &Value) {}

    /// An API request failed before a usable response was obtained
    fn request_failed(&self, _url: &str, _error: &ImePayError) {}

    /// A callback payload was handed to the validator
    fn callback_received(&self, _payload: &CallbackPayload) {}

    /// A callback payload was rejected
    fn validation_failed(&self, _reason: RejectReason, _payload: &CallbackPayload) {}

    /// A callback without a signature was accepted
    fn unsigned_accepted(&self, _payload: &CallbackPayload) {}
}

pub type SharedLogger = Arc<dyn DiagnosticsLogger>;

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl DiagnosticsLogger for NoopLogger {}

pub fn noop() -> SharedLogger {
    Arc::new(NoopLogger)
}

/// Emits `tracing` events under the `imepay` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl DiagnosticsLogger for TracingLogger {
    fn request(&self, url: &str, body: &Value) {
        let data = mask::secure_value(body);
        debug!(target: "imepay", %url, %data, "IME Pay API request");
    }

    fn response(&self, url: &str, http_status: u16, body: &Value) {
        let data = mask::secure_value(body);
        debug!(target: "imepay", %url, http_status, %data, "IME Pay API response");
    }

    fn request_failed(&self, url: &str, error: &ImePayError) {
        warn!(
            target: "imepay",
            %url,
            http_status = ?error.http_status(),
            %error,
            "IME Pay API request failed"
        );
    }

    fn callback_received(&self, payload: &CallbackPayload) {
        let data = mask::secure_value(&payload.to_json_value());
        debug!(target: "imepay", %data, "IME Pay callback received");
    }

    fn validation_failed(&self, reason: RejectReason, payload: &CallbackPayload) {
        let data = mask::secure_value(&payload.to_json_value());
        warn!(target: "imepay", %reason, %data, "IME Pay callback validation error");
    }

    fn unsigned_accepted(&self, payload: &CallbackPayload) {
        warn!(
            target: "imepay",
            transaction_id = payload.get("TransactionId").unwrap_or_default(),
            "Accepting IME Pay callback without signature"
        );
    }
}
