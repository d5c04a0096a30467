//! Client library for the IME Pay payment gateway.
//!
//! Two independent halves share only the merchant configuration:
//!
//! - [`payments`]: an async HTTP client for the token, initiate, verify,
//!   check-status and cancel endpoints.
//! - [`callback`]: validation of the asynchronous status notifications the
//!   gateway posts back to the merchant.
//!
//! ```no_run
//! use imepay::callback::{CallbackPayload, CallbackValidator, MerchantCredential};
//!
//! let validator = CallbackValidator::new(MerchantCredential::new("SHOP", "secret"));
//! let payload = CallbackPayload::from_json(br#"{"MerchantCode":"SHOP"}"#).unwrap();
//! match validator.validate(&payload).into_result() {
//!     Ok(fields) => println!("paid: {}", fields.transaction_id),
//!     Err(reason) => eprintln!("rejected: {}", reason),
//! }
//! ```

pub mod callback;
pub mod config;
pub mod error;
pub mod logging;
mod mask;
pub mod payments;

pub use callback::{
    CallbackFields, CallbackPayload, CallbackValidator, MerchantCredential, RejectReason,
    UnsignedPolicy, ValidationOutcome,
};
pub use error::{ErrorData, ImePayError, ImePayErrorKind, ImePayResult};
pub use logging::{DiagnosticsLogger, NoopLogger, TracingLogger};
pub use payments::{
    Environment, GatewayConfig, GatewayResponse, ImePayClient, ImePayClientBuilder,
    PaymentGateway, TransactionStatus,
};
