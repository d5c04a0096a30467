//! IME Pay gateway integration
//!
//! [`client::ImePayClient`] talks to the five gateway endpoints (token,
//! initiate, verify, check status, cancel) and normalises every reply into a
//! [`types::GatewayResponse`].

pub mod client;
pub mod traits;
pub mod types;

pub use client::{GatewayConfig, ImePayClient, ImePayClientBuilder};
pub use traits::PaymentGateway;
pub use types::{Environment, GatewayResponse, TransactionStatus};
