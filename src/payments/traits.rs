//! Payment gateway trait definitions
//!
//! Applications that drive payments through IME Pay can depend on this trait
//! instead of the concrete client, and substitute a fake in their own tests.

use crate::error::ImePayResult;
use crate::payments::types::GatewayResponse;
use async_trait::async_trait;

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Exchange the merchant credentials for a short-lived token
    ///
    /// # Returns
    /// * `Some(token)` - The gateway issued a token
    /// * `None` - The gateway answered without a populated `TokenId`
    async fn get_token(&self) -> ImePayResult<Option<String>>;

    /// Start a payment for `transaction_id`
    ///
    /// On success the response carries a `PaymentUrl` to which the customer
    /// must be redirected.
    async fn initiate_payment(
        &self,
        token: &str,
        transaction_id: &str,
        product_name: &str,
        product_url: Option<&str>,
    ) -> ImePayResult<GatewayResponse>;

    /// Confirm a payment after the customer returns or a callback arrives
    ///
    /// # Arguments
    /// * `transaction_id` - Merchant transaction ID used in `initiate_payment`
    /// * `ref_id` - Reference ID assigned by IME Pay
    async fn verify_payment(
        &self,
        token: &str,
        transaction_id: &str,
        ref_id: &str,
    ) -> ImePayResult<GatewayResponse>;

    /// Query the current state of a transaction; the reply carries `Status`
    async fn check_transaction_status(
        &self,
        token: &str,
        transaction_id: &str,
    ) -> ImePayResult<GatewayResponse>;

    /// Cancel a transaction, with `Cancelled by merchant` as the default reason
    async fn cancel_transaction(
        &self,
        token: &str,
        transaction_id: &str,
        ref_id: &str,
        reason: Option<&str>,
    ) -> ImePayResult<GatewayResponse>;
}
