//! Port for the payment gateway token exchange.

use async_trait::async_trait;

use crate::domain::listing::Money;

use super::define_port_error;

define_port_error! {
    /// Errors raised by payment gateway adapters.
    pub enum PaymentGatewayError {
        /// The gateway judged the request malformed or the signature wrong.
        InvalidRequest { message: String } =>
            "gateway rejected the token request: {message}",
        /// The gateway did not answer within the configured timeout.
        Timeout { message: String } =>
            "gateway timed out: {message}",
        /// Transport-level failure reaching the gateway.
        Transport { message: String } =>
            "gateway transport failed: {message}",
        /// The gateway answered with a payload we could not decode.
        Decode { message: String } =>
            "gateway response could not be decoded: {message}",
    }
}

/// Signed token request sent to the gateway when a checkout starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentTokenRequest {
    /// Merchant account identifier at the gateway.
    pub merchant_id: String,
    /// Order reference echoed back in notifications.
    pub reference: String,
    /// Charge amount.
    pub amount: Money,
    /// ISO currency code.
    pub currency: String,
    /// Human-readable order description shown on the payment page.
    pub description: String,
    /// Request instant, seconds since the epoch; part of the signed payload.
    pub timestamp: i64,
    /// Hex HMAC-SHA256 over the canonical payload.
    pub signature: String,
}

/// Token handed back by the gateway; the buyer is redirected to complete
/// payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentToken {
    /// Opaque gateway token.
    pub token: String,
    /// URL the buyer must visit to pay.
    pub redirect_url: String,
}

/// Port for exchanging a signed token request for a payment token.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Perform the token exchange.
    async fn create_payment_token(
        &self,
        request: &PaymentTokenRequest,
    ) -> Result<PaymentToken, PaymentGatewayError>;
}

/// Fixture gateway for tests and local runs: always succeeds and derives
/// a deterministic token from the order reference.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePaymentGateway;

#[async_trait]
impl PaymentGateway for FixturePaymentGateway {
    async fn create_payment_token(
        &self,
        request: &PaymentTokenRequest,
    ) -> Result<PaymentToken, PaymentGatewayError> {
        Ok(PaymentToken {
            token: format!("fixture-token-{}", request.reference),
            redirect_url: format!("https://pay.example.invalid/checkout/{}", request.reference),
        })
    }
}
