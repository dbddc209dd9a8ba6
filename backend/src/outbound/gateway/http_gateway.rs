//! Reqwest-backed payment gateway adapter.
//!
//! This adapter owns transport details only: request serialisation,
//! timeout and HTTP error mapping, and JSON decoding of the token
//! response. Signing happens upstream in the billing service; the adapter
//! ships the already-signed payload.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{
    PaymentGateway, PaymentGatewayError, PaymentToken, PaymentTokenRequest,
};

const DEFAULT_USER_AGENT: &str = "marketstall-backend/0.1";

/// Wire form of the signed token request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequestDto<'a> {
    merchant_id: &'a str,
    reference: &'a str,
    amount_minor: i64,
    currency: &'a str,
    description: &'a str,
    timestamp: i64,
    signature: &'a str,
}

impl<'a> TokenRequestDto<'a> {
    fn from_domain(request: &'a PaymentTokenRequest) -> Self {
        Self {
            merchant_id: &request.merchant_id,
            reference: &request.reference,
            amount_minor: request.amount.minor_units(),
            currency: &request.currency,
            description: &request.description,
            timestamp: request.timestamp,
            signature: &request.signature,
        }
    }
}

/// Wire form of the gateway's answer.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponseDto {
    token: String,
    redirect_url: String,
}

/// Gateway adapter performing HTTP POST requests against one endpoint.
pub struct HttpPaymentGateway {
    client: Client,
    endpoint: Url,
    user_agent: String,
}

impl HttpPaymentGateway {
    /// Build an adapter with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        })
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_payment_token(
        &self,
        request: &PaymentTokenRequest,
    ) -> Result<PaymentToken, PaymentGatewayError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::USER_AGENT, self.user_agent.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&TokenRequestDto::from_domain(request))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_token(body.as_ref())
    }
}

fn parse_token(body: &[u8]) -> Result<PaymentToken, PaymentGatewayError> {
    let decoded: TokenResponseDto = serde_json::from_slice(body).map_err(|err| {
        PaymentGatewayError::decode(format!("invalid gateway JSON payload: {err}"))
    })?;
    if decoded.token.trim().is_empty() || decoded.redirect_url.trim().is_empty() {
        return Err(PaymentGatewayError::decode(
            "gateway response missing token or redirect URL",
        ));
    }
    Ok(PaymentToken {
        token: decoded.token,
        redirect_url: decoded.redirect_url,
    })
}

fn map_transport_error(error: reqwest::Error) -> PaymentGatewayError {
    if error.is_timeout() {
        PaymentGatewayError::timeout(error.to_string())
    } else {
        PaymentGatewayError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> PaymentGatewayError {
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), preview)
    };

    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            PaymentGatewayError::timeout(message)
        }
        _ if status.is_client_error() => PaymentGatewayError::invalid_request(message),
        _ => PaymentGatewayError::transport(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network mapping helpers.

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn parses_token_responses() {
        let body = br#"{ "token": "tok_1", "redirectUrl": "https://pay.example/x" }"#;
        let token = parse_token(body).expect("JSON should decode");
        assert_eq!(token.token, "tok_1");
        assert_eq!(token.redirect_url, "https://pay.example/x");
    }

    #[rstest]
    #[case::not_json(br#"<html>gateway error</html>"# as &[u8])]
    #[case::blank_fields(br#"{ "token": "", "redirectUrl": "" }"# as &[u8])]
    fn rejects_undecodable_responses(#[case] body: &[u8]) {
        assert!(matches!(
            parse_token(body),
            Err(PaymentGatewayError::Decode { .. })
        ));
    }

    #[rstest]
    #[case::request_timeout(StatusCode::REQUEST_TIMEOUT)]
    #[case::gateway_timeout(StatusCode::GATEWAY_TIMEOUT)]
    fn timeout_statuses_map_to_timeout(#[case] status: StatusCode) {
        assert!(matches!(
            map_status_error(status, b""),
            PaymentGatewayError::Timeout { .. }
        ));
    }

    #[rstest]
    fn client_errors_carry_a_body_preview() {
        let error = map_status_error(StatusCode::UNPROCESSABLE_ENTITY, b"bad signature");
        match error {
            PaymentGatewayError::InvalidRequest { message } => {
                assert!(message.contains("422"));
                assert!(message.contains("bad signature"));
            }
            other => panic!("expected InvalidRequest, got {other:?}"),
        }
    }

    #[rstest]
    fn server_errors_map_to_transport() {
        assert!(matches!(
            map_status_error(StatusCode::BAD_GATEWAY, b"upstream down"),
            PaymentGatewayError::Transport { .. }
        ));
    }

    #[rstest]
    fn long_bodies_are_truncated_in_previews() {
        let long = "x".repeat(500);
        let preview = body_preview(long.as_bytes());
        assert!(preview.ends_with("..."));
        assert!(preview.chars().count() <= 163);
    }
}
