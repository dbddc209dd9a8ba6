//! Billing handlers: premium checkout, the gateway notification hook, and
//! membership state.
//!
//! ```text
//! POST /api/v1/billing/checkout
//! POST /api/v1/billing/notify {"reference":"MS-..","status":"paid","timestamp":1700000000,"signature":".."}
//! GET  /api/v1/billing/membership
//! ```
//!
//! The notify route carries no bearer token: the gateway authenticates
//! itself through the HMAC signature over the notification payload.

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::billing::{NotificationOutcome, PaymentNotification};
use crate::domain::membership::MembershipOrder;
use crate::domain::ports::{
    MembershipPersistenceError, MembershipRepository, UserPersistenceError, UserRepository,
};
use crate::domain::{Error, OrderStatus};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::state::HttpState;

/// Checkout response: where to send the buyer.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    /// Order reference; the gateway echoes it in the notification.
    pub reference: String,
    /// Gateway URL the buyer must visit to pay.
    pub redirect_url: String,
}

/// Gateway notification body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    /// Order reference issued at checkout.
    pub reference: String,
    /// Settlement status: `paid` or `failed`.
    pub status: String,
    /// Gateway-side instant, seconds since the epoch.
    pub timestamp: i64,
    /// Hex HMAC-SHA256 over `reference|status|timestamp`.
    pub signature: String,
}

/// Notification processing result.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    /// `activated`, `failed`, or `alreadyProcessed`.
    pub outcome: String,
}

/// One order in the bearer's purchase history.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    /// Gateway reference.
    pub reference: String,
    /// Plan purchased.
    pub plan: String,
    /// Charge amount rendered for display.
    pub amount: String,
    /// ISO currency code.
    pub currency: String,
    /// Settlement status.
    pub status: OrderStatus,
    /// Creation instant.
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
}

impl OrderView {
    fn project(order: &MembershipOrder) -> Self {
        Self {
            reference: order.reference().to_owned(),
            plan: order.plan().to_owned(),
            amount: order.amount().to_display_string(),
            currency: order.currency().to_owned(),
            status: order.status(),
            created_at: order.created_at(),
        }
    }
}

/// Membership state of the bearer.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MembershipView {
    /// Whether a premium membership is active right now.
    pub premium: bool,
    /// Premium expiry, when one was ever purchased.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub premium_until: Option<DateTime<Utc>>,
    /// Purchase history, newest first.
    pub orders: Vec<OrderView>,
}

fn map_user_persistence(err: UserPersistenceError) -> Error {
    match err {
        UserPersistenceError::Connection { message } => Error::service_unavailable(message),
        UserPersistenceError::Query { message } => Error::internal(message),
        UserPersistenceError::DuplicateEmail => {
            Error::conflict("email address is already registered")
        }
    }
}

fn map_membership_persistence(err: MembershipPersistenceError) -> Error {
    match err {
        MembershipPersistenceError::Connection { message } => Error::service_unavailable(message),
        MembershipPersistenceError::Query { message } => Error::internal(message),
    }
}

/// Start a premium checkout.
#[utoipa::path(
    post,
    path = "/api/v1/billing/checkout",
    responses(
        (status = 201, description = "Order created; redirect the buyer", body = CheckoutResponse),
        (status = 401, description = "Unauthorised", body = crate::inbound::http::error::ApiError),
        (status = 503, description = "Gateway unavailable", body = crate::inbound::http::error::ApiError)
    ),
    tags = ["billing"],
    operation_id = "startCheckout"
)]
#[post("/billing/checkout")]
pub async fn start_checkout(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let session = state.billing.start_checkout(user.id).await?;
    Ok(HttpResponse::Created().json(CheckoutResponse {
        reference: session.reference,
        redirect_url: session.redirect_url,
    }))
}

/// Gateway settlement notification.
#[utoipa::path(
    post,
    path = "/api/v1/billing/notify",
    request_body = NotificationRequest,
    responses(
        (status = 200, description = "Notification processed", body = NotificationResponse),
        (status = 401, description = "Signature mismatch", body = crate::inbound::http::error::ApiError),
        (status = 404, description = "Unknown reference", body = crate::inbound::http::error::ApiError)
    ),
    tags = ["billing"],
    operation_id = "gatewayNotify"
)]
#[post("/billing/notify")]
pub async fn gateway_notify(
    state: web::Data<HttpState>,
    payload: web::Json<NotificationRequest>,
) -> ApiResult<web::Json<NotificationResponse>> {
    let payload = payload.into_inner();
    let outcome = state
        .billing
        .handle_notification(&PaymentNotification {
            reference: payload.reference,
            status: payload.status,
            timestamp: payload.timestamp,
            signature: payload.signature,
        })
        .await?;
    let outcome = match outcome {
        NotificationOutcome::Activated => "activated",
        NotificationOutcome::MarkedFailed => "failed",
        NotificationOutcome::AlreadyProcessed => "alreadyProcessed",
    };
    Ok(web::Json(NotificationResponse {
        outcome: outcome.to_owned(),
    }))
}

/// Membership state of the bearer.
#[utoipa::path(
    get,
    path = "/api/v1/billing/membership",
    responses(
        (status = 200, description = "Membership state", body = MembershipView),
        (status = 401, description = "Unauthorised", body = crate::inbound::http::error::ApiError)
    ),
    tags = ["billing"],
    operation_id = "membershipState"
)]
#[get("/billing/membership")]
pub async fn membership_state(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<MembershipView>> {
    let account = state
        .users
        .find_by_id(user.id)
        .await
        .map_err(map_user_persistence)?
        .ok_or_else(|| Error::unauthorized("account no longer exists"))?;
    let orders = state
        .memberships
        .list_for_user(user.id)
        .await
        .map_err(map_membership_persistence)?;
    Ok(web::Json(MembershipView {
        premium: account.is_premium_at(Utc::now()),
        premium_until: account.premium_until(),
        orders: orders.iter().map(OrderView::project).collect(),
    }))
}

#[cfg(test)]
mod tests {
    //! Endpoint coverage over fixture state. The signing secret matches the
    //! one baked into [`HttpState::fixture`].

    use actix_web::{App, test as actix_test, web};
    use rstest::rstest;
    use serde_json::{Value, json};

    use super::*;
    use crate::domain::NotificationSigner;
    use crate::domain::Role;
    use crate::inbound::http::test_utils::{bearer, seeded_user, test_state};

    const FIXTURE_GATEWAY_SECRET: &[u8] = b"fixture-gateway-secret";

    fn test_app(
        state: HttpState,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
                actix_web::dev::ServiceRequest,
                Config = (),
                Response = actix_web::dev::ServiceResponse,
                Error = actix_web::Error,
                InitError = (),
            >,
    > {
        App::new().app_data(web::Data::new(state)).service(
            web::scope("/api/v1")
                .service(start_checkout)
                .service(gateway_notify)
                .service(membership_state),
        )
    }

    fn signed_notification(reference: &str, status: &str) -> Value {
        let timestamp = chrono::Utc::now().timestamp();
        let timestamp_text = timestamp.to_string();
        let signature = NotificationSigner::new(FIXTURE_GATEWAY_SECRET.to_vec())
            .sign(&[reference, status, timestamp_text.as_str()])
            .expect("signer works");
        json!({
            "reference": reference,
            "status": status,
            "timestamp": timestamp,
            "signature": signature,
        })
    }

    #[rstest]
    #[actix_web::test]
    async fn checkout_notify_membership_happy_path() {
        let state = test_state();
        let (_, buyer_token) = seeded_user(&state, Role::Buyer).await;
        let app = actix_test::init_service(test_app(state)).await;

        let checkout = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/billing/checkout")
                .insert_header(bearer(&buyer_token))
                .to_request(),
        )
        .await;
        assert_eq!(checkout.status(), actix_web::http::StatusCode::CREATED);
        let session: Value = actix_test::read_body_json(checkout).await;
        let reference = session["reference"].as_str().expect("reference").to_owned();
        assert!(session["redirectUrl"].as_str().is_some_and(|u| !u.is_empty()));

        let notified = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/billing/notify")
                .set_json(signed_notification(&reference, "paid"))
                .to_request(),
        )
        .await;
        assert!(notified.status().is_success());
        let outcome: Value = actix_test::read_body_json(notified).await;
        assert_eq!(outcome["outcome"], "activated");

        let membership = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/billing/membership")
                .insert_header(bearer(&buyer_token))
                .to_request(),
        )
        .await;
        let view: Value = actix_test::read_body_json(membership).await;
        assert_eq!(view["premium"], true);
        assert_eq!(view["orders"].as_array().expect("orders").len(), 1);
        assert_eq!(view["orders"][0]["status"], "paid");

        // Replay reports idempotent handling.
        let replay = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/billing/notify")
                .set_json(signed_notification(&reference, "paid"))
                .to_request(),
        )
        .await;
        let outcome: Value = actix_test::read_body_json(replay).await;
        assert_eq!(outcome["outcome"], "alreadyProcessed");
    }

    #[rstest]
    #[actix_web::test]
    async fn tampered_notifications_are_rejected() {
        let state = test_state();
        let (_, buyer_token) = seeded_user(&state, Role::Buyer).await;
        let app = actix_test::init_service(test_app(state)).await;

        let checkout = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/billing/checkout")
                .insert_header(bearer(&buyer_token))
                .to_request(),
        )
        .await;
        let session: Value = actix_test::read_body_json(checkout).await;
        let reference = session["reference"].as_str().expect("reference").to_owned();

        let mut body = signed_notification(&reference, "failed");
        body["status"] = Value::String("paid".to_owned());
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/billing/notify")
                .set_json(body)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), actix_web::http::StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[actix_web::test]
    async fn unknown_references_are_not_found() {
        let app = actix_test::init_service(test_app(test_state())).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/billing/notify")
                .set_json(signed_notification("MS-nonexistent", "paid"))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), actix_web::http::StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[actix_web::test]
    async fn checkout_requires_authentication() {
        let app = actix_test::init_service(test_app(test_state())).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/billing/checkout")
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), actix_web::http::StatusCode::UNAUTHORIZED);
    }
}
