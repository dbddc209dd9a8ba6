//! Premium checkout and gateway-notification flow.
//!
//! The gateway integration is a thin token exchange: checkout sends an
//! HMAC-signed token request and redirects the buyer; settlement arrives as
//! a signed notification naming the order reference. Both directions sign
//! the same way, a hex HMAC-SHA256 over pipe-joined fields.

use std::sync::Arc;

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::domain::error::Error;
use crate::domain::listing::Money;
use crate::domain::membership::{
    MembershipOrder, MembershipOrderDraft, OrderStatus, PREMIUM_PLAN, extend_membership,
};
use crate::domain::ports::{
    MembershipPersistenceError, MembershipRepository, PaymentGateway, PaymentGatewayError,
    PaymentTokenRequest, UserPersistenceError, UserRepository,
};

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies gateway payloads with the shared merchant secret.
pub struct NotificationSigner {
    secret: Zeroizing<Vec<u8>>,
}

impl NotificationSigner {
    /// Build a signer over the shared secret.
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: Zeroizing::new(secret.into()),
        }
    }

    fn mac(&self) -> Result<HmacSha256, Error> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|err| Error::internal(format!("gateway signer misconfigured: {err}")))
    }

    /// Hex HMAC-SHA256 over the pipe-joined `parts`.
    ///
    /// # Errors
    ///
    /// Returns an internal [`Error`] when the signer cannot be constructed.
    pub fn sign(&self, parts: &[&str]) -> Result<String, Error> {
        let mut mac = self.mac()?;
        mac.update(parts.join("|").as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Constant-time verification of a hex signature over `parts`.
    ///
    /// Undecodable hex is simply a failed verification, not an error.
    ///
    /// # Errors
    ///
    /// Returns an internal [`Error`] when the signer cannot be constructed.
    pub fn verify(&self, parts: &[&str], signature: &str) -> Result<bool, Error> {
        let Ok(expected) = hex::decode(signature.trim()) else {
            return Ok(false);
        };
        let mut mac = self.mac()?;
        mac.update(parts.join("|").as_bytes());
        Ok(mac.verify_slice(&expected).is_ok())
    }
}

/// Static gateway/merchant settings for checkout.
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// Merchant account identifier at the gateway.
    pub merchant_id: String,
    /// Premium plan price.
    pub price: Money,
    /// ISO currency code charged.
    pub currency: String,
}

/// Result of a successful checkout call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    /// Order reference the gateway will echo back.
    pub reference: String,
    /// URL the buyer must visit to pay.
    pub redirect_url: String,
}

/// Settlement notification posted by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentNotification {
    /// Order reference issued at checkout.
    pub reference: String,
    /// Gateway settlement status: `paid` or `failed`.
    pub status: String,
    /// Gateway-side instant, seconds since the epoch; part of the signed
    /// payload.
    pub timestamp: i64,
    /// Hex HMAC-SHA256 over `reference|status|timestamp`.
    pub signature: String,
}

/// Outcome of processing a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// The order settled and the buyer's membership was extended.
    Activated,
    /// The gateway reported failure; the order is closed.
    MarkedFailed,
    /// The order had already settled; nothing changed.
    AlreadyProcessed,
}

/// Orchestrates checkout and settlement against the ports.
pub struct BillingService {
    users: Arc<dyn UserRepository>,
    memberships: Arc<dyn MembershipRepository>,
    gateway: Arc<dyn PaymentGateway>,
    signer: NotificationSigner,
    config: BillingConfig,
}

impl BillingService {
    /// Assemble the service from its ports and merchant settings.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        memberships: Arc<dyn MembershipRepository>,
        gateway: Arc<dyn PaymentGateway>,
        signer: NotificationSigner,
        config: BillingConfig,
    ) -> Self {
        Self {
            users,
            memberships,
            gateway,
            signer,
            config,
        }
    }

    /// Create a pending order and exchange a signed token request for the
    /// buyer's redirect URL.
    ///
    /// # Errors
    ///
    /// Returns a domain [`Error`] when the account is missing, persistence
    /// fails, or the gateway exchange fails.
    pub async fn start_checkout(&self, user_id: Uuid) -> Result<CheckoutSession, Error> {
        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found("no such account"))?;

        let now = Utc::now();
        let reference = format!("MS-{}", Uuid::new_v4().simple());
        let order = MembershipOrder::new(MembershipOrderDraft {
            id: Uuid::new_v4(),
            user_id: user.id(),
            plan: PREMIUM_PLAN.to_owned(),
            amount: self.config.price,
            currency: self.config.currency.clone(),
            reference: reference.clone(),
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        })
        .map_err(|err| Error::internal(format!("order construction failed: {err}")))?;
        self.memberships
            .create_order(&order)
            .await
            .map_err(map_membership_error)?;

        let timestamp = now.timestamp();
        let amount = order.amount().minor_units().to_string();
        let timestamp_text = timestamp.to_string();
        let signature = self.signer.sign(&[
            self.config.merchant_id.as_str(),
            order.reference(),
            amount.as_str(),
            order.currency(),
            timestamp_text.as_str(),
        ])?;
        let token = self
            .gateway
            .create_payment_token(&PaymentTokenRequest {
                merchant_id: self.config.merchant_id.clone(),
                reference: order.reference().to_owned(),
                amount: order.amount(),
                currency: order.currency().to_owned(),
                description: format!("Marketstall {PREMIUM_PLAN}"),
                timestamp,
                signature,
            })
            .await
            .map_err(map_gateway_error)?;

        Ok(CheckoutSession {
            reference,
            redirect_url: token.redirect_url,
        })
    }

    /// Process a settlement notification.
    ///
    /// The signature is verified in constant time before anything is read
    /// from storage. Replayed notifications for an already-settled order
    /// return [`NotificationOutcome::AlreadyProcessed`] without touching
    /// membership state.
    ///
    /// # Errors
    ///
    /// Returns `unauthorized` for a bad signature, `not_found` for an
    /// unknown reference, `invalid_request` for an unknown status word, and
    /// internal/service errors for persistence failures.
    pub async fn handle_notification(
        &self,
        notification: &PaymentNotification,
    ) -> Result<NotificationOutcome, Error> {
        let timestamp_text = notification.timestamp.to_string();
        let verified = self.signer.verify(
            &[
                notification.reference.as_str(),
                notification.status.as_str(),
                timestamp_text.as_str(),
            ],
            &notification.signature,
        )?;
        if !verified {
            return Err(Error::unauthorized("notification signature mismatch"));
        }

        let order = self
            .memberships
            .find_by_reference(&notification.reference)
            .await
            .map_err(map_membership_error)?
            .ok_or_else(|| Error::not_found("unknown order reference"))?;
        if order.status() != OrderStatus::Pending {
            return Ok(NotificationOutcome::AlreadyProcessed);
        }

        let now = Utc::now();
        match notification.status.as_str() {
            "paid" => {
                self.memberships
                    .set_status(order.id(), OrderStatus::Paid, now)
                    .await
                    .map_err(map_membership_error)?;
                let payer = self
                    .users
                    .find_by_id(order.user_id())
                    .await
                    .map_err(map_user_error)?
                    .ok_or_else(|| Error::internal("order references a missing account"))?;
                let until = extend_membership(payer.premium_until(), now);
                self.users
                    .set_premium_until(payer.id(), until)
                    .await
                    .map_err(map_user_error)?;
                Ok(NotificationOutcome::Activated)
            }
            "failed" => {
                self.memberships
                    .set_status(order.id(), OrderStatus::Failed, now)
                    .await
                    .map_err(map_membership_error)?;
                Ok(NotificationOutcome::MarkedFailed)
            }
            other => Err(Error::invalid_request(format!(
                "unknown notification status: {other}"
            ))),
        }
    }
}

fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => Error::service_unavailable(message),
        UserPersistenceError::Query { message } => Error::internal(message),
        UserPersistenceError::DuplicateEmail => Error::conflict("email address is already registered"),
    }
}

fn map_membership_error(error: MembershipPersistenceError) -> Error {
    match error {
        MembershipPersistenceError::Connection { message } => Error::service_unavailable(message),
        MembershipPersistenceError::Query { message } => Error::internal(message),
    }
}

fn map_gateway_error(error: PaymentGatewayError) -> Error {
    match error {
        PaymentGatewayError::Timeout { message } | PaymentGatewayError::Transport { message } => {
            Error::service_unavailable(message)
        }
        PaymentGatewayError::InvalidRequest { message } | PaymentGatewayError::Decode { message } => {
            Error::internal(message)
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for signing, settlement, and replay handling.

    use rstest::rstest;

    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{
        FixtureMembershipRepository, FixturePaymentGateway, FixtureUserRepository,
    };
    use crate::domain::user::{DisplayName, EmailAddress, Role, User, UserDraft};

    const SECRET: &[u8] = b"merchant-shared-secret";

    fn buyer() -> User {
        User::new(UserDraft {
            id: Uuid::new_v4(),
            email: EmailAddress::new("buyer@example.com").expect("valid email"),
            display_name: DisplayName::new("Buyer").expect("valid name"),
            role: Role::Buyer,
            password_hash: "$argon2id$stub".to_owned(),
            premium_until: None,
            created_at: Utc::now(),
        })
    }

    fn service(users: Arc<FixtureUserRepository>) -> BillingService {
        BillingService::new(
            users,
            Arc::new(FixtureMembershipRepository::default()),
            Arc::new(FixturePaymentGateway),
            NotificationSigner::new(SECRET),
            BillingConfig {
                merchant_id: "merchant-1".to_owned(),
                price: Money::from_minor(29_00).expect("amount"),
                currency: "USD".to_owned(),
            },
        )
    }

    fn signed_notification(reference: &str, status: &str) -> PaymentNotification {
        let timestamp = Utc::now().timestamp();
        let timestamp_text = timestamp.to_string();
        let signature = NotificationSigner::new(SECRET)
            .sign(&[reference, status, timestamp_text.as_str()])
            .expect("signer works");
        PaymentNotification {
            reference: reference.to_owned(),
            status: status.to_owned(),
            timestamp,
            signature,
        }
    }

    #[rstest]
    fn signatures_round_trip_and_reject_tampering() {
        let signer = NotificationSigner::new(SECRET);
        let signature = signer.sign(&["ref", "paid", "100"]).expect("signs");
        assert!(signer.verify(&["ref", "paid", "100"], &signature).expect("verifies"));
        assert!(!signer.verify(&["ref", "failed", "100"], &signature).expect("verifies"));
        assert!(!signer.verify(&["ref", "paid", "100"], "zz-not-hex").expect("verifies"));
    }

    #[rstest]
    #[tokio::test]
    async fn checkout_creates_a_pending_order_and_redirect() {
        let users = Arc::new(FixtureUserRepository::default());
        let account = buyer();
        users.insert(account.clone());
        let billing = service(users);

        let session = billing
            .start_checkout(account.id())
            .await
            .expect("checkout succeeds");
        assert!(session.reference.starts_with("MS-"));
        assert!(session.redirect_url.contains(&session.reference));
    }

    #[rstest]
    #[tokio::test]
    async fn checkout_rejects_unknown_accounts() {
        let billing = service(Arc::new(FixtureUserRepository::default()));
        let err = billing
            .start_checkout(Uuid::new_v4())
            .await
            .expect_err("must fail");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn paid_notification_activates_membership_once() {
        let users = Arc::new(FixtureUserRepository::default());
        let account = buyer();
        users.insert(account.clone());
        let billing = service(Arc::clone(&users));
        let session = billing
            .start_checkout(account.id())
            .await
            .expect("checkout succeeds");

        let outcome = billing
            .handle_notification(&signed_notification(&session.reference, "paid"))
            .await
            .expect("notification processes");
        assert_eq!(outcome, NotificationOutcome::Activated);

        let activated = users
            .find_by_id(account.id())
            .await
            .expect("lookup succeeds")
            .expect("account present");
        let first_expiry = activated.premium_until().expect("premium set");
        assert!(activated.is_premium_at(Utc::now()));

        // Replay must not extend the membership a second time.
        let replay = billing
            .handle_notification(&signed_notification(&session.reference, "paid"))
            .await
            .expect("replay processes");
        assert_eq!(replay, NotificationOutcome::AlreadyProcessed);
        let after_replay = users
            .find_by_id(account.id())
            .await
            .expect("lookup succeeds")
            .expect("account present");
        assert_eq!(after_replay.premium_until(), Some(first_expiry));
    }

    #[rstest]
    #[tokio::test]
    async fn tampered_notifications_are_unauthorized() {
        let users = Arc::new(FixtureUserRepository::default());
        let account = buyer();
        users.insert(account.clone());
        let billing = service(users);
        let session = billing
            .start_checkout(account.id())
            .await
            .expect("checkout succeeds");

        let mut notification = signed_notification(&session.reference, "failed");
        notification.status = "paid".to_owned();
        let err = billing
            .handle_notification(&notification)
            .await
            .expect_err("must fail");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[rstest]
    #[tokio::test]
    async fn failed_notification_closes_the_order() {
        let users = Arc::new(FixtureUserRepository::default());
        let account = buyer();
        users.insert(account.clone());
        let billing = service(Arc::clone(&users));
        let session = billing
            .start_checkout(account.id())
            .await
            .expect("checkout succeeds");

        let outcome = billing
            .handle_notification(&signed_notification(&session.reference, "failed"))
            .await
            .expect("notification processes");
        assert_eq!(outcome, NotificationOutcome::MarkedFailed);

        let untouched = users
            .find_by_id(account.id())
            .await
            .expect("lookup succeeds")
            .expect("account present");
        assert_eq!(untouched.premium_until(), None);
    }
}
