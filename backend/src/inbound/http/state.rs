//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they depend
//! only on domain ports and stay testable without I/O.

use std::sync::Arc;

use chrono::Duration;

use crate::domain::billing::{BillingConfig, BillingService, NotificationSigner};
use crate::domain::listing::Money;
use crate::domain::ports::{
    AppointmentRepository, FavouriteRepository, FixtureAppointmentRepository,
    FixtureFavouriteRepository, FixtureListingRepository, FixtureMembershipRepository,
    FixturePaymentGateway, FixtureQuestionRepository, FixtureUserRepository, ListingRepository,
    MembershipRepository, PaymentGateway, QuestionRepository, UserRepository,
};
use crate::domain::{PasswordPolicy, TokenIssuer};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    /// User account persistence.
    pub users: Arc<dyn UserRepository>,
    /// Listing persistence and search.
    pub listings: Arc<dyn ListingRepository>,
    /// Saved-listing persistence.
    pub favourites: Arc<dyn FavouriteRepository>,
    /// Appointment persistence.
    pub appointments: Arc<dyn AppointmentRepository>,
    /// Listing Q&A persistence.
    pub questions: Arc<dyn QuestionRepository>,
    /// Membership order persistence.
    pub memberships: Arc<dyn MembershipRepository>,
    /// Payment gateway token exchange.
    pub gateway: Arc<dyn PaymentGateway>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// User account persistence.
    pub users: Arc<dyn UserRepository>,
    /// Listing persistence and search.
    pub listings: Arc<dyn ListingRepository>,
    /// Saved-listing persistence.
    pub favourites: Arc<dyn FavouriteRepository>,
    /// Appointment persistence.
    pub appointments: Arc<dyn AppointmentRepository>,
    /// Listing Q&A persistence.
    pub questions: Arc<dyn QuestionRepository>,
    /// Membership order persistence.
    pub memberships: Arc<dyn MembershipRepository>,
    /// Checkout and settlement orchestration.
    pub billing: Arc<BillingService>,
    /// Bearer-token issue/verify.
    pub tokens: Arc<TokenIssuer>,
    /// Password policy and hashing.
    pub passwords: PasswordPolicy,
}

impl HttpState {
    /// Wire handler state from ports and credential settings.
    #[must_use]
    pub fn new(
        ports: HttpStatePorts,
        tokens: TokenIssuer,
        signer: NotificationSigner,
        billing_config: BillingConfig,
    ) -> Self {
        let HttpStatePorts {
            users,
            listings,
            favourites,
            appointments,
            questions,
            memberships,
            gateway,
        } = ports;
        let billing = Arc::new(BillingService::new(
            Arc::clone(&users),
            Arc::clone(&memberships),
            gateway,
            signer,
            billing_config,
        ));
        Self {
            users,
            listings,
            favourites,
            appointments,
            questions,
            memberships,
            billing,
            tokens: Arc::new(tokens),
            passwords: PasswordPolicy,
        }
    }

    /// State wired entirely from in-memory fixtures.
    ///
    /// Backs handler tests and DB-less local runs; the credentials are
    /// fixed and must never reach a deployment.
    #[must_use]
    pub fn fixture() -> Self {
        Self::fixture_with(HttpStatePorts {
            users: Arc::new(FixtureUserRepository::default()),
            listings: Arc::new(FixtureListingRepository::default()),
            favourites: Arc::new(FixtureFavouriteRepository::default()),
            appointments: Arc::new(FixtureAppointmentRepository::default()),
            questions: Arc::new(FixtureQuestionRepository::default()),
            memberships: Arc::new(FixtureMembershipRepository::default()),
            gateway: Arc::new(FixturePaymentGateway),
        })
    }

    /// Fixture credentials over caller-supplied ports; lets tests keep a
    /// handle on an individual fixture repository.
    #[must_use]
    pub fn fixture_with(ports: HttpStatePorts) -> Self {
        Self::new(
            ports,
            TokenIssuer::new(b"fixture-token-secret-do-not-deploy", Duration::hours(24)),
            NotificationSigner::new(b"fixture-gateway-secret".to_vec()),
            BillingConfig {
                merchant_id: "fixture-merchant".to_owned(),
                price: Money::from_minor(29_00).unwrap_or_else(|err| {
                    panic!("fixture price must be valid: {err}")
                }),
                currency: "USD".to_owned(),
            },
        )
    }
}
