//! Shared helpers for handler tests.
//!
//! Everything here runs over the in-memory fixture state; no database or
//! network is touched.

use std::sync::Arc;

use actix_web::http::header;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::listing::{Listing, ListingDraft, ListingStatus, Money};
use crate::domain::ports::{
    FixtureAppointmentRepository, FixtureFavouriteRepository, FixtureListingRepository,
    FixtureMembershipRepository, FixturePaymentGateway, FixtureQuestionRepository,
    FixtureUserRepository, ListingRepository, UserRepository,
};
use crate::domain::user::{DisplayName, EmailAddress, Role, User, UserDraft};
use crate::inbound::http::state::{HttpState, HttpStatePorts};

/// Fixture-backed handler state.
pub fn test_state() -> HttpState {
    HttpState::fixture()
}

/// Fixture state that also hands back the appointment repository so tests
/// can seed listing-owner pairs for seller-side reads.
pub fn test_state_with_appointments() -> (HttpState, Arc<FixtureAppointmentRepository>) {
    let appointments = Arc::new(FixtureAppointmentRepository::default());
    let state = HttpState::fixture_with(HttpStatePorts {
        users: Arc::new(FixtureUserRepository::default()),
        listings: Arc::new(FixtureListingRepository::default()),
        favourites: Arc::new(FixtureFavouriteRepository::default()),
        appointments: Arc::clone(&appointments),
        questions: Arc::new(FixtureQuestionRepository::default()),
        memberships: Arc::new(FixtureMembershipRepository::default()),
        gateway: Arc::new(FixturePaymentGateway),
    });
    (state, appointments)
}

/// Insert an account with the given role and return it with a valid bearer
/// token. The stored password hash is a stub; login tests register through
/// the endpoint instead.
pub async fn seeded_user(state: &HttpState, role: Role) -> (User, String) {
    let user = User::new(UserDraft {
        id: Uuid::new_v4(),
        email: EmailAddress::new(format!("{}@example.com", Uuid::new_v4().simple()))
            .expect("generated email is valid"),
        display_name: DisplayName::new("Fixture Person").expect("valid name"),
        role,
        password_hash: "$argon2id$stub".to_owned(),
        premium_until: None,
        created_at: Utc::now(),
    });
    state.users.create(&user).await.expect("fixture insert succeeds");
    let token = state.tokens.issue(&user).expect("token issues");
    (user, token)
}

/// Insert a listing owned by `owner_id` in the given review status.
pub async fn seeded_listing(state: &HttpState, owner_id: Uuid, status: ListingStatus) -> Listing {
    let now = Utc::now();
    let listing = Listing::new(ListingDraft {
        id: Uuid::new_v4(),
        owner_id,
        title: format!("Fixture storefront {}", Uuid::new_v4().simple()),
        category: "saas".to_owned(),
        description: "A tidy recurring-revenue business.".to_owned(),
        asking_price: Money::from_minor(120_000_00).expect("amount"),
        monthly_revenue: Money::from_minor(8_500_00).expect("amount"),
        monthly_profit: Money::from_minor(3_100_00).expect("amount"),
        status,
        created_at: now,
        updated_at: now,
    })
    .expect("valid listing");
    state
        .listings
        .create(&listing)
        .await
        .expect("fixture insert succeeds");
    listing
}

/// `Authorization` header pair for a bearer token.
pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {token}"))
}
