//! Domain ports: traits the inbound adapters depend on and the outbound
//! adapters implement, plus in-memory fixtures for tests and DB-less runs.

mod macros;

pub mod appointment_repository;
pub mod favourite_repository;
pub mod listing_repository;
pub mod membership_repository;
pub mod payment_gateway;
pub mod question_repository;
pub mod user_repository;

pub(crate) use macros::define_port_error;

pub use appointment_repository::{
    AppointmentPersistenceError, AppointmentRepository, FixtureAppointmentRepository,
};
pub use favourite_repository::{
    FavouritePersistenceError, FavouriteRepository, FixtureFavouriteRepository,
};
pub use listing_repository::{
    FixtureListingRepository, ListingPage, ListingPersistenceError, ListingRepository,
};
pub use membership_repository::{
    FixtureMembershipRepository, MembershipPersistenceError, MembershipRepository,
};
pub use payment_gateway::{
    FixturePaymentGateway, PaymentGateway, PaymentGatewayError, PaymentToken,
    PaymentTokenRequest,
};
pub use question_repository::{
    FixtureQuestionRepository, QuestionPersistenceError, QuestionRepository,
};
pub use user_repository::{FixtureUserRepository, UserPersistenceError, UserRepository};
