//! PostgreSQL persistence adapters built on Diesel and diesel-async.

pub mod diesel_appointment_repository;
pub mod diesel_favourite_repository;
pub mod diesel_listing_repository;
pub mod diesel_membership_repository;
pub mod diesel_question_repository;
pub mod diesel_user_repository;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod schema;

pub use diesel_appointment_repository::DieselAppointmentRepository;
pub use diesel_favourite_repository::DieselFavouriteRepository;
pub use diesel_listing_repository::DieselListingRepository;
pub use diesel_membership_repository::DieselMembershipRepository;
pub use diesel_question_repository::DieselQuestionRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
