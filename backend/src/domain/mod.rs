//! Domain primitives and aggregates.
//!
//! Purpose: strongly typed marketplace entities, credential handling, and
//! the ports adapters implement. Keep types immutable and document
//! invariants and serialisation contracts in each type's Rustdoc; transport
//! concerns live in the inbound adapters.

pub mod appointment;
pub mod auth;
pub mod billing;
pub mod error;
pub mod listing;
pub mod membership;
pub mod ports;
pub mod question;
pub mod user;

pub use self::appointment::{Appointment, AppointmentStatus, AppointmentValidationError};
pub use self::auth::{AuthError, Claims, PasswordPolicy, TokenIssuer};
pub use self::billing::{
    BillingConfig, BillingService, CheckoutSession, NotificationOutcome, NotificationSigner,
    PaymentNotification,
};
pub use self::error::{Error, ErrorCode};
pub use self::listing::{Listing, ListingFilter, ListingStatus, ListingValidationError, Money};
pub use self::membership::{MembershipOrder, MembershipValidationError, OrderStatus};
pub use self::question::{Question, QuestionValidationError};
pub use self::user::{Role, User, UserValidationError};

/// Response header carrying the request-scoped trace identifier.
pub const TRACE_ID_HEADER: &str = "trace-id";
