//! Premium membership: plan constants and durable purchase orders.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::listing::Money;

/// The single paid plan.
pub const PREMIUM_PLAN: &str = "premium-monthly";

/// Days of membership granted per paid order.
pub const PREMIUM_TERM_DAYS: i64 = 30;

/// Validation errors raised by membership-order constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipValidationError {
    /// The gateway reference is blank.
    EmptyReference,
    /// The currency code is blank.
    EmptyCurrency,
    /// The status string is not one of the known statuses.
    UnknownStatus {
        /// The rejected input.
        value: String,
    },
}

impl fmt::Display for MembershipValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyReference => write!(f, "order reference must not be empty"),
            Self::EmptyCurrency => write!(f, "currency must not be empty"),
            Self::UnknownStatus { value } => write!(f, "unknown order status: {value}"),
        }
    }
}

impl std::error::Error for MembershipValidationError {}

/// Settlement status of a membership order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created; the buyer has been sent to the gateway.
    Pending,
    /// The gateway confirmed payment.
    Paid,
    /// The gateway reported failure or abandonment.
    Failed,
}

impl OrderStatus {
    /// Stable string form persisted in the database.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
        }
    }

    /// Parse the persisted string form.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipValidationError::UnknownStatus`] for other input.
    pub fn parse(value: &str) -> Result<Self, MembershipValidationError> {
        match value {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            other => Err(MembershipValidationError::UnknownStatus {
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input payload for [`MembershipOrder::new`].
#[derive(Debug, Clone)]
pub struct MembershipOrderDraft {
    /// Stable identifier.
    pub id: Uuid,
    /// Purchasing account.
    pub user_id: Uuid,
    /// Plan identifier, currently always [`PREMIUM_PLAN`].
    pub plan: String,
    /// Charge amount.
    pub amount: Money,
    /// ISO currency code, e.g. `"USD"`.
    pub currency: String,
    /// Unique reference shared with the gateway.
    pub reference: String,
    /// Settlement status.
    pub status: OrderStatus,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last modification instant.
    pub updated_at: DateTime<Utc>,
}

/// Durable record of one premium purchase attempt.
///
/// ## Invariants
/// - `reference` is non-blank and unique across orders; the gateway echoes
///   it back in notifications.
#[derive(Debug, Clone, PartialEq)]
pub struct MembershipOrder {
    id: Uuid,
    user_id: Uuid,
    plan: String,
    amount: Money,
    currency: String,
    reference: String,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MembershipOrder {
    /// Validate and construct an order.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipValidationError`] when the reference or currency
    /// is blank.
    pub fn new(draft: MembershipOrderDraft) -> Result<Self, MembershipValidationError> {
        let reference = draft.reference.trim().to_owned();
        if reference.is_empty() {
            return Err(MembershipValidationError::EmptyReference);
        }
        let currency = draft.currency.trim().to_uppercase();
        if currency.is_empty() {
            return Err(MembershipValidationError::EmptyCurrency);
        }
        Ok(Self {
            id: draft.id,
            user_id: draft.user_id,
            plan: draft.plan,
            amount: draft.amount,
            currency,
            reference,
            status: draft.status,
            created_at: draft.created_at,
            updated_at: draft.updated_at,
        })
    }

    /// Stable identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Purchasing account.
    #[must_use]
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Plan identifier.
    #[must_use]
    pub fn plan(&self) -> &str {
        self.plan.as_str()
    }

    /// Charge amount.
    #[must_use]
    pub fn amount(&self) -> Money {
        self.amount
    }

    /// ISO currency code.
    #[must_use]
    pub fn currency(&self) -> &str {
        self.currency.as_str()
    }

    /// Unique gateway reference.
    #[must_use]
    pub fn reference(&self) -> &str {
        self.reference.as_str()
    }

    /// Settlement status.
    #[must_use]
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Creation instant.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last modification instant.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Expiry granted by a paid order: [`PREMIUM_TERM_DAYS`] on top of the
/// later of `now` and any unexpired membership, so repeat purchases extend
/// rather than overlap.
#[must_use]
pub fn extend_membership(current: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    let base = current.filter(|until| *until > now).unwrap_or(now);
    base + Duration::days(PREMIUM_TERM_DAYS)
}
