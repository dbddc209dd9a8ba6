//! Listings: for-sale business records and the search filter model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Validation errors raised by listing constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingValidationError {
    /// The title is blank.
    EmptyTitle,
    /// The title exceeds [`TITLE_MAX`] characters.
    TitleTooLong {
        /// Maximum permitted length.
        max: usize,
    },
    /// The category is blank.
    EmptyCategory,
    /// The description is blank.
    EmptyDescription,
    /// A monetary amount was negative.
    NegativeAmount,
    /// A filter range has `min` above `max`.
    InvertedRange {
        /// Name of the offending filter field pair.
        field: &'static str,
    },
    /// The status string is not one of the known statuses.
    UnknownStatus {
        /// The rejected input.
        value: String,
    },
}

impl fmt::Display for ListingValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::TitleTooLong { max } => write!(f, "title must be at most {max} characters"),
            Self::EmptyCategory => write!(f, "category must not be empty"),
            Self::EmptyDescription => write!(f, "description must not be empty"),
            Self::NegativeAmount => write!(f, "monetary amounts must not be negative"),
            Self::InvertedRange { field } => {
                write!(f, "{field} range must have min at or below max")
            }
            Self::UnknownStatus { value } => write!(f, "unknown listing status: {value}"),
        }
    }
}

impl std::error::Error for ListingValidationError {}

/// Maximum allowed length for a listing title.
pub const TITLE_MAX: usize = 120;

/// Monetary amount in integer minor units (e.g. cents).
///
/// The upstream data kept amounts as display strings; server-side range
/// filtering needs numeric comparison, so amounts are integers here and
/// rendered for display at the DTO boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Construct from minor units.
    ///
    /// # Errors
    ///
    /// Returns [`ListingValidationError::NegativeAmount`] for negative input.
    pub fn from_minor(minor: i64) -> Result<Self, ListingValidationError> {
        if minor < 0 {
            return Err(ListingValidationError::NegativeAmount);
        }
        Ok(Self(minor))
    }

    /// The amount in minor units.
    #[must_use]
    pub fn minor_units(self) -> i64 {
        self.0
    }

    /// Render as a `major.minor` display string, e.g. `"1250.00"`.
    #[must_use]
    pub fn to_display_string(self) -> String {
        format!("{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

/// Review status of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    /// Awaiting administrator review; visible only to owner and admins.
    Pending,
    /// Approved and publicly searchable.
    Approved,
    /// Rejected by an administrator; visible only to owner and admins.
    Rejected,
}

impl ListingStatus {
    /// Stable string form persisted in the database.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parse the persisted string form.
    ///
    /// # Errors
    ///
    /// Returns [`ListingValidationError::UnknownStatus`] for other input.
    pub fn parse(value: &str) -> Result<Self, ListingValidationError> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(ListingValidationError::UnknownStatus {
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input payload for [`Listing::new`].
#[derive(Debug, Clone)]
pub struct ListingDraft {
    /// Stable identifier.
    pub id: Uuid,
    /// Selling account.
    pub owner_id: Uuid,
    /// Headline shown in search results.
    pub title: String,
    /// Business category, e.g. `"saas"` or `"dropshipping"`.
    pub category: String,
    /// Long-form description.
    pub description: String,
    /// Asking price.
    pub asking_price: Money,
    /// Trailing-twelve-month average monthly revenue.
    pub monthly_revenue: Money,
    /// Trailing-twelve-month average monthly profit.
    pub monthly_profit: Money,
    /// Review status.
    pub status: ListingStatus,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last modification instant.
    pub updated_at: DateTime<Utc>,
}

/// A for-sale business record.
///
/// ## Invariants
/// - `title`, `category`, and `description` are non-blank; `title` is at
///   most [`TITLE_MAX`] characters.
/// - All monetary amounts are non-negative.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    category: String,
    description: String,
    asking_price: Money,
    monthly_revenue: Money,
    monthly_profit: Money,
    status: ListingStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Listing {
    /// Validate and construct a listing.
    ///
    /// # Errors
    ///
    /// Returns [`ListingValidationError`] when any text field is blank or
    /// the title is too long. Amounts are already validated by [`Money`].
    pub fn new(draft: ListingDraft) -> Result<Self, ListingValidationError> {
        let title = draft.title.trim().to_owned();
        if title.is_empty() {
            return Err(ListingValidationError::EmptyTitle);
        }
        if title.chars().count() > TITLE_MAX {
            return Err(ListingValidationError::TitleTooLong { max: TITLE_MAX });
        }
        let category = draft.category.trim().to_lowercase();
        if category.is_empty() {
            return Err(ListingValidationError::EmptyCategory);
        }
        let description = draft.description.trim().to_owned();
        if description.is_empty() {
            return Err(ListingValidationError::EmptyDescription);
        }
        Ok(Self {
            id: draft.id,
            owner_id: draft.owner_id,
            title,
            category,
            description,
            asking_price: draft.asking_price,
            monthly_revenue: draft.monthly_revenue,
            monthly_profit: draft.monthly_profit,
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

    /// Selling account.
    #[must_use]
    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    /// Headline shown in search results.
    #[must_use]
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Business category.
    #[must_use]
    pub fn category(&self) -> &str {
        self.category.as_str()
    }

    /// Long-form description.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Asking price.
    #[must_use]
    pub fn asking_price(&self) -> Money {
        self.asking_price
    }

    /// Average monthly revenue.
    #[must_use]
    pub fn monthly_revenue(&self) -> Money {
        self.monthly_revenue
    }

    /// Average monthly profit.
    #[must_use]
    pub fn monthly_profit(&self) -> Money {
        self.monthly_profit
    }

    /// Review status.
    #[must_use]
    pub fn status(&self) -> ListingStatus {
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

    /// Whether `viewer` may see this listing at all.
    ///
    /// Approved listings are public; pending and rejected listings stay
    /// between the owner and administrators.
    #[must_use]
    pub fn is_visible_to(&self, viewer: Option<(Uuid, crate::domain::Role)>) -> bool {
        if self.status == ListingStatus::Approved {
            return true;
        }
        match viewer {
            Some((id, role)) => id == self.owner_id || role == crate::domain::Role::Admin,
            None => false,
        }
    }
}

/// One optional inclusive bound pair over a monetary field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoneyRange {
    /// Inclusive lower bound.
    pub min: Option<Money>,
    /// Inclusive upper bound.
    pub max: Option<Money>,
}

impl MoneyRange {
    fn validate(self, field: &'static str) -> Result<Self, ListingValidationError> {
        if let (Some(min), Some(max)) = (self.min, self.max)
            && min > max
        {
            return Err(ListingValidationError::InvertedRange { field });
        }
        Ok(self)
    }

    fn contains(self, value: Money) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }

    /// Whether neither bound is set.
    #[must_use]
    pub fn is_unbounded(self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Search filter over approved listings.
///
/// Each field is optional; the repository composes the present ones into a
/// single SQL statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFilter {
    /// Case-insensitive substring match on the title.
    pub query: Option<String>,
    /// Exact category match.
    pub category: Option<String>,
    /// Asking price bounds.
    pub asking_price: MoneyRange,
    /// Monthly revenue bounds.
    pub monthly_revenue: MoneyRange,
    /// Monthly profit bounds.
    pub monthly_profit: MoneyRange,
}

impl ListingFilter {
    /// Validate the filter: blank text fields become `None` and every
    /// present range must satisfy `min <= max`.
    ///
    /// # Errors
    ///
    /// Returns [`ListingValidationError::InvertedRange`] naming the first
    /// offending field pair.
    pub fn validated(mut self) -> Result<Self, ListingValidationError> {
        self.query = self
            .query
            .map(|q| q.trim().to_owned())
            .filter(|q| !q.is_empty());
        self.category = self
            .category
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty());
        self.asking_price = self.asking_price.validate("askingPrice")?;
        self.monthly_revenue = self.monthly_revenue.validate("monthlyRevenue")?;
        self.monthly_profit = self.monthly_profit.validate("monthlyProfit")?;
        Ok(self)
    }

    /// Whether an individual listing satisfies the filter.
    ///
    /// The SQL adapter evaluates this predicate in the database; fixtures
    /// and tests evaluate it in process.
    #[must_use]
    pub fn matches(&self, listing: &Listing) -> bool {
        if let Some(query) = &self.query
            && !listing.title().to_lowercase().contains(&query.to_lowercase())
        {
            return false;
        }
        if let Some(category) = &self.category
            && listing.category() != category
        {
            return false;
        }
        self.asking_price.contains(listing.asking_price())
            && self.monthly_revenue.contains(listing.monthly_revenue())
            && self.monthly_profit.contains(listing.monthly_profit())
    }
}
