//! Diesel row models and conversions to and from domain entities.
//!
//! Rows mirror their tables column for column. Reads go through
//! `Row::as_select()` so column order changes cannot silently corrupt
//! mappings; conversion failures surface as query errors naming the broken
//! column rather than panicking.

use chrono::{DateTime, Utc};
use diesel::prelude::{AsChangeset, Insertable, Queryable, Selectable};
use uuid::Uuid;

use crate::domain::appointment::{Appointment, AppointmentDraft, AppointmentStatus};
use crate::domain::listing::{Listing, ListingDraft, ListingStatus, Money};
use crate::domain::membership::{MembershipOrder, MembershipOrderDraft, OrderStatus};
use crate::domain::question::{Question, QuestionDraft};
use crate::domain::user::{DisplayName, EmailAddress, Role, User, UserDraft};

use super::schema::{appointments, favourites, listings, membership_orders, questions, users};

/// Row in `users`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub password_hash: String,
    pub premium_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    /// Project a domain user for insertion.
    pub fn from_domain(user: &User) -> Self {
        Self {
            id: user.id(),
            email: user.email().to_string(),
            display_name: user.display_name().to_string(),
            role: user.role().as_str().to_owned(),
            password_hash: user.password_hash().to_owned(),
            premium_until: user.premium_until(),
            created_at: user.created_at(),
            updated_at: user.created_at(),
        }
    }

    /// Rehydrate the domain user.
    pub fn into_domain(self) -> Result<User, String> {
        Ok(User::new(UserDraft {
            id: self.id,
            email: EmailAddress::new(self.email).map_err(|err| format!("email: {err}"))?,
            display_name: DisplayName::new(self.display_name)
                .map_err(|err| format!("display_name: {err}"))?,
            role: Role::parse(&self.role).map_err(|err| format!("role: {err}"))?,
            password_hash: self.password_hash,
            premium_until: self.premium_until,
            created_at: self.created_at,
        }))
    }
}

/// Row in `listings`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = listings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ListingRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub category: String,
    pub description: String,
    pub asking_price_minor: i64,
    pub monthly_revenue_minor: i64,
    pub monthly_profit_minor: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ListingRow {
    /// Project a domain listing for insertion or update.
    pub fn from_domain(listing: &Listing) -> Self {
        Self {
            id: listing.id(),
            owner_id: listing.owner_id(),
            title: listing.title().to_owned(),
            category: listing.category().to_owned(),
            description: listing.description().to_owned(),
            asking_price_minor: listing.asking_price().minor_units(),
            monthly_revenue_minor: listing.monthly_revenue().minor_units(),
            monthly_profit_minor: listing.monthly_profit().minor_units(),
            status: listing.status().as_str().to_owned(),
            created_at: listing.created_at(),
            updated_at: listing.updated_at(),
        }
    }

    /// Rehydrate the domain listing.
    pub fn into_domain(self) -> Result<Listing, String> {
        Listing::new(ListingDraft {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title,
            category: self.category,
            description: self.description,
            asking_price: Money::from_minor(self.asking_price_minor)
                .map_err(|err| format!("asking_price_minor: {err}"))?,
            monthly_revenue: Money::from_minor(self.monthly_revenue_minor)
                .map_err(|err| format!("monthly_revenue_minor: {err}"))?,
            monthly_profit: Money::from_minor(self.monthly_profit_minor)
                .map_err(|err| format!("monthly_profit_minor: {err}"))?,
            status: ListingStatus::parse(&self.status).map_err(|err| format!("status: {err}"))?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
        .map_err(|err| err.to_string())
    }
}

/// Row in `favourites`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = favourites)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FavouriteRow {
    pub user_id: Uuid,
    pub listing_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Row in `appointments`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = appointments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AppointmentRow {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub buyer_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub note: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AppointmentRow {
    /// Project a domain appointment for insertion.
    pub fn from_domain(appointment: &Appointment) -> Self {
        Self {
            id: appointment.id(),
            listing_id: appointment.listing_id(),
            buyer_id: appointment.buyer_id(),
            scheduled_at: appointment.scheduled_at(),
            note: appointment.note().map(str::to_owned),
            status: appointment.status().as_str().to_owned(),
            created_at: appointment.created_at(),
            updated_at: appointment.updated_at(),
        }
    }

    /// Rehydrate the domain appointment.
    pub fn into_domain(self) -> Result<Appointment, String> {
        Appointment::new(AppointmentDraft {
            id: self.id,
            listing_id: self.listing_id,
            buyer_id: self.buyer_id,
            scheduled_at: self.scheduled_at,
            note: self.note,
            status: AppointmentStatus::parse(&self.status)
                .map_err(|err| format!("status: {err}"))?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
        .map_err(|err| err.to_string())
    }
}

/// Row in `questions`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = questions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct QuestionRow {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub answer: Option<String>,
    pub answered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl QuestionRow {
    /// Project a domain question for insertion.
    pub fn from_domain(question: &Question) -> Self {
        Self {
            id: question.id(),
            listing_id: question.listing_id(),
            author_id: question.author_id(),
            body: question.body().to_owned(),
            answer: question.answer().map(str::to_owned),
            answered_at: question.answered_at(),
            created_at: question.created_at(),
        }
    }

    /// Rehydrate the domain question.
    pub fn into_domain(self) -> Result<Question, String> {
        Question::new(QuestionDraft {
            id: self.id,
            listing_id: self.listing_id,
            author_id: self.author_id,
            body: self.body,
            answer: self.answer,
            answered_at: self.answered_at,
            created_at: self.created_at,
        })
        .map_err(|err| err.to_string())
    }
}

/// Row in `membership_orders`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = membership_orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MembershipOrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan: String,
    pub amount_minor: i64,
    pub currency: String,
    pub reference: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MembershipOrderRow {
    /// Project a domain order for insertion.
    pub fn from_domain(order: &MembershipOrder) -> Self {
        Self {
            id: order.id(),
            user_id: order.user_id(),
            plan: order.plan().to_owned(),
            amount_minor: order.amount().minor_units(),
            currency: order.currency().to_owned(),
            reference: order.reference().to_owned(),
            status: order.status().as_str().to_owned(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }

    /// Rehydrate the domain order.
    pub fn into_domain(self) -> Result<MembershipOrder, String> {
        MembershipOrder::new(MembershipOrderDraft {
            id: self.id,
            user_id: self.user_id,
            plan: self.plan,
            amount: Money::from_minor(self.amount_minor)
                .map_err(|err| format!("amount_minor: {err}"))?,
            currency: self.currency,
            reference: self.reference,
            status: OrderStatus::parse(&self.status).map_err(|err| format!("status: {err}"))?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
        .map_err(|err| err.to_string())
    }
}

#[cfg(test)]
mod tests {
    //! Round-trip coverage for row conversions.

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn listing_rows_round_trip() {
        let now = Utc::now();
        let listing = Listing::new(ListingDraft {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: "Candle subscription box".to_owned(),
            category: "subscriptions".to_owned(),
            description: "Steady subscriber base.".to_owned(),
            asking_price: Money::from_minor(45_000_00).expect("amount"),
            monthly_revenue: Money::from_minor(2_500_00).expect("amount"),
            monthly_profit: Money::from_minor(900_00).expect("amount"),
            status: ListingStatus::Approved,
            created_at: now,
            updated_at: now,
        })
        .expect("valid listing");

        let row = ListingRow::from_domain(&listing);
        let back = row.into_domain().expect("row rehydrates");
        assert_eq!(back, listing);
    }

    #[rstest]
    fn corrupt_status_strings_surface_as_errors() {
        let now = Utc::now();
        let mut row = ListingRow {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: "t".to_owned(),
            category: "c".to_owned(),
            description: "d".to_owned(),
            asking_price_minor: 1,
            monthly_revenue_minor: 1,
            monthly_profit_minor: 1,
            status: "approved".to_owned(),
            created_at: now,
            updated_at: now,
        };
        row.status = "limbo".to_owned();
        let err = row.into_domain().expect_err("unknown status must fail");
        assert!(err.contains("status"));
    }
}
