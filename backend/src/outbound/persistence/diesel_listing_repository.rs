//! Diesel-backed [`ListingRepository`] adapter.
//!
//! Search composes the optional text and numeric filters into a single
//! boxed query; the same builder backs both the page read and the total
//! count so they cannot drift apart.

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use pagination::PageRequest;
use uuid::Uuid;

use crate::domain::listing::{Listing, ListingFilter, ListingStatus};
use crate::domain::ports::{ListingPage, ListingPersistenceError, ListingRepository};

use super::models::ListingRow;
use super::pool::DbPool;
use super::schema::listings;

/// PostgreSQL persistence and search for listings.
#[derive(Clone)]
pub struct DieselListingRepository {
    pool: DbPool,
}

impl DieselListingRepository {
    /// Create an adapter over the shared pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn connection(err: impl std::fmt::Display) -> ListingPersistenceError {
    ListingPersistenceError::connection(err.to_string())
}

fn query(err: impl std::fmt::Display) -> ListingPersistenceError {
    ListingPersistenceError::query(err.to_string())
}

/// Escape LIKE metacharacters so user input matches literally.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Compose the approved-only search filter into one boxed query.
fn filtered(filter: &ListingFilter) -> listings::BoxedQuery<'static, Pg> {
    let mut q = listings::table
        .into_boxed()
        .filter(listings::status.eq(ListingStatus::Approved.as_str()));
    if let Some(term) = &filter.query {
        q = q.filter(listings::title.ilike(format!("%{}%", escape_like(term))));
    }
    if let Some(category) = &filter.category {
        q = q.filter(listings::category.eq(category.clone()));
    }
    if let Some(min) = filter.asking_price.min {
        q = q.filter(listings::asking_price_minor.ge(min.minor_units()));
    }
    if let Some(max) = filter.asking_price.max {
        q = q.filter(listings::asking_price_minor.le(max.minor_units()));
    }
    if let Some(min) = filter.monthly_revenue.min {
        q = q.filter(listings::monthly_revenue_minor.ge(min.minor_units()));
    }
    if let Some(max) = filter.monthly_revenue.max {
        q = q.filter(listings::monthly_revenue_minor.le(max.minor_units()));
    }
    if let Some(min) = filter.monthly_profit.min {
        q = q.filter(listings::monthly_profit_minor.ge(min.minor_units()));
    }
    if let Some(max) = filter.monthly_profit.max {
        q = q.filter(listings::monthly_profit_minor.le(max.minor_units()));
    }
    q
}

fn rows_to_domain(rows: Vec<ListingRow>) -> Result<Vec<Listing>, ListingPersistenceError> {
    rows.into_iter()
        .map(|row| row.into_domain().map_err(ListingPersistenceError::query))
        .collect()
}

#[async_trait]
impl ListingRepository for DieselListingRepository {
    async fn create(&self, listing: &Listing) -> Result<(), ListingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(connection)?;
        diesel::insert_into(listings::table)
            .values(ListingRow::from_domain(listing))
            .execute(&mut conn)
            .await
            .map_err(query)?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Listing>, ListingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(connection)?;
        let row = listings::table
            .find(id)
            .select(ListingRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(query)?;
        row.map(ListingRow::into_domain)
            .transpose()
            .map_err(ListingPersistenceError::query)
    }

    async fn update(&self, listing: &Listing) -> Result<(), ListingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(connection)?;
        let touched = diesel::update(listings::table.find(listing.id()))
            .set(ListingRow::from_domain(listing))
            .execute(&mut conn)
            .await
            .map_err(query)?;
        if touched == 0 {
            return Err(ListingPersistenceError::query("no such listing"));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ListingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(connection)?;
        let deleted = diesel::delete(listings::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(query)?;
        Ok(deleted > 0)
    }

    async fn search_approved(
        &self,
        filter: &ListingFilter,
        page: PageRequest,
    ) -> Result<ListingPage, ListingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(connection)?;
        let total: i64 = filtered(filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(query)?;
        let rows: Vec<ListingRow> = filtered(filter)
            .order(listings::created_at.desc())
            .limit(i64::from(page.limit()))
            .offset(i64::try_from(page.offset()).unwrap_or(i64::MAX))
            .select(ListingRow::as_select())
            .load(&mut conn)
            .await
            .map_err(query)?;
        Ok(ListingPage {
            items: rows_to_domain(rows)?,
            total: u64::try_from(total).unwrap_or(0),
        })
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<Listing>, ListingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(connection)?;
        let rows: Vec<ListingRow> = listings::table
            .filter(listings::owner_id.eq(owner_id))
            .order(listings::created_at.desc())
            .select(ListingRow::as_select())
            .load(&mut conn)
            .await
            .map_err(query)?;
        rows_to_domain(rows)
    }

    async fn list_by_status(
        &self,
        status: ListingStatus,
    ) -> Result<Vec<Listing>, ListingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(connection)?;
        let rows: Vec<ListingRow> = listings::table
            .filter(listings::status.eq(status.as_str()))
            .order(listings::created_at.asc())
            .select(ListingRow::as_select())
            .load(&mut conn)
            .await
            .map_err(query)?;
        rows_to_domain(rows)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: ListingStatus,
    ) -> Result<Option<Listing>, ListingPersistenceError> {
        let mut conn = self.pool.get().await.map_err(connection)?;
        let row: Option<ListingRow> = diesel::update(listings::table.find(id))
            .set((
                listings::status.eq(status.as_str()),
                listings::updated_at.eq(chrono::Utc::now()),
            ))
            .returning(ListingRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(query)?;
        row.map(ListingRow::into_domain)
            .transpose()
            .map_err(ListingPersistenceError::query)
    }
}
