//! Diesel-backed [`MembershipRepository`] adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::membership::{MembershipOrder, OrderStatus};
use crate::domain::ports::{MembershipPersistenceError, MembershipRepository};

use super::models::MembershipOrderRow;
use super::pool::DbPool;
use super::schema::membership_orders;

/// PostgreSQL persistence for membership orders.
#[derive(Clone)]
pub struct DieselMembershipRepository {
    pool: DbPool,
}

impl DieselMembershipRepository {
    /// Create an adapter over the shared pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn connection(err: impl std::fmt::Display) -> MembershipPersistenceError {
    MembershipPersistenceError::connection(err.to_string())
}

fn query(err: impl std::fmt::Display) -> MembershipPersistenceError {
    MembershipPersistenceError::query(err.to_string())
}

#[async_trait]
impl MembershipRepository for DieselMembershipRepository {
    async fn create_order(
        &self,
        order: &MembershipOrder,
    ) -> Result<(), MembershipPersistenceError> {
        let mut conn = self.pool.get().await.map_err(connection)?;
        diesel::insert_into(membership_orders::table)
            .values(MembershipOrderRow::from_domain(order))
            .execute(&mut conn)
            .await
            .map_err(query)?;
        Ok(())
    }

    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<MembershipOrder>, MembershipPersistenceError> {
        let mut conn = self.pool.get().await.map_err(connection)?;
        let row = membership_orders::table
            .filter(membership_orders::reference.eq(reference.to_owned()))
            .select(MembershipOrderRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(query)?;
        row.map(MembershipOrderRow::into_domain)
            .transpose()
            .map_err(MembershipPersistenceError::query)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<MembershipOrder>, MembershipPersistenceError> {
        let mut conn = self.pool.get().await.map_err(connection)?;
        let rows: Vec<MembershipOrderRow> = membership_orders::table
            .filter(membership_orders::user_id.eq(user_id))
            .order(membership_orders::created_at.desc())
            .select(MembershipOrderRow::as_select())
            .load(&mut conn)
            .await
            .map_err(query)?;
        rows.into_iter()
            .map(|row| {
                row.into_domain()
                    .map_err(MembershipPersistenceError::query)
            })
            .collect()
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<MembershipOrder>, MembershipPersistenceError> {
        let mut conn = self.pool.get().await.map_err(connection)?;
        let row: Option<MembershipOrderRow> =
            diesel::update(membership_orders::table.find(id))
                .set((
                    membership_orders::status.eq(status.as_str()),
                    membership_orders::updated_at.eq(updated_at),
                ))
                .returning(MembershipOrderRow::as_returning())
                .get_result(&mut conn)
                .await
                .optional()
                .map_err(query)?;
        row.map(MembershipOrderRow::into_domain)
            .transpose()
            .map_err(MembershipPersistenceError::query)
    }
}
