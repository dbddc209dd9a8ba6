//! Diesel-backed [`AppointmentRepository`] adapter.
//!
//! Seller-side reads join through `listings.owner_id`; the port hides the
//! join behind the seller's account id.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::appointment::{Appointment, AppointmentStatus};
use crate::domain::ports::{AppointmentPersistenceError, AppointmentRepository};

use super::models::AppointmentRow;
use super::pool::DbPool;
use super::schema::{appointments, listings};

/// PostgreSQL persistence for appointments.
#[derive(Clone)]
pub struct DieselAppointmentRepository {
    pool: DbPool,
}

impl DieselAppointmentRepository {
    /// Create an adapter over the shared pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn connection(err: impl std::fmt::Display) -> AppointmentPersistenceError {
    AppointmentPersistenceError::connection(err.to_string())
}

fn query(err: impl std::fmt::Display) -> AppointmentPersistenceError {
    AppointmentPersistenceError::query(err.to_string())
}

fn rows_to_domain(
    rows: Vec<AppointmentRow>,
) -> Result<Vec<Appointment>, AppointmentPersistenceError> {
    rows.into_iter()
        .map(|row| row.into_domain().map_err(AppointmentPersistenceError::query))
        .collect()
}

#[async_trait]
impl AppointmentRepository for DieselAppointmentRepository {
    async fn create(
        &self,
        appointment: &Appointment,
    ) -> Result<(), AppointmentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(connection)?;
        diesel::insert_into(appointments::table)
            .values(AppointmentRow::from_domain(appointment))
            .execute(&mut conn)
            .await
            .map_err(query)?;
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<Appointment>, AppointmentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(connection)?;
        let row = appointments::table
            .find(id)
            .select(AppointmentRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(query)?;
        row.map(AppointmentRow::into_domain)
            .transpose()
            .map_err(AppointmentPersistenceError::query)
    }

    async fn list_for_buyer(
        &self,
        buyer_id: Uuid,
    ) -> Result<Vec<Appointment>, AppointmentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(connection)?;
        let rows: Vec<AppointmentRow> = appointments::table
            .filter(appointments::buyer_id.eq(buyer_id))
            .order(appointments::scheduled_at.asc())
            .select(AppointmentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(query)?;
        rows_to_domain(rows)
    }

    async fn list_for_seller(
        &self,
        seller_id: Uuid,
    ) -> Result<Vec<Appointment>, AppointmentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(connection)?;
        let rows: Vec<AppointmentRow> = appointments::table
            .inner_join(listings::table)
            .filter(listings::owner_id.eq(seller_id))
            .order(appointments::scheduled_at.asc())
            .select(AppointmentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(query)?;
        rows_to_domain(rows)
    }

    async fn list_all(&self) -> Result<Vec<Appointment>, AppointmentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(connection)?;
        let rows: Vec<AppointmentRow> = appointments::table
            .order(appointments::scheduled_at.asc())
            .select(AppointmentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(query)?;
        rows_to_domain(rows)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Appointment>, AppointmentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(connection)?;
        let row: Option<AppointmentRow> = diesel::update(appointments::table.find(id))
            .set((
                appointments::status.eq(status.as_str()),
                appointments::updated_at.eq(updated_at),
            ))
            .returning(AppointmentRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(query)?;
        row.map(AppointmentRow::into_domain)
            .transpose()
            .map_err(AppointmentPersistenceError::query)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppointmentPersistenceError> {
        let mut conn = self.pool.get().await.map_err(connection)?;
        let deleted = diesel::delete(appointments::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(query)?;
        Ok(deleted > 0)
    }
}
