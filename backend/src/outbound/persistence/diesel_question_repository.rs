//! Diesel-backed [`QuestionRepository`] adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{QuestionPersistenceError, QuestionRepository};
use crate::domain::question::Question;

use super::models::QuestionRow;
use super::pool::DbPool;
use super::schema::questions;

/// PostgreSQL persistence for listing Q&A.
#[derive(Clone)]
pub struct DieselQuestionRepository {
    pool: DbPool,
}

impl DieselQuestionRepository {
    /// Create an adapter over the shared pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn connection(err: impl std::fmt::Display) -> QuestionPersistenceError {
    QuestionPersistenceError::connection(err.to_string())
}

fn query(err: impl std::fmt::Display) -> QuestionPersistenceError {
    QuestionPersistenceError::query(err.to_string())
}

#[async_trait]
impl QuestionRepository for DieselQuestionRepository {
    async fn create(&self, question: &Question) -> Result<(), QuestionPersistenceError> {
        let mut conn = self.pool.get().await.map_err(connection)?;
        diesel::insert_into(questions::table)
            .values(QuestionRow::from_domain(question))
            .execute(&mut conn)
            .await
            .map_err(query)?;
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<Question>, QuestionPersistenceError> {
        let mut conn = self.pool.get().await.map_err(connection)?;
        let row = questions::table
            .find(id)
            .select(QuestionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(query)?;
        row.map(QuestionRow::into_domain)
            .transpose()
            .map_err(QuestionPersistenceError::query)
    }

    async fn list_for_listing(
        &self,
        listing_id: Uuid,
    ) -> Result<Vec<Question>, QuestionPersistenceError> {
        let mut conn = self.pool.get().await.map_err(connection)?;
        let rows: Vec<QuestionRow> = questions::table
            .filter(questions::listing_id.eq(listing_id))
            .order(questions::created_at.asc())
            .select(QuestionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(query)?;
        rows.into_iter()
            .map(|row| row.into_domain().map_err(QuestionPersistenceError::query))
            .collect()
    }

    async fn record_answer(
        &self,
        id: Uuid,
        answer: String,
        answered_at: DateTime<Utc>,
    ) -> Result<Option<Question>, QuestionPersistenceError> {
        let mut conn = self.pool.get().await.map_err(connection)?;
        let row: Option<QuestionRow> = diesel::update(questions::table.find(id))
            .set((
                questions::answer.eq(Some(answer)),
                questions::answered_at.eq(Some(answered_at)),
            ))
            .returning(QuestionRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(query)?;
        row.map(QuestionRow::into_domain)
            .transpose()
            .map_err(QuestionPersistenceError::query)
    }
}
