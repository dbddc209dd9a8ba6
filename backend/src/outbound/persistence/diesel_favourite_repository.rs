//! Diesel-backed [`FavouriteRepository`] adapter.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{FavouritePersistenceError, FavouriteRepository};

use super::models::FavouriteRow;
use super::pool::DbPool;
use super::schema::favourites;

/// PostgreSQL persistence for saved listings.
#[derive(Clone)]
pub struct DieselFavouriteRepository {
    pool: DbPool,
}

impl DieselFavouriteRepository {
    /// Create an adapter over the shared pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn connection(err: impl std::fmt::Display) -> FavouritePersistenceError {
    FavouritePersistenceError::connection(err.to_string())
}

fn query(err: impl std::fmt::Display) -> FavouritePersistenceError {
    FavouritePersistenceError::query(err.to_string())
}

#[async_trait]
impl FavouriteRepository for DieselFavouriteRepository {
    async fn toggle(
        &self,
        user_id: Uuid,
        listing_id: Uuid,
    ) -> Result<bool, FavouritePersistenceError> {
        let mut conn = self.pool.get().await.map_err(connection)?;
        // Removing first keeps the toggle a single round trip in the
        // common un-save case; a zero-row delete means we are saving.
        let removed = diesel::delete(favourites::table.find((user_id, listing_id)))
            .execute(&mut conn)
            .await
            .map_err(query)?;
        if removed > 0 {
            return Ok(false);
        }
        diesel::insert_into(favourites::table)
            .values(FavouriteRow {
                user_id,
                listing_id,
                created_at: Utc::now(),
            })
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await
            .map_err(query)?;
        Ok(true)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Uuid>, FavouritePersistenceError> {
        let mut conn = self.pool.get().await.map_err(connection)?;
        favourites::table
            .filter(favourites::user_id.eq(user_id))
            .order(favourites::created_at.desc())
            .select(favourites::listing_id)
            .load(&mut conn)
            .await
            .map_err(query)
    }

    async fn contains(
        &self,
        user_id: Uuid,
        listing_id: Uuid,
    ) -> Result<bool, FavouritePersistenceError> {
        let mut conn = self.pool.get().await.map_err(connection)?;
        let count: i64 = favourites::table
            .find((user_id, listing_id))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(query)?;
        Ok(count > 0)
    }
}
