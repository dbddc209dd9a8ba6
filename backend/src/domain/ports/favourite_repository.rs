//! Port for favourite (saved listing) persistence.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::define_port_error;

define_port_error! {
    /// Errors raised by favourite repository adapters.
    pub enum FavouritePersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "favourite repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "favourite repository query failed: {message}",
    }
}

/// Port for toggling and reading a user's saved listings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FavouriteRepository: Send + Sync {
    /// Flip the saved state of `(user, listing)`; returns the new state
    /// (`true` when the pair is now saved).
    async fn toggle(
        &self,
        user_id: Uuid,
        listing_id: Uuid,
    ) -> Result<bool, FavouritePersistenceError>;

    /// Listing ids the user has saved, most recently saved first.
    async fn list_for_user(&self, user_id: Uuid)
    -> Result<Vec<Uuid>, FavouritePersistenceError>;

    /// Whether the pair is currently saved.
    async fn contains(
        &self,
        user_id: Uuid,
        listing_id: Uuid,
    ) -> Result<bool, FavouritePersistenceError>;
}

/// In-memory implementation backing handler tests and local runs without a
/// database.
#[derive(Debug, Default)]
pub struct FixtureFavouriteRepository {
    pairs: Mutex<Vec<(Uuid, Uuid)>>,
}

impl FixtureFavouriteRepository {
    fn lock(&self) -> MutexGuard<'_, Vec<(Uuid, Uuid)>> {
        self.pairs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl FavouriteRepository for FixtureFavouriteRepository {
    async fn toggle(
        &self,
        user_id: Uuid,
        listing_id: Uuid,
    ) -> Result<bool, FavouritePersistenceError> {
        let mut pairs = self.lock();
        let before = pairs.len();
        pairs.retain(|pair| *pair != (user_id, listing_id));
        if pairs.len() == before {
            pairs.push((user_id, listing_id));
            return Ok(true);
        }
        Ok(false)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Uuid>, FavouritePersistenceError> {
        Ok(self
            .lock()
            .iter()
            .rev()
            .filter(|(user, _)| *user == user_id)
            .map(|(_, listing)| *listing)
            .collect())
    }

    async fn contains(
        &self,
        user_id: Uuid,
        listing_id: Uuid,
    ) -> Result<bool, FavouritePersistenceError> {
        Ok(self.lock().contains(&(user_id, listing_id)))
    }
}
