//! Port for listing persistence and search.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use pagination::PageRequest;
use uuid::Uuid;

use crate::domain::listing::{Listing, ListingFilter, ListingStatus};

use super::define_port_error;

define_port_error! {
    /// Errors raised by listing repository adapters.
    pub enum ListingPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "listing repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "listing repository query failed: {message}",
    }
}

/// One page of search results plus the total match count.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingPage {
    /// Listings on this page, newest first.
    pub items: Vec<Listing>,
    /// Total number of listings matching the filter.
    pub total: u64,
}

/// Port for reading and writing listings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Persist a new listing.
    async fn create(&self, listing: &Listing) -> Result<(), ListingPersistenceError>;

    /// Find a listing by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Listing>, ListingPersistenceError>;

    /// Overwrite an existing listing.
    async fn update(&self, listing: &Listing) -> Result<(), ListingPersistenceError>;

    /// Delete a listing; `false` when no row existed.
    async fn delete(&self, id: Uuid) -> Result<bool, ListingPersistenceError>;

    /// Search approved listings with the composed filter, newest first.
    async fn search_approved(
        &self,
        filter: &ListingFilter,
        page: PageRequest,
    ) -> Result<ListingPage, ListingPersistenceError>;

    /// All listings owned by one seller, any status, newest first.
    async fn list_by_owner(&self, owner_id: Uuid)
    -> Result<Vec<Listing>, ListingPersistenceError>;

    /// All listings in one review status, oldest first (review queue order).
    async fn list_by_status(
        &self,
        status: ListingStatus,
    ) -> Result<Vec<Listing>, ListingPersistenceError>;

    /// Set the review status; returns the updated listing when it exists.
    async fn set_status(
        &self,
        id: Uuid,
        status: ListingStatus,
    ) -> Result<Option<Listing>, ListingPersistenceError>;
}

/// In-memory implementation backing handler tests and local runs without a
/// database.
#[derive(Debug, Default)]
pub struct FixtureListingRepository {
    listings: Mutex<Vec<Listing>>,
}

impl FixtureListingRepository {
    fn lock(&self) -> MutexGuard<'_, Vec<Listing>> {
        self.listings
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn with_status(listing: &Listing, status: ListingStatus) -> Listing {
    Listing::new(crate::domain::listing::ListingDraft {
        id: listing.id(),
        owner_id: listing.owner_id(),
        title: listing.title().to_owned(),
        category: listing.category().to_owned(),
        description: listing.description().to_owned(),
        asking_price: listing.asking_price(),
        monthly_revenue: listing.monthly_revenue(),
        monthly_profit: listing.monthly_profit(),
        status,
        created_at: listing.created_at(),
        updated_at: listing.updated_at(),
    })
    // The source listing already satisfied validation.
    .unwrap_or_else(|err| panic!("status change cannot invalidate a listing: {err}"))
}

#[async_trait]
impl ListingRepository for FixtureListingRepository {
    async fn create(&self, listing: &Listing) -> Result<(), ListingPersistenceError> {
        self.lock().push(listing.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Listing>, ListingPersistenceError> {
        Ok(self.lock().iter().find(|l| l.id() == id).cloned())
    }

    async fn update(&self, listing: &Listing) -> Result<(), ListingPersistenceError> {
        let mut listings = self.lock();
        match listings.iter().position(|l| l.id() == listing.id()) {
            Some(position) => {
                listings[position] = listing.clone();
                Ok(())
            }
            None => Err(ListingPersistenceError::query("no such listing")),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ListingPersistenceError> {
        let mut listings = self.lock();
        let before = listings.len();
        listings.retain(|l| l.id() != id);
        Ok(listings.len() != before)
    }

    async fn search_approved(
        &self,
        filter: &ListingFilter,
        page: PageRequest,
    ) -> Result<ListingPage, ListingPersistenceError> {
        let mut matches: Vec<Listing> = self
            .lock()
            .iter()
            .filter(|l| l.status() == ListingStatus::Approved && filter.matches(l))
            .cloned()
            .collect();
        matches.sort_by_key(|l| std::cmp::Reverse(l.created_at()));
        let total = matches.len() as u64;
        let items = matches
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(page.limit() as usize)
            .collect();
        Ok(ListingPage { items, total })
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<Listing>, ListingPersistenceError> {
        let mut owned: Vec<Listing> = self
            .lock()
            .iter()
            .filter(|l| l.owner_id() == owner_id)
            .cloned()
            .collect();
        owned.sort_by_key(|l| std::cmp::Reverse(l.created_at()));
        Ok(owned)
    }

    async fn list_by_status(
        &self,
        status: ListingStatus,
    ) -> Result<Vec<Listing>, ListingPersistenceError> {
        let mut queue: Vec<Listing> = self
            .lock()
            .iter()
            .filter(|l| l.status() == status)
            .cloned()
            .collect();
        queue.sort_by_key(Listing::created_at);
        Ok(queue)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: ListingStatus,
    ) -> Result<Option<Listing>, ListingPersistenceError> {
        let mut listings = self.lock();
        let Some(position) = listings.iter().position(|l| l.id() == id) else {
            return Ok(None);
        };
        let updated = with_status(&listings[position], status);
        listings[position] = updated.clone();
        Ok(Some(updated))
    }
}
