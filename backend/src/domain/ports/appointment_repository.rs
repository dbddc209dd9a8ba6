//! Port for appointment persistence.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::appointment::{Appointment, AppointmentStatus};

use super::define_port_error;

define_port_error! {
    /// Errors raised by appointment repository adapters.
    pub enum AppointmentPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "appointment repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "appointment repository query failed: {message}",
    }
}

/// Port for reading and writing appointments.
///
/// Seller-side reads join through listing ownership, so the port takes the
/// seller's account id rather than a listing id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Persist a new appointment.
    async fn create(&self, appointment: &Appointment)
    -> Result<(), AppointmentPersistenceError>;

    /// Find an appointment by id.
    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<Appointment>, AppointmentPersistenceError>;

    /// Appointments booked by one buyer, soonest first.
    async fn list_for_buyer(
        &self,
        buyer_id: Uuid,
    ) -> Result<Vec<Appointment>, AppointmentPersistenceError>;

    /// Appointments against listings owned by one seller, soonest first.
    async fn list_for_seller(
        &self,
        seller_id: Uuid,
    ) -> Result<Vec<Appointment>, AppointmentPersistenceError>;

    /// Every appointment, soonest first (administrator view).
    async fn list_all(&self) -> Result<Vec<Appointment>, AppointmentPersistenceError>;

    /// Set the status directly; returns the updated appointment when it
    /// exists.
    async fn set_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Appointment>, AppointmentPersistenceError>;

    /// Delete an appointment; `false` when no row existed.
    async fn delete(&self, id: Uuid) -> Result<bool, AppointmentPersistenceError>;
}

/// In-memory implementation backing handler tests and local runs without a
/// database. Seller lookups consult the listing-owner pairs seeded through
/// [`FixtureAppointmentRepository::link_listing_owner`].
#[derive(Debug, Default)]
pub struct FixtureAppointmentRepository {
    appointments: Mutex<Vec<Appointment>>,
    listing_owners: Mutex<Vec<(Uuid, Uuid)>>,
}

impl FixtureAppointmentRepository {
    fn lock(&self) -> MutexGuard<'_, Vec<Appointment>> {
        self.appointments
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Record that `listing_id` belongs to `owner_id` so seller-side reads
    /// can join in memory.
    pub fn link_listing_owner(&self, listing_id: Uuid, owner_id: Uuid) {
        self.listing_owners
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((listing_id, owner_id));
    }

    fn listings_of(&self, seller_id: Uuid) -> Vec<Uuid> {
        self.listing_owners
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .filter(|(_, owner)| *owner == seller_id)
            .map(|(listing, _)| *listing)
            .collect()
    }
}

fn soonest_first(mut items: Vec<Appointment>) -> Vec<Appointment> {
    items.sort_by_key(Appointment::scheduled_at);
    items
}

fn with_status(
    appointment: &Appointment,
    status: AppointmentStatus,
    updated_at: DateTime<Utc>,
) -> Appointment {
    Appointment::new(crate::domain::appointment::AppointmentDraft {
        id: appointment.id(),
        listing_id: appointment.listing_id(),
        buyer_id: appointment.buyer_id(),
        scheduled_at: appointment.scheduled_at(),
        note: appointment.note().map(str::to_owned),
        status,
        created_at: appointment.created_at(),
        updated_at,
    })
    // The source appointment already satisfied validation.
    .unwrap_or_else(|err| panic!("status change cannot invalidate an appointment: {err}"))
}

#[async_trait]
impl AppointmentRepository for FixtureAppointmentRepository {
    async fn create(
        &self,
        appointment: &Appointment,
    ) -> Result<(), AppointmentPersistenceError> {
        self.lock().push(appointment.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<Appointment>, AppointmentPersistenceError> {
        Ok(self.lock().iter().find(|a| a.id() == id).cloned())
    }

    async fn list_for_buyer(
        &self,
        buyer_id: Uuid,
    ) -> Result<Vec<Appointment>, AppointmentPersistenceError> {
        let mine = self
            .lock()
            .iter()
            .filter(|a| a.buyer_id() == buyer_id)
            .cloned()
            .collect();
        Ok(soonest_first(mine))
    }

    async fn list_for_seller(
        &self,
        seller_id: Uuid,
    ) -> Result<Vec<Appointment>, AppointmentPersistenceError> {
        let listings = self.listings_of(seller_id);
        let theirs = self
            .lock()
            .iter()
            .filter(|a| listings.contains(&a.listing_id()))
            .cloned()
            .collect();
        Ok(soonest_first(theirs))
    }

    async fn list_all(&self) -> Result<Vec<Appointment>, AppointmentPersistenceError> {
        Ok(soonest_first(self.lock().clone()))
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Appointment>, AppointmentPersistenceError> {
        let mut appointments = self.lock();
        let Some(position) = appointments.iter().position(|a| a.id() == id) else {
            return Ok(None);
        };
        let updated = with_status(&appointments[position], status, updated_at);
        appointments[position] = updated.clone();
        Ok(Some(updated))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppointmentPersistenceError> {
        let mut appointments = self.lock();
        let before = appointments.len();
        appointments.retain(|a| a.id() != id);
        Ok(appointments.len() != before)
    }
}
