//! Port for membership-order persistence.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::membership::{MembershipOrder, OrderStatus};

use super::define_port_error;

define_port_error! {
    /// Errors raised by membership repository adapters.
    pub enum MembershipPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "membership repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "membership repository query failed: {message}",
    }
}

/// Port for reading and writing membership orders.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Persist a new order.
    async fn create_order(
        &self,
        order: &MembershipOrder,
    ) -> Result<(), MembershipPersistenceError>;

    /// Find an order by its gateway reference.
    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<MembershipOrder>, MembershipPersistenceError>;

    /// Orders for one account, newest first.
    async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<MembershipOrder>, MembershipPersistenceError>;

    /// Set the settlement status; returns the updated order when it exists.
    async fn set_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<MembershipOrder>, MembershipPersistenceError>;
}

/// In-memory implementation backing handler tests and local runs without a
/// database.
#[derive(Debug, Default)]
pub struct FixtureMembershipRepository {
    orders: Mutex<Vec<MembershipOrder>>,
}

impl FixtureMembershipRepository {
    fn lock(&self) -> MutexGuard<'_, Vec<MembershipOrder>> {
        self.orders
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn with_status(
    order: &MembershipOrder,
    status: OrderStatus,
    updated_at: DateTime<Utc>,
) -> MembershipOrder {
    MembershipOrder::new(crate::domain::membership::MembershipOrderDraft {
        id: order.id(),
        user_id: order.user_id(),
        plan: order.plan().to_owned(),
        amount: order.amount(),
        currency: order.currency().to_owned(),
        reference: order.reference().to_owned(),
        status,
        created_at: order.created_at(),
        updated_at,
    })
    // The source order already satisfied validation.
    .unwrap_or_else(|err| panic!("status change cannot invalidate an order: {err}"))
}

#[async_trait]
impl MembershipRepository for FixtureMembershipRepository {
    async fn create_order(
        &self,
        order: &MembershipOrder,
    ) -> Result<(), MembershipPersistenceError> {
        self.lock().push(order.clone());
        Ok(())
    }

    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<MembershipOrder>, MembershipPersistenceError> {
        Ok(self
            .lock()
            .iter()
            .find(|o| o.reference() == reference)
            .cloned())
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<MembershipOrder>, MembershipPersistenceError> {
        let mut mine: Vec<MembershipOrder> = self
            .lock()
            .iter()
            .filter(|o| o.user_id() == user_id)
            .cloned()
            .collect();
        mine.sort_by_key(|o| std::cmp::Reverse(o.created_at()));
        Ok(mine)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<MembershipOrder>, MembershipPersistenceError> {
        let mut orders = self.lock();
        let Some(position) = orders.iter().position(|o| o.id() == id) else {
            return Ok(None);
        };
        let updated = with_status(&orders[position], status, updated_at);
        orders[position] = updated.clone();
        Ok(Some(updated))
    }
}
