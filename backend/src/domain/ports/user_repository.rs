//! Port for user account persistence.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::user::{EmailAddress, User};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "user repository query failed: {message}",
        /// Another account already holds the email address.
        DuplicateEmail =>
            "email address is already registered",
    }
}

/// Port for reading and writing user accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new account.
    async fn create(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Find an account by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserPersistenceError>;

    /// Find an account by login email.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Overwrite the premium expiry for an account.
    async fn set_premium_until(
        &self,
        id: Uuid,
        premium_until: DateTime<Utc>,
    ) -> Result<(), UserPersistenceError>;
}

/// In-memory implementation backing handler tests and local runs without a
/// database.
#[derive(Debug, Default)]
pub struct FixtureUserRepository {
    users: Mutex<Vec<User>>,
}

impl FixtureUserRepository {
    fn lock(&self) -> MutexGuard<'_, Vec<User>> {
        self.users
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Seed the fixture with an existing account.
    pub fn insert(&self, user: User) {
        self.lock().push(user);
    }
}

#[async_trait]
impl UserRepository for FixtureUserRepository {
    async fn create(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut users = self.lock();
        if users.iter().any(|u| u.email() == user.email()) {
            return Err(UserPersistenceError::duplicate_email());
        }
        users.push(user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.lock().iter().find(|u| u.id() == id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.lock().iter().find(|u| u.email() == email).cloned())
    }

    async fn set_premium_until(
        &self,
        id: Uuid,
        premium_until: DateTime<Utc>,
    ) -> Result<(), UserPersistenceError> {
        let mut users = self.lock();
        let Some(position) = users.iter().position(|u| u.id() == id) else {
            return Err(UserPersistenceError::query("no such user"));
        };
        let current = users[position].clone();
        users[position] = rebuild_with_premium(current, premium_until);
        Ok(())
    }
}

fn rebuild_with_premium(user: User, premium_until: DateTime<Utc>) -> User {
    User::new(crate::domain::user::UserDraft {
        id: user.id(),
        email: user.email().clone(),
        display_name: user.display_name().clone(),
        role: user.role(),
        password_hash: user.password_hash().to_owned(),
        premium_until: Some(premium_until),
        created_at: user.created_at(),
    })
}

#[cfg(test)]
mod tests {
    //! Regression coverage for the in-memory fixture.

    use chrono::Duration;
    use rstest::rstest;

    use super::*;
    use crate::domain::user::{DisplayName, Role, UserDraft};

    fn user(email: &str) -> User {
        User::new(UserDraft {
            id: Uuid::new_v4(),
            email: EmailAddress::new(email).expect("valid email"),
            display_name: DisplayName::new("Someone").expect("valid name"),
            role: Role::Buyer,
            password_hash: "$argon2id$stub".to_owned(),
            premium_until: None,
            created_at: Utc::now(),
        })
    }

    #[rstest]
    #[tokio::test]
    async fn create_rejects_duplicate_emails() {
        let repo = FixtureUserRepository::default();
        repo.create(&user("dup@example.com")).await.expect("first insert");
        let err = repo
            .create(&user("dup@example.com"))
            .await
            .expect_err("second insert must fail");
        assert_eq!(err, UserPersistenceError::duplicate_email());
    }

    #[rstest]
    #[tokio::test]
    async fn premium_expiry_is_overwritten() {
        let repo = FixtureUserRepository::default();
        let account = user("p@example.com");
        repo.create(&account).await.expect("insert");
        let until = Utc::now() + Duration::days(30);
        repo.set_premium_until(account.id(), until)
            .await
            .expect("update succeeds");
        let stored = repo
            .find_by_id(account.id())
            .await
            .expect("lookup succeeds")
            .expect("account present");
        assert_eq!(stored.premium_until(), Some(until));
    }
}
