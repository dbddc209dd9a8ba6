//! Async connection pool for Diesel PostgreSQL connections.
//!
//! The repository adapters share one bb8 pool of diesel-async connections.
//! Connections speak tokio-postgres underneath, so no native libpq is
//! linked into the binary. Checkout waits are bounded; a saturated pool
//! surfaces as [`PoolError::Checkout`] rather than an unbounded stall.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};

/// How long a checkout may wait for a free connection.
const CHECKOUT_TIMEOUT: Duration = Duration::from_secs(30);

/// Failures raised by the connection pool.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// The pool could not be built against the database URL.
    #[error("failed to build connection pool: {message}")]
    Build {
        /// Underlying failure description.
        message: String,
    },
    /// No connection became available within the checkout timeout.
    #[error("failed to get connection from pool: {message}")]
    Checkout {
        /// Underlying failure description.
        message: String,
    },
}

impl PoolError {
    fn build(message: impl Into<String>) -> Self {
        Self::Build {
            message: message.into(),
        }
    }

    fn checkout(message: impl Into<String>) -> Self {
        Self::Checkout {
            message: message.into(),
        }
    }
}

/// Pool settings carried over from application configuration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    database_url: String,
    max_connections: u32,
}

impl PoolConfig {
    /// Settings for a pool over `database_url` holding at most
    /// `max_connections` connections.
    pub fn new(database_url: impl Into<String>, max_connections: u32) -> Self {
        Self {
            database_url: database_url.into(),
            // A zero-size pool can never serve a checkout.
            max_connections: max_connections.max(1),
        }
    }
}

/// Shared handle to the PostgreSQL connection pool.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
}

impl DbPool {
    /// Build the pool; the first connection is established eagerly so a bad
    /// URL fails at startup rather than on the first request.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Build`] when the database is unreachable or the
    /// URL is invalid.
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let manager =
            AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.database_url);
        let inner = Pool::builder()
            .max_size(config.max_connections)
            .connection_timeout(CHECKOUT_TIMEOUT)
            .build(manager)
            .await
            .map_err(|err| PoolError::build(err.to_string()))?;
        Ok(Self { inner })
    }

    /// Check a connection out of the pool.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Checkout`] when no connection becomes available
    /// within the checkout timeout.
    pub async fn get(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, PoolError> {
        self.inner
            .get()
            .await
            .map_err(|err| PoolError::checkout(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn zero_sized_pools_are_bumped_to_one() {
        let config = PoolConfig::new("postgres://localhost/marketstall", 0);
        assert_eq!(config.max_connections, 1);
    }

    #[rstest]
    fn configured_size_is_kept() {
        let config = PoolConfig::new("postgres://localhost/marketstall", 8);
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.database_url, "postgres://localhost/marketstall");
    }

    #[rstest]
    fn errors_carry_their_cause() {
        assert!(
            PoolError::checkout("connection refused")
                .to_string()
                .contains("connection refused")
        );
        assert!(PoolError::build("invalid URL").to_string().contains("invalid URL"));
    }
}
