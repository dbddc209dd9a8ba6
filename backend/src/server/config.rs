//! Environment-driven application configuration.
//!
//! Everything is read from environment variables at startup. Absent
//! database or gateway settings fall back to in-memory fixtures so the
//! service can run locally without infrastructure; absent secrets are only
//! tolerated in debug builds (or under an explicit override) and are
//! loudly logged.

use std::net::SocketAddr;
use std::time::Duration as StdDuration;

use chrono::Duration;
use reqwest::Url;
use tracing::warn;
use zeroize::Zeroizing;

use crate::domain::listing::Money;

/// Configuration failures raised at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is absent.
    #[error("missing required environment variable {name}")]
    Missing {
        /// Variable name.
        name: &'static str,
    },
    /// A variable is present but unparseable.
    #[error("invalid value for {name}: {message}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Parse failure description.
        message: String,
    },
}

/// Outbound gateway settings; absent when running against the fixture
/// gateway.
#[derive(Debug, Clone)]
pub struct GatewayEndpoint {
    /// Token-exchange URL.
    pub endpoint: Url,
    /// Request timeout.
    pub timeout: StdDuration,
}

/// Complete application configuration.
pub struct AppConfig {
    /// Socket the HTTP server binds.
    pub bind_addr: SocketAddr,
    /// PostgreSQL URL; `None` selects in-memory fixture persistence.
    pub database_url: Option<String>,
    /// Maximum PostgreSQL connections held by the pool.
    pub db_pool_size: u32,
    /// HS256 signing secret for bearer tokens.
    pub jwt_secret: Zeroizing<Vec<u8>>,
    /// Bearer-token lifetime.
    pub jwt_ttl: Duration,
    /// Merchant identifier at the payment gateway.
    pub merchant_id: String,
    /// Shared HMAC secret for the gateway token exchange and
    /// notifications.
    pub gateway_secret: Zeroizing<Vec<u8>>,
    /// Real gateway endpoint; `None` selects the fixture gateway.
    pub gateway: Option<GatewayEndpoint>,
    /// Premium plan price.
    pub premium_price: Money,
    /// Premium plan currency.
    pub premium_currency: String,
}

const DEV_JWT_SECRET: &[u8] = b"insecure-dev-jwt-secret-do-not-deploy";
const DEV_GATEWAY_SECRET: &[u8] = b"insecure-dev-gateway-secret";

fn var(name: &'static str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn secret_or_dev_fallback(
    name: &'static str,
    fallback: &[u8],
) -> Result<Zeroizing<Vec<u8>>, ConfigError> {
    if let Some(value) = var(name) {
        return Ok(Zeroizing::new(value.into_bytes()));
    }
    let allow_dev = var("DEV_ALLOW_INSECURE_SECRETS").as_deref() == Some("1");
    if cfg!(debug_assertions) || allow_dev {
        warn!(variable = name, "using insecure development secret");
        return Ok(Zeroizing::new(fallback.to_vec()));
    }
    Err(ConfigError::Missing { name })
}

fn parsed<T, F>(name: &'static str, parse: F) -> Result<Option<T>, ConfigError>
where
    F: FnOnce(&str) -> Result<T, String>,
{
    match var(name) {
        Some(raw) => parse(raw.as_str())
            .map(Some)
            .map_err(|message| ConfigError::Invalid { name, message }),
        None => Ok(None),
    }
}

impl AppConfig {
    /// Assemble configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for unparseable values, and for missing
    /// secrets outside debug builds.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = parsed("BIND_ADDR", |raw| {
            raw.parse::<SocketAddr>().map_err(|err| err.to_string())
        })?
        .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8080)));

        let database_url = var("DATABASE_URL");
        if database_url.is_none() {
            warn!("DATABASE_URL not set; using in-memory fixture persistence");
        }
        let db_pool_size = parsed("DATABASE_POOL_SIZE", |raw| {
            raw.parse::<u32>().map_err(|err| err.to_string())
        })?
        .unwrap_or(10);

        let jwt_secret = secret_or_dev_fallback("JWT_SECRET", DEV_JWT_SECRET)?;
        let jwt_ttl_hours = parsed("JWT_TTL_HOURS", |raw| {
            raw.parse::<i64>().map_err(|err| err.to_string())
        })?
        .unwrap_or(24);

        let merchant_id = var("GATEWAY_MERCHANT_ID").unwrap_or_else(|| "marketstall-dev".to_owned());
        let gateway_secret = secret_or_dev_fallback("GATEWAY_SECRET", DEV_GATEWAY_SECRET)?;
        let gateway_timeout = parsed("GATEWAY_TIMEOUT_SECS", |raw| {
            raw.parse::<u64>().map_err(|err| err.to_string())
        })?
        .unwrap_or(30);
        let gateway = parsed("GATEWAY_URL", |raw| {
            Url::parse(raw).map_err(|err| err.to_string())
        })?
        .map(|endpoint| GatewayEndpoint {
            endpoint,
            timeout: StdDuration::from_secs(gateway_timeout),
        });
        if gateway.is_none() {
            warn!("GATEWAY_URL not set; using the fixture payment gateway");
        }

        let premium_price_minor = parsed("PREMIUM_PRICE_MINOR", |raw| {
            raw.parse::<i64>().map_err(|err| err.to_string())
        })?
        .unwrap_or(29_00);
        let premium_price =
            Money::from_minor(premium_price_minor).map_err(|err| ConfigError::Invalid {
                name: "PREMIUM_PRICE_MINOR",
                message: err.to_string(),
            })?;
        let premium_currency = var("PREMIUM_CURRENCY").unwrap_or_else(|| "USD".to_owned());

        Ok(Self {
            bind_addr,
            database_url,
            db_pool_size,
            jwt_secret,
            jwt_ttl: Duration::hours(jwt_ttl_hours),
            merchant_id,
            gateway_secret,
            gateway,
            premium_price,
            premium_currency,
        })
    }
}

#[cfg(test)]
mod tests {
    //! Coverage for parse helpers; full `from_env` reads live process
    //! state, so tests stick to the pure pieces.

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn invalid_error_names_the_variable() {
        let err = ConfigError::Invalid {
            name: "BIND_ADDR",
            message: "invalid socket address syntax".to_owned(),
        };
        assert!(err.to_string().contains("BIND_ADDR"));
    }

    #[rstest]
    fn missing_error_names_the_variable() {
        let err = ConfigError::Missing { name: "JWT_SECRET" };
        assert_eq!(
            err.to_string(),
            "missing required environment variable JWT_SECRET"
        );
    }
}
