//! Credential handling: Argon2 password hashing and HS256 bearer tokens.
//!
//! Handlers never touch key material directly; they hold a [`TokenIssuer`]
//! and a [`PasswordPolicy`] and work with [`Claims`].

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user::{Role, User};

/// Failures raised by credential handling.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The password does not meet the policy.
    #[error("password must be at least {min} characters")]
    WeakPassword {
        /// Minimum permitted length.
        min: usize,
    },
    /// Hashing or hash parsing failed.
    #[error("password hashing failed: {message}")]
    Hashing {
        /// Underlying failure description.
        message: String,
    },
    /// Token signing failed.
    #[error("token issuance failed: {message}")]
    Issuance {
        /// Underlying failure description.
        message: String,
    },
    /// The presented token is missing, malformed, expired, or tampered.
    #[error("token rejected: {message}")]
    InvalidToken {
        /// Underlying failure description.
        message: String,
    },
}

/// Minimum password length accepted at registration.
pub const PASSWORD_MIN: usize = 8;

/// Password policy and Argon2 hashing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordPolicy;

impl PasswordPolicy {
    /// Hash a raw password after checking the policy.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::WeakPassword`] for short input and
    /// [`AuthError::Hashing`] when Argon2 fails.
    pub fn hash(self, raw: &str) -> Result<String, AuthError> {
        if raw.chars().count() < PASSWORD_MIN {
            return Err(AuthError::WeakPassword { min: PASSWORD_MIN });
        }
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(raw.as_bytes(), &salt)
            .map_err(|err| AuthError::Hashing {
                message: err.to_string(),
            })?;
        Ok(hash.to_string())
    }

    /// Verify a raw password against a stored PHC string.
    ///
    /// A mismatch is `Ok(false)`; only unreadable stored hashes error.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Hashing`] when the stored hash cannot be parsed.
    pub fn verify(self, raw: &str, stored: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(stored).map_err(|err| AuthError::Hashing {
            message: err.to_string(),
        })?;
        match Argon2::default().verify_password(raw.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(err) => Err(AuthError::Hashing {
                message: err.to_string(),
            }),
        }
    }
}

/// Bearer-token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the account id.
    pub sub: Uuid,
    /// Role frozen at issuance.
    pub role: Role,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// Issues and verifies HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenIssuer {
    /// Build an issuer over a shared secret with a token lifetime.
    #[must_use]
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry checks are exact; the default 60 s leeway would let
        // just-expired tokens through.
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Issue a token for `user` as of now.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Issuance`] when signing fails.
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        self.issue_at(user, Utc::now())
    }

    /// Issue a token with an explicit issued-at instant.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Issuance`] when signing fails.
    pub fn issue_at(&self, user: &User, issued_at: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user.id(),
            role: user.role(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|err| {
            AuthError::Issuance {
                message: err.to_string(),
            }
        })
    }

    /// Verify a presented token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] for expired, tampered, or
    /// malformed tokens.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| AuthError::InvalidToken {
                message: err.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for hashing and token round-trips.

    use rstest::rstest;

    use super::*;
    use crate::domain::user::{DisplayName, EmailAddress, UserDraft};

    fn user(role: Role) -> User {
        User::new(UserDraft {
            id: Uuid::new_v4(),
            email: EmailAddress::new("grace@example.com").expect("valid email"),
            display_name: DisplayName::new("Grace").expect("valid name"),
            role,
            password_hash: "$argon2id$stub".to_owned(),
            premium_until: None,
            created_at: Utc::now(),
        })
    }

    fn issuer(ttl: Duration) -> TokenIssuer {
        TokenIssuer::new(b"test-secret-at-least-32-bytes-long!", ttl)
    }

    #[rstest]
    fn password_hash_verifies_and_rejects() {
        let policy = PasswordPolicy;
        let hash = policy.hash("correct horse battery").expect("hash succeeds");
        assert!(policy.verify("correct horse battery", &hash).expect("verify runs"));
        assert!(!policy.verify("wrong password", &hash).expect("verify runs"));
    }

    #[rstest]
    fn short_passwords_fail_policy() {
        assert_eq!(
            PasswordPolicy.hash("short"),
            Err(AuthError::WeakPassword { min: PASSWORD_MIN })
        );
    }

    #[rstest]
    fn unreadable_stored_hash_is_an_error() {
        assert!(matches!(
            PasswordPolicy.verify("anything", "not-a-phc-string"),
            Err(AuthError::Hashing { .. })
        ));
    }

    #[rstest]
    #[case(Role::Buyer)]
    #[case(Role::Admin)]
    fn tokens_round_trip_claims(#[case] role: Role) {
        let issuer = issuer(Duration::hours(1));
        let account = user(role);
        let token = issuer.issue(&account).expect("token issues");
        let claims = issuer.verify(&token).expect("token verifies");
        assert_eq!(claims.sub, account.id());
        assert_eq!(claims.role, role);
    }

    #[rstest]
    fn expired_tokens_are_rejected() {
        let issuer = issuer(Duration::hours(1));
        let token = issuer
            .issue_at(&user(Role::Buyer), Utc::now() - Duration::hours(2))
            .expect("token issues");
        assert!(matches!(
            issuer.verify(&token),
            Err(AuthError::InvalidToken { .. })
        ));
    }

    #[rstest]
    fn tampered_tokens_are_rejected() {
        let issuer = issuer(Duration::hours(1));
        let mut token = issuer.issue(&user(Role::Buyer)).expect("token issues");
        // Flip a character inside the signature segment.
        let flipped = if token.ends_with('a') { 'b' } else { 'a' };
        token.pop();
        token.push(flipped);
        assert!(matches!(
            issuer.verify(&token),
            Err(AuthError::InvalidToken { .. })
        ));
    }

    #[rstest]
    fn foreign_secret_tokens_are_rejected() {
        let ours = issuer(Duration::hours(1));
        let theirs = TokenIssuer::new(b"a-completely-different-secret-key", Duration::hours(1));
        let token = theirs.issue(&user(Role::Seller)).expect("token issues");
        assert!(matches!(
            ours.verify(&token),
            Err(AuthError::InvalidToken { .. })
        ));
    }
}
