//! User accounts and the role model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Validation errors returned by the account constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    /// The email address is blank.
    EmptyEmail,
    /// The email address is not `local@domain` shaped.
    InvalidEmail,
    /// The display name is blank.
    EmptyDisplayName,
    /// The display name exceeds [`DISPLAY_NAME_MAX`] characters.
    DisplayNameTooLong {
        /// Maximum permitted length.
        max: usize,
    },
    /// The role string is not one of the known roles.
    UnknownRole {
        /// The rejected input.
        value: String,
    },
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::InvalidEmail => write!(f, "email must look like local@domain"),
            Self::EmptyDisplayName => write!(f, "display name must not be empty"),
            Self::DisplayNameTooLong { max } => {
                write!(f, "display name must be at most {max} characters")
            }
            Self::UnknownRole { value } => write!(f, "unknown role: {value}"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Account role controlling route authorisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Browses listings, books appointments, may hold premium membership.
    Buyer,
    /// Owns listings and answers questions on them.
    Seller,
    /// Moderates listings and appointment statuses.
    Admin,
}

impl Role {
    /// Stable string form persisted in the database.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Seller => "seller",
            Self::Admin => "admin",
        }
    }

    /// Parse the persisted string form.
    ///
    /// # Errors
    ///
    /// Returns [`UserValidationError::UnknownRole`] for any other input.
    pub fn parse(value: &str) -> Result<Self, UserValidationError> {
        match value {
            "buyer" => Ok(Self::Buyer),
            "seller" => Ok(Self::Seller),
            "admin" => Ok(Self::Admin),
            other => Err(UserValidationError::UnknownRole {
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and construct an address, lower-casing it for uniqueness.
    ///
    /// # Errors
    ///
    /// Returns [`UserValidationError`] when the input is blank or not
    /// `local@domain` shaped.
    pub fn new(raw: impl Into<String>) -> Result<Self, UserValidationError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(UserValidationError::InvalidEmail);
        };
        if local.is_empty()
            || domain.is_empty()
            || !domain.contains('.')
            || trimmed.chars().any(char::is_whitespace)
        {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(trimmed.to_lowercase()))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Maximum allowed length for a display name.
pub const DISPLAY_NAME_MAX: usize = 64;

/// Human readable display name shown on listings and questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and construct a display name from owned input.
    ///
    /// # Errors
    ///
    /// Returns [`UserValidationError`] when the name is blank or too long.
    pub fn new(raw: impl Into<String>) -> Result<Self, UserValidationError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyDisplayName);
        }
        if trimmed.chars().count() > DISPLAY_NAME_MAX {
            return Err(UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Input payload for [`User::new`].
#[derive(Debug, Clone)]
pub struct UserDraft {
    /// Stable identifier.
    pub id: Uuid,
    /// Login email, unique per account.
    pub email: EmailAddress,
    /// Name shown to other users.
    pub display_name: DisplayName,
    /// Authorisation role.
    pub role: Role,
    /// Argon2 PHC string; never serialised outward.
    pub password_hash: String,
    /// Premium membership expiry, if one was ever purchased.
    pub premium_until: Option<DateTime<Utc>>,
    /// Account creation instant.
    pub created_at: DateTime<Utc>,
}

/// Application user account.
///
/// The password hash stays inside the domain; outward representations are
/// built by the HTTP adapter and never include it.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: Uuid,
    email: EmailAddress,
    display_name: DisplayName,
    role: Role,
    password_hash: String,
    premium_until: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl User {
    /// Build a user from validated components.
    #[must_use]
    pub fn new(draft: UserDraft) -> Self {
        let UserDraft {
            id,
            email,
            display_name,
            role,
            password_hash,
            premium_until,
            created_at,
        } = draft;
        Self {
            id,
            email,
            display_name,
            role,
            password_hash,
            premium_until,
            created_at,
        }
    }

    /// Stable identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Login email.
    #[must_use]
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Name shown to other users.
    #[must_use]
    pub fn display_name(&self) -> &DisplayName {
        &self.display_name
    }

    /// Authorisation role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Stored Argon2 PHC string.
    #[must_use]
    pub fn password_hash(&self) -> &str {
        self.password_hash.as_str()
    }

    /// Premium membership expiry, if any.
    #[must_use]
    pub fn premium_until(&self) -> Option<DateTime<Utc>> {
        self.premium_until
    }

    /// Account creation instant.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether the account holds an unexpired premium membership at `now`.
    #[must_use]
    pub fn is_premium_at(&self, now: DateTime<Utc>) -> bool {
        self.premium_until.is_some_and(|until| until > now)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for account validation.

    use chrono::{Duration, Utc};
    use rstest::rstest;

    use super::*;

    fn draft(premium_until: Option<DateTime<Utc>>) -> UserDraft {
        UserDraft {
            id: Uuid::new_v4(),
            email: EmailAddress::new("ada@example.com").expect("valid email"),
            display_name: DisplayName::new("Ada").expect("valid name"),
            role: Role::Buyer,
            password_hash: "$argon2id$stub".to_owned(),
            premium_until,
            created_at: Utc::now(),
        }
    }

    #[rstest]
    #[case::missing_at("ada.example.com")]
    #[case::missing_local("@example.com")]
    #[case::missing_domain("ada@")]
    #[case::bare_domain("ada@example")]
    #[case::embedded_space("ada lovelace@example.com")]
    fn email_rejects_malformed_input(#[case] raw: &str) {
        assert_eq!(
            EmailAddress::new(raw),
            Err(UserValidationError::InvalidEmail)
        );
    }

    #[rstest]
    fn email_lower_cases_for_uniqueness() {
        let email = EmailAddress::new(" Ada@Example.COM ").expect("valid email");
        assert_eq!(email.as_ref(), "ada@example.com");
    }

    #[rstest]
    fn display_name_rejects_overlong_input() {
        let raw = "x".repeat(DISPLAY_NAME_MAX + 1);
        assert_eq!(
            DisplayName::new(raw),
            Err(UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX
            })
        );
    }

    #[rstest]
    #[case("buyer", Role::Buyer)]
    #[case("seller", Role::Seller)]
    #[case("admin", Role::Admin)]
    fn role_round_trips_persisted_form(#[case] raw: &str, #[case] role: Role) {
        assert_eq!(Role::parse(raw), Ok(role));
        assert_eq!(role.as_str(), raw);
    }

    #[rstest]
    fn role_rejects_unknown_values() {
        assert!(matches!(
            Role::parse("superuser"),
            Err(UserValidationError::UnknownRole { .. })
        ));
    }

    #[rstest]
    fn premium_state_respects_expiry() {
        let now = Utc::now();
        let expired = User::new(draft(Some(now - Duration::days(1))));
        let active = User::new(draft(Some(now + Duration::days(1))));
        let never = User::new(draft(None));

        assert!(!expired.is_premium_at(now));
        assert!(active.is_premium_at(now));
        assert!(!never.is_premium_at(now));
    }
}
