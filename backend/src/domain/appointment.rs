//! Appointments: scheduled meetings between buyers and listing owners.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Validation errors raised by appointment constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppointmentValidationError {
    /// The requested meeting time is not in the future.
    ScheduledTimeNotInFuture,
    /// The optional note exceeds [`NOTE_MAX`] characters.
    NoteTooLong {
        /// Maximum permitted length.
        max: usize,
    },
    /// The status string is not one of the known statuses.
    UnknownStatus {
        /// The rejected input.
        value: String,
    },
}

impl fmt::Display for AppointmentValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScheduledTimeNotInFuture => {
                write!(f, "scheduled time must lie in the future")
            }
            Self::NoteTooLong { max } => write!(f, "note must be at most {max} characters"),
            Self::UnknownStatus { value } => write!(f, "unknown appointment status: {value}"),
        }
    }
}

impl std::error::Error for AppointmentValidationError {}

/// Maximum allowed length for a booking note.
pub const NOTE_MAX: usize = 2000;

/// Status of an appointment.
///
/// Administrators set this field directly; there are no transition rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    /// Booked, awaiting administrator confirmation.
    Pending,
    /// Confirmed by an administrator.
    Confirmed,
    /// Cancelled by an administrator.
    Cancelled,
}

impl AppointmentStatus {
    /// Stable string form persisted in the database.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse the persisted string form.
    ///
    /// # Errors
    ///
    /// Returns [`AppointmentValidationError::UnknownStatus`] for other input.
    pub fn parse(value: &str) -> Result<Self, AppointmentValidationError> {
        match value {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(AppointmentValidationError::UnknownStatus {
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input payload for [`Appointment::new`].
#[derive(Debug, Clone)]
pub struct AppointmentDraft {
    /// Stable identifier.
    pub id: Uuid,
    /// Listing the meeting concerns.
    pub listing_id: Uuid,
    /// Booking buyer.
    pub buyer_id: Uuid,
    /// Requested meeting instant.
    pub scheduled_at: DateTime<Utc>,
    /// Optional note from the buyer to the seller.
    pub note: Option<String>,
    /// Current status.
    pub status: AppointmentStatus,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last modification instant.
    pub updated_at: DateTime<Utc>,
}

/// A scheduled meeting request between a buyer and a listing's owner.
#[derive(Debug, Clone, PartialEq)]
pub struct Appointment {
    id: Uuid,
    listing_id: Uuid,
    buyer_id: Uuid,
    scheduled_at: DateTime<Utc>,
    note: Option<String>,
    status: AppointmentStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Construct an appointment from persisted or validated parts.
    ///
    /// Historic rows may carry past meeting times; the future-time rule is
    /// enforced at booking via [`Appointment::validate_booking`].
    ///
    /// # Errors
    ///
    /// Returns [`AppointmentValidationError::NoteTooLong`] when the note
    /// exceeds [`NOTE_MAX`] characters.
    pub fn new(draft: AppointmentDraft) -> Result<Self, AppointmentValidationError> {
        let note = draft
            .note
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty());
        if let Some(note) = &note
            && note.chars().count() > NOTE_MAX
        {
            return Err(AppointmentValidationError::NoteTooLong { max: NOTE_MAX });
        }
        Ok(Self {
            id: draft.id,
            listing_id: draft.listing_id,
            buyer_id: draft.buyer_id,
            scheduled_at: draft.scheduled_at,
            note,
            status: draft.status,
            created_at: draft.created_at,
            updated_at: draft.updated_at,
        })
    }

    /// Booking-time rule: the requested instant must lie strictly after
    /// `now`.
    ///
    /// # Errors
    ///
    /// Returns [`AppointmentValidationError::ScheduledTimeNotInFuture`]
    /// otherwise.
    pub fn validate_booking(
        scheduled_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), AppointmentValidationError> {
        if scheduled_at <= now {
            return Err(AppointmentValidationError::ScheduledTimeNotInFuture);
        }
        Ok(())
    }

    /// Stable identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Listing the meeting concerns.
    #[must_use]
    pub fn listing_id(&self) -> Uuid {
        self.listing_id
    }

    /// Booking buyer.
    #[must_use]
    pub fn buyer_id(&self) -> Uuid {
        self.buyer_id
    }

    /// Requested meeting instant.
    #[must_use]
    pub fn scheduled_at(&self) -> DateTime<Utc> {
        self.scheduled_at
    }

    /// Optional note from the buyer.
    #[must_use]
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> AppointmentStatus {
        self.status
    }

    /// Creation instant.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last modification instant.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
