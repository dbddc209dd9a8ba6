//! Listing Q&A: buyer questions and seller answers.

use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Validation errors raised by question constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionValidationError {
    /// The question or answer body is blank.
    EmptyBody,
    /// The body exceeds [`BODY_MAX`] characters.
    BodyTooLong {
        /// Maximum permitted length.
        max: usize,
    },
    /// An answer arrived for a question that already has one.
    AlreadyAnswered,
}

impl fmt::Display for QuestionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyBody => write!(f, "body must not be empty"),
            Self::BodyTooLong { max } => write!(f, "body must be at most {max} characters"),
            Self::AlreadyAnswered => write!(f, "question already has an answer"),
        }
    }
}

impl std::error::Error for QuestionValidationError {}

/// Maximum allowed length for a question or answer body.
pub const BODY_MAX: usize = 4000;

/// Trim and bound-check a question or answer body.
///
/// # Errors
///
/// Returns [`QuestionValidationError`] when the body is blank or too long.
pub fn validate_body(raw: impl Into<String>) -> Result<String, QuestionValidationError> {
    let body = raw.into().trim().to_owned();
    if body.is_empty() {
        return Err(QuestionValidationError::EmptyBody);
    }
    if body.chars().count() > BODY_MAX {
        return Err(QuestionValidationError::BodyTooLong { max: BODY_MAX });
    }
    Ok(body)
}

/// Input payload for [`Question::new`].
#[derive(Debug, Clone)]
pub struct QuestionDraft {
    /// Stable identifier.
    pub id: Uuid,
    /// Listing the question concerns.
    pub listing_id: Uuid,
    /// Asking account.
    pub author_id: Uuid,
    /// Question text.
    pub body: String,
    /// Seller's answer, if given.
    pub answer: Option<String>,
    /// Instant the answer was recorded.
    pub answered_at: Option<DateTime<Utc>>,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

/// A question asked on a listing, optionally carrying its answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    id: Uuid,
    listing_id: Uuid,
    author_id: Uuid,
    body: String,
    answer: Option<String>,
    answered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl Question {
    /// Validate and construct a question.
    ///
    /// # Errors
    ///
    /// Returns [`QuestionValidationError`] when the body (or a present
    /// answer) is blank or too long.
    pub fn new(draft: QuestionDraft) -> Result<Self, QuestionValidationError> {
        let body = validate_body(draft.body)?;
        let answer = draft.answer.map(validate_body).transpose()?;
        Ok(Self {
            id: draft.id,
            listing_id: draft.listing_id,
            author_id: draft.author_id,
            body,
            answer,
            answered_at: draft.answered_at,
            created_at: draft.created_at,
        })
    }

    /// Stable identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Listing the question concerns.
    #[must_use]
    pub fn listing_id(&self) -> Uuid {
        self.listing_id
    }

    /// Asking account.
    #[must_use]
    pub fn author_id(&self) -> Uuid {
        self.author_id
    }

    /// Question text.
    #[must_use]
    pub fn body(&self) -> &str {
        self.body.as_str()
    }

    /// Seller's answer, if given.
    #[must_use]
    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    /// Instant the answer was recorded.
    #[must_use]
    pub fn answered_at(&self) -> Option<DateTime<Utc>> {
        self.answered_at
    }

    /// Creation instant.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether the question has been answered.
    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.answer.is_some()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for question validation.

    use rstest::rstest;

    use super::*;

    fn draft(answer: Option<&str>) -> QuestionDraft {
        QuestionDraft {
            id: Uuid::new_v4(),
            listing_id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            body: "Is inventory included in the sale?".to_owned(),
            answer: answer.map(str::to_owned),
            answered_at: answer.map(|_| Utc::now()),
            created_at: Utc::now(),
        }
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_bodies_are_rejected(#[case] raw: &str) {
        assert_eq!(validate_body(raw), Err(QuestionValidationError::EmptyBody));
    }

    #[rstest]
    fn overlong_bodies_are_rejected() {
        assert_eq!(
            validate_body("q".repeat(BODY_MAX + 1)),
            Err(QuestionValidationError::BodyTooLong { max: BODY_MAX })
        );
    }

    #[rstest]
    fn answer_state_tracks_presence() {
        let unanswered = Question::new(draft(None)).expect("valid question");
        assert!(!unanswered.is_answered());

        let answered = Question::new(draft(Some("Yes, all of it."))).expect("valid question");
        assert!(answered.is_answered());
        assert_eq!(answered.answer(), Some("Yes, all of it."));
    }
}
