//! Port for listing Q&A persistence.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::question::Question;

use super::define_port_error;

define_port_error! {
    /// Errors raised by question repository adapters.
    pub enum QuestionPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "question repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "question repository query failed: {message}",
    }
}

/// Port for reading and writing listing questions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Persist a new question.
    async fn create(&self, question: &Question) -> Result<(), QuestionPersistenceError>;

    /// Find a question by id.
    async fn find_by_id(&self, id: Uuid)
    -> Result<Option<Question>, QuestionPersistenceError>;

    /// Questions on one listing, oldest first (thread order).
    async fn list_for_listing(
        &self,
        listing_id: Uuid,
    ) -> Result<Vec<Question>, QuestionPersistenceError>;

    /// Record an answer; returns the updated question when it exists.
    async fn record_answer(
        &self,
        id: Uuid,
        answer: String,
        answered_at: DateTime<Utc>,
    ) -> Result<Option<Question>, QuestionPersistenceError>;
}

/// In-memory implementation backing handler tests and local runs without a
/// database.
#[derive(Debug, Default)]
pub struct FixtureQuestionRepository {
    questions: Mutex<Vec<Question>>,
}

impl FixtureQuestionRepository {
    fn lock(&self) -> MutexGuard<'_, Vec<Question>> {
        self.questions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn with_answer(question: &Question, answer: String, answered_at: DateTime<Utc>) -> Question {
    Question::new(crate::domain::question::QuestionDraft {
        id: question.id(),
        listing_id: question.listing_id(),
        author_id: question.author_id(),
        body: question.body().to_owned(),
        answer: Some(answer),
        answered_at: Some(answered_at),
        created_at: question.created_at(),
    })
    // The caller validated the answer body before reaching the port.
    .unwrap_or_else(|err| panic!("recording an answer cannot invalidate a question: {err}"))
}

#[async_trait]
impl QuestionRepository for FixtureQuestionRepository {
    async fn create(&self, question: &Question) -> Result<(), QuestionPersistenceError> {
        self.lock().push(question.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<Question>, QuestionPersistenceError> {
        Ok(self.lock().iter().find(|q| q.id() == id).cloned())
    }

    async fn list_for_listing(
        &self,
        listing_id: Uuid,
    ) -> Result<Vec<Question>, QuestionPersistenceError> {
        let mut thread: Vec<Question> = self
            .lock()
            .iter()
            .filter(|q| q.listing_id() == listing_id)
            .cloned()
            .collect();
        thread.sort_by_key(Question::created_at);
        Ok(thread)
    }

    async fn record_answer(
        &self,
        id: Uuid,
        answer: String,
        answered_at: DateTime<Utc>,
    ) -> Result<Option<Question>, QuestionPersistenceError> {
        let mut questions = self.lock();
        let Some(position) = questions.iter().position(|q| q.id() == id) else {
            return Ok(None);
        };
        let updated = with_answer(&questions[position], answer, answered_at);
        questions[position] = updated.clone();
        Ok(Some(updated))
    }
}
