//! Q&A handlers: the public thread on a listing, asking, and answering.
//!
//! ```text
//! GET  /api/v1/listings/{id}/questions
//! POST /api/v1/listings/{id}/questions {"body":"..."}
//! POST /api/v1/questions/{id}/answer   {"body":"..."}
//! ```

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::ports::{
    ListingPersistenceError, ListingRepository, QuestionPersistenceError, QuestionRepository,
};
use crate::domain::question::{
    Question, QuestionDraft, QuestionValidationError, validate_body,
};
use crate::domain::{Error, Role};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::{AuthenticatedUser, MaybeAuthenticated};
use crate::inbound::http::state::HttpState;

/// Ask/answer request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionBody {
    /// Question or answer text.
    pub body: String,
}

/// Outward question representation with its answer, if given.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    /// Question id.
    pub id: Uuid,
    /// Listing the question concerns.
    pub listing_id: Uuid,
    /// Asking account.
    pub author_id: Uuid,
    /// Question text.
    pub body: String,
    /// Seller's answer, if given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// Instant the answer was recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub answered_at: Option<DateTime<Utc>>,
    /// Creation instant.
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
}

impl QuestionView {
    fn project(question: &Question) -> Self {
        Self {
            id: question.id(),
            listing_id: question.listing_id(),
            author_id: question.author_id(),
            body: question.body().to_owned(),
            answer: question.answer().map(str::to_owned),
            answered_at: question.answered_at(),
            created_at: question.created_at(),
        }
    }
}

fn map_validation(err: QuestionValidationError) -> Error {
    Error::invalid_request(err.to_string()).with_details(json!({ "field": "body" }))
}

fn map_persistence(err: QuestionPersistenceError) -> Error {
    match err {
        QuestionPersistenceError::Connection { message } => Error::service_unavailable(message),
        QuestionPersistenceError::Query { message } => Error::internal(message),
    }
}

fn map_listing_persistence(err: ListingPersistenceError) -> Error {
    match err {
        ListingPersistenceError::Connection { message } => Error::service_unavailable(message),
        ListingPersistenceError::Query { message } => Error::internal(message),
    }
}

/// Public Q&A thread for a listing, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/listings/{id}/questions",
    params(("id" = Uuid, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Question thread", body = [QuestionView]),
        (status = 404, description = "Listing not found or not visible", body = crate::inbound::http::error::ApiError)
    ),
    tags = ["questions"],
    operation_id = "listQuestions"
)]
#[get("/listings/{id}/questions")]
pub async fn list_questions(
    state: web::Data<HttpState>,
    id: web::Path<Uuid>,
    viewer: MaybeAuthenticated,
) -> ApiResult<web::Json<Vec<QuestionView>>> {
    let listing = state
        .listings
        .find_by_id(*id)
        .await
        .map_err(map_listing_persistence)?
        .ok_or_else(|| Error::not_found("no such listing"))?;
    if !listing.is_visible_to(viewer.0.map(|v| v.as_viewer())) {
        return Err(Error::not_found("no such listing").into());
    }

    let thread = state
        .questions
        .list_for_listing(listing.id())
        .await
        .map_err(map_persistence)?;
    Ok(web::Json(thread.iter().map(QuestionView::project).collect()))
}

/// Ask a question on a listing.
#[utoipa::path(
    post,
    path = "/api/v1/listings/{id}/questions",
    params(("id" = Uuid, Path, description = "Listing id")),
    request_body = QuestionBody,
    responses(
        (status = 201, description = "Question asked", body = QuestionView),
        (status = 400, description = "Validation failed", body = crate::inbound::http::error::ApiError),
        (status = 404, description = "Listing not found or not visible", body = crate::inbound::http::error::ApiError)
    ),
    tags = ["questions"],
    operation_id = "askQuestion"
)]
#[post("/listings/{id}/questions")]
pub async fn ask_question(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
    payload: web::Json<QuestionBody>,
) -> ApiResult<HttpResponse> {
    let listing = state
        .listings
        .find_by_id(*id)
        .await
        .map_err(map_listing_persistence)?
        .ok_or_else(|| Error::not_found("no such listing"))?;
    if !listing.is_visible_to(Some(user.as_viewer())) {
        return Err(Error::not_found("no such listing").into());
    }

    let question = Question::new(QuestionDraft {
        id: Uuid::new_v4(),
        listing_id: listing.id(),
        author_id: user.id,
        body: payload.into_inner().body,
        answer: None,
        answered_at: None,
        created_at: Utc::now(),
    })
    .map_err(map_validation)?;
    state
        .questions
        .create(&question)
        .await
        .map_err(map_persistence)?;
    Ok(HttpResponse::Created().json(QuestionView::project(&question)))
}

/// Answer a question (listing owner or administrator).
#[utoipa::path(
    post,
    path = "/api/v1/questions/{id}/answer",
    params(("id" = Uuid, Path, description = "Question id")),
    request_body = QuestionBody,
    responses(
        (status = 200, description = "Answer recorded", body = QuestionView),
        (status = 403, description = "Not the listing owner", body = crate::inbound::http::error::ApiError),
        (status = 404, description = "Question not found", body = crate::inbound::http::error::ApiError),
        (status = 409, description = "Already answered", body = crate::inbound::http::error::ApiError)
    ),
    tags = ["questions"],
    operation_id = "answerQuestion"
)]
#[post("/questions/{id}/answer")]
pub async fn answer_question(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
    payload: web::Json<QuestionBody>,
) -> ApiResult<web::Json<QuestionView>> {
    let question = state
        .questions
        .find_by_id(*id)
        .await
        .map_err(map_persistence)?
        .ok_or_else(|| Error::not_found("no such question"))?;
    if question.is_answered() {
        return Err(Error::conflict("question already has an answer").into());
    }

    let listing = state
        .listings
        .find_by_id(question.listing_id())
        .await
        .map_err(map_listing_persistence)?
        .ok_or_else(|| Error::not_found("listing no longer exists"))?;
    if listing.owner_id() != user.id && user.role != Role::Admin {
        return Err(Error::forbidden("only the listing owner may answer").into());
    }

    let answer = validate_body(payload.into_inner().body).map_err(map_validation)?;
    let answered = state
        .questions
        .record_answer(question.id(), answer, Utc::now())
        .await
        .map_err(map_persistence)?
        .ok_or_else(|| Error::not_found("no such question"))?;
    Ok(web::Json(QuestionView::project(&answered)))
}
