//! Appointment handlers: booking, role-scoped listing, administrator
//! status writes, and withdrawal.
//!
//! ```text
//! POST   /api/v1/appointments {"listingId":"...","scheduledAt":"...","note":"..."}
//! GET    /api/v1/appointments
//! PUT    /api/v1/appointments/{id}/status {"status":"confirmed"}
//! DELETE /api/v1/appointments/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::appointment::{
    Appointment, AppointmentDraft, AppointmentStatus, AppointmentValidationError,
};
use crate::domain::ports::{
    AppointmentPersistenceError, AppointmentRepository, ListingPersistenceError,
    ListingRepository,
};
use crate::domain::{Error, Role};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::state::HttpState;

/// Booking request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentRequest {
    /// Listing the meeting concerns.
    pub listing_id: Uuid,
    /// Requested meeting instant (RFC 3339).
    #[schema(value_type = String)]
    pub scheduled_at: DateTime<Utc>,
    /// Optional note to the seller.
    #[serde(default)]
    pub note: Option<String>,
}

/// Administrator status write.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetStatusRequest {
    /// New status: `pending`, `confirmed`, or `cancelled`.
    pub status: String,
}

/// Outward appointment representation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentView {
    /// Appointment id.
    pub id: Uuid,
    /// Listing the meeting concerns.
    pub listing_id: Uuid,
    /// Booking buyer.
    pub buyer_id: Uuid,
    /// Requested meeting instant.
    #[schema(value_type = String)]
    pub scheduled_at: DateTime<Utc>,
    /// Optional note to the seller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Current status.
    pub status: AppointmentStatus,
}

impl AppointmentView {
    fn project(appointment: &Appointment) -> Self {
        Self {
            id: appointment.id(),
            listing_id: appointment.listing_id(),
            buyer_id: appointment.buyer_id(),
            scheduled_at: appointment.scheduled_at(),
            note: appointment.note().map(str::to_owned),
            status: appointment.status(),
        }
    }
}

fn map_validation(err: AppointmentValidationError) -> Error {
    let field = match &err {
        AppointmentValidationError::ScheduledTimeNotInFuture => "scheduledAt",
        AppointmentValidationError::NoteTooLong { .. } => "note",
        AppointmentValidationError::UnknownStatus { .. } => "status",
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field }))
}

fn map_persistence(err: AppointmentPersistenceError) -> Error {
    match err {
        AppointmentPersistenceError::Connection { message } => Error::service_unavailable(message),
        AppointmentPersistenceError::Query { message } => Error::internal(message),
    }
}

fn map_listing_persistence(err: ListingPersistenceError) -> Error {
    match err {
        ListingPersistenceError::Connection { message } => Error::service_unavailable(message),
        ListingPersistenceError::Query { message } => Error::internal(message),
    }
}

/// Book a meeting on a listing.
#[utoipa::path(
    post,
    path = "/api/v1/appointments",
    request_body = BookAppointmentRequest,
    responses(
        (status = 201, description = "Appointment booked", body = AppointmentView),
        (status = 400, description = "Validation failed", body = crate::inbound::http::error::ApiError),
        (status = 404, description = "Listing not found or not visible", body = crate::inbound::http::error::ApiError)
    ),
    tags = ["appointments"],
    operation_id = "bookAppointment"
)]
#[post("/appointments")]
pub async fn book_appointment(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<BookAppointmentRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let listing = state
        .listings
        .find_by_id(payload.listing_id)
        .await
        .map_err(map_listing_persistence)?
        .ok_or_else(|| Error::not_found("no such listing"))?;
    if !listing.is_visible_to(Some(user.as_viewer())) {
        return Err(Error::not_found("no such listing").into());
    }

    let now = Utc::now();
    Appointment::validate_booking(payload.scheduled_at, now).map_err(map_validation)?;
    let appointment = Appointment::new(AppointmentDraft {
        id: Uuid::new_v4(),
        listing_id: listing.id(),
        buyer_id: user.id,
        scheduled_at: payload.scheduled_at,
        note: payload.note,
        status: AppointmentStatus::Pending,
        created_at: now,
        updated_at: now,
    })
    .map_err(map_validation)?;
    state
        .appointments
        .create(&appointment)
        .await
        .map_err(map_persistence)?;
    Ok(HttpResponse::Created().json(AppointmentView::project(&appointment)))
}

/// Appointments visible to the bearer: buyers see their own bookings,
/// sellers see bookings against their listings, administrators see all.
#[utoipa::path(
    get,
    path = "/api/v1/appointments",
    responses(
        (status = 200, description = "Appointments", body = [AppointmentView]),
        (status = 401, description = "Unauthorised", body = crate::inbound::http::error::ApiError)
    ),
    tags = ["appointments"],
    operation_id = "listAppointments"
)]
#[get("/appointments")]
pub async fn list_appointments(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<Vec<AppointmentView>>> {
    let appointments = match user.role {
        Role::Buyer => state.appointments.list_for_buyer(user.id).await,
        Role::Seller => state.appointments.list_for_seller(user.id).await,
        Role::Admin => state.appointments.list_all().await,
    }
    .map_err(map_persistence)?;
    Ok(web::Json(
        appointments.iter().map(AppointmentView::project).collect(),
    ))
}

/// Set an appointment's status directly (administrator action).
#[utoipa::path(
    put,
    path = "/api/v1/appointments/{id}/status",
    params(("id" = Uuid, Path, description = "Appointment id")),
    request_body = SetStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = AppointmentView),
        (status = 403, description = "Administrator role required", body = crate::inbound::http::error::ApiError),
        (status = 404, description = "Not found", body = crate::inbound::http::error::ApiError)
    ),
    tags = ["appointments"],
    operation_id = "setAppointmentStatus"
)]
#[put("/appointments/{id}/status")]
pub async fn set_appointment_status(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
    payload: web::Json<SetStatusRequest>,
) -> ApiResult<web::Json<AppointmentView>> {
    user.require_admin()?;
    let status = AppointmentStatus::parse(&payload.status).map_err(map_validation)?;
    let updated = state
        .appointments
        .set_status(*id, status, Utc::now())
        .await
        .map_err(map_persistence)?
        .ok_or_else(|| Error::not_found("no such appointment"))?;
    Ok(web::Json(AppointmentView::project(&updated)))
}

/// Withdraw an appointment (booking buyer or administrator).
#[utoipa::path(
    delete,
    path = "/api/v1/appointments/{id}",
    params(("id" = Uuid, Path, description = "Appointment id")),
    responses(
        (status = 204, description = "Appointment withdrawn"),
        (status = 403, description = "Not the booking buyer", body = crate::inbound::http::error::ApiError),
        (status = 404, description = "Not found", body = crate::inbound::http::error::ApiError)
    ),
    tags = ["appointments"],
    operation_id = "withdrawAppointment"
)]
#[delete("/appointments/{id}")]
pub async fn withdraw_appointment(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let appointment = state
        .appointments
        .find_by_id(*id)
        .await
        .map_err(map_persistence)?
        .ok_or_else(|| Error::not_found("no such appointment"))?;
    if appointment.buyer_id() != user.id && user.role != Role::Admin {
        return Err(Error::forbidden("only the booking buyer may withdraw").into());
    }
    state
        .appointments
        .delete(appointment.id())
        .await
        .map_err(map_persistence)?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    //! Endpoint coverage over fixture state.

    use actix_web::{App, test as actix_test, web};
    use chrono::Duration;
    use rstest::rstest;
    use serde_json::{Value, json};

    use super::*;
    use crate::domain::listing::ListingStatus;
    use crate::inbound::http::test_utils::{
        bearer, seeded_listing, seeded_user, test_state, test_state_with_appointments,
    };

    fn test_app(
        state: HttpState,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
                actix_web::dev::ServiceRequest,
                Config = (),
                Response = actix_web::dev::ServiceResponse,
                Error = actix_web::Error,
                InitError = (),
            >,
    > {
        App::new().app_data(web::Data::new(state)).service(
            web::scope("/api/v1")
                .service(book_appointment)
                .service(list_appointments)
                .service(set_appointment_status)
                .service(withdraw_appointment),
        )
    }

    fn booking_body(listing_id: Uuid, hours_ahead: i64) -> Value {
        json!({
            "listingId": listing_id,
            "scheduledAt": Utc::now() + Duration::hours(hours_ahead),
            "note": "Keen to talk through the numbers.",
        })
    }

    #[rstest]
    #[actix_web::test]
    async fn booking_rejects_past_instants() {
        let state = test_state();
        let (_, buyer_token) = seeded_user(&state, Role::Buyer).await;
        let listing = seeded_listing(&state, Uuid::new_v4(), ListingStatus::Approved).await;
        let app = actix_test::init_service(test_app(state)).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/appointments")
                .insert_header(bearer(&buyer_token))
                .set_json(booking_body(listing.id(), -2))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), actix_web::http::StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["details"]["field"], "scheduledAt");
    }

    #[rstest]
    #[actix_web::test]
    async fn role_scoped_listing_shows_the_right_rows() {
        let (state, appointments) = test_state_with_appointments();
        let (seller, seller_token) = seeded_user(&state, Role::Seller).await;
        let (_buyer, buyer_token) = seeded_user(&state, Role::Buyer).await;
        let (_, admin_token) = seeded_user(&state, Role::Admin).await;
        let listing = seeded_listing(&state, seller.id(), ListingStatus::Approved).await;
        // The fixture appointment repository joins through seeded ownership.
        appointments.link_listing_owner(listing.id(), seller.id());
        let app = actix_test::init_service(test_app(state)).await;

        let booked = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/appointments")
                .insert_header(bearer(&buyer_token))
                .set_json(booking_body(listing.id(), 48))
                .to_request(),
        )
        .await;
        assert_eq!(booked.status(), actix_web::http::StatusCode::CREATED);

        for token in [&buyer_token, &seller_token, &admin_token] {
            let res = actix_test::call_service(
                &app,
                actix_test::TestRequest::get()
                    .uri("/api/v1/appointments")
                    .insert_header(bearer(token))
                    .to_request(),
            )
            .await;
            assert!(res.status().is_success());
            let rows: Value = actix_test::read_body_json(res).await;
            assert_eq!(rows.as_array().expect("array").len(), 1);
        }
    }

    #[rstest]
    #[actix_web::test]
    async fn status_writes_are_admin_only() {
        let state = test_state();
        let (_, buyer_token) = seeded_user(&state, Role::Buyer).await;
        let (_, admin_token) = seeded_user(&state, Role::Admin).await;
        let listing = seeded_listing(&state, Uuid::new_v4(), ListingStatus::Approved).await;
        let app = actix_test::init_service(test_app(state)).await;

        let booked = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/appointments")
                .insert_header(bearer(&buyer_token))
                .set_json(booking_body(listing.id(), 24))
                .to_request(),
        )
        .await;
        let view: Value = actix_test::read_body_json(booked).await;
        let id = view["id"].as_str().expect("id").to_owned();

        let denied = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri(&format!("/api/v1/appointments/{id}/status"))
                .insert_header(bearer(&buyer_token))
                .set_json(json!({ "status": "confirmed" }))
                .to_request(),
        )
        .await;
        assert_eq!(denied.status(), actix_web::http::StatusCode::FORBIDDEN);

        let confirmed = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri(&format!("/api/v1/appointments/{id}/status"))
                .insert_header(bearer(&admin_token))
                .set_json(json!({ "status": "confirmed" }))
                .to_request(),
        )
        .await;
        assert!(confirmed.status().is_success());
        let body: Value = actix_test::read_body_json(confirmed).await;
        assert_eq!(body["status"], "confirmed");

        let unknown = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri(&format!("/api/v1/appointments/{id}/status"))
                .insert_header(bearer(&admin_token))
                .set_json(json!({ "status": "rescheduled" }))
                .to_request(),
        )
        .await;
        assert_eq!(unknown.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[actix_web::test]
    async fn withdrawal_is_limited_to_the_booking_buyer() {
        let state = test_state();
        let (_, buyer_token) = seeded_user(&state, Role::Buyer).await;
        let (_, other_token) = seeded_user(&state, Role::Buyer).await;
        let listing = seeded_listing(&state, Uuid::new_v4(), ListingStatus::Approved).await;
        let app = actix_test::init_service(test_app(state)).await;

        let booked = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/appointments")
                .insert_header(bearer(&buyer_token))
                .set_json(booking_body(listing.id(), 24))
                .to_request(),
        )
        .await;
        let view: Value = actix_test::read_body_json(booked).await;
        let id = view["id"].as_str().expect("id").to_owned();

        let denied = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri(&format!("/api/v1/appointments/{id}"))
                .insert_header(bearer(&other_token))
                .to_request(),
        )
        .await;
        assert_eq!(denied.status(), actix_web::http::StatusCode::FORBIDDEN);

        let withdrawn = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri(&format!("/api/v1/appointments/{id}"))
                .insert_header(bearer(&buyer_token))
                .to_request(),
        )
        .await;
        assert_eq!(withdrawn.status(), actix_web::http::StatusCode::NO_CONTENT);
    }
}
