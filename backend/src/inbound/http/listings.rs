//! Listing handlers: public search, detail with premium gating, seller
//! CRUD, and the administrator review queue.
//!
//! ```text
//! GET    /api/v1/listings?query=coffee&minPrice=100000&cursor=...
//! GET    /api/v1/listings/{id}
//! POST   /api/v1/listings
//! PUT    /api/v1/listings/{id}
//! DELETE /api/v1/listings/{id}
//! GET    /api/v1/users/me/listings
//! GET    /api/v1/admin/listings?status=pending
//! POST   /api/v1/admin/listings/{id}/approve
//! POST   /api/v1/admin/listings/{id}/reject
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use pagination::{CursorError, Page, PageRequest};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::listing::{
    Listing, ListingDraft, ListingFilter, ListingStatus, ListingValidationError, Money,
    MoneyRange,
};
use crate::domain::ports::{
    ListingPersistenceError, ListingRepository, UserPersistenceError, UserRepository,
};
use crate::domain::{Error, Role};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::{AuthenticatedUser, MaybeAuthenticated};
use crate::inbound::http::state::HttpState;

/// Create/update request body. Monetary amounts travel as integer minor
/// units.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingRequest {
    /// Headline shown in search results.
    pub title: String,
    /// Business category.
    pub category: String,
    /// Long-form description.
    pub description: String,
    /// Asking price in minor units.
    pub asking_price_minor: i64,
    /// Average monthly revenue in minor units.
    pub monthly_revenue_minor: i64,
    /// Average monthly profit in minor units.
    pub monthly_profit_minor: i64,
}

/// Financial detail unlocked for owners, administrators, and premium
/// members.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingFinancials {
    /// Monthly revenue rendered for display.
    pub monthly_revenue: String,
    /// Monthly revenue in minor units.
    pub monthly_revenue_minor: i64,
    /// Monthly profit rendered for display.
    pub monthly_profit: String,
    /// Monthly profit in minor units.
    pub monthly_profit_minor: i64,
}

/// Search-card projection of a listing; no financial detail.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingSummary {
    /// Listing id.
    pub id: Uuid,
    /// Headline.
    pub title: String,
    /// Business category.
    pub category: String,
    /// Asking price rendered for display.
    pub asking_price: String,
    /// Asking price in minor units.
    pub asking_price_minor: i64,
    /// Review status.
    pub status: ListingStatus,
    /// Creation instant.
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
}

impl ListingSummary {
    pub(crate) fn project(listing: &Listing) -> Self {
        Self {
            id: listing.id(),
            title: listing.title().to_owned(),
            category: listing.category().to_owned(),
            asking_price: listing.asking_price().to_display_string(),
            asking_price_minor: listing.asking_price().minor_units(),
            status: listing.status(),
            created_at: listing.created_at(),
        }
    }
}

/// Full listing projection. `financials` is absent for viewers without
/// premium access.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingDetail {
    /// Search-card fields.
    #[serde(flatten)]
    pub summary: ListingSummary,
    /// Selling account.
    pub owner_id: Uuid,
    /// Long-form description.
    pub description: String,
    /// Financial detail, when the viewer may see it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub financials: Option<ListingFinancials>,
}

impl ListingDetail {
    fn project(listing: &Listing, include_financials: bool) -> Self {
        Self {
            summary: ListingSummary::project(listing),
            owner_id: listing.owner_id(),
            description: listing.description().to_owned(),
            financials: include_financials.then(|| ListingFinancials {
                monthly_revenue: listing.monthly_revenue().to_display_string(),
                monthly_revenue_minor: listing.monthly_revenue().minor_units(),
                monthly_profit: listing.monthly_profit().to_display_string(),
                monthly_profit_minor: listing.monthly_profit().minor_units(),
            }),
        }
    }
}

/// One page of search results.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingSearchPage {
    /// Listings on this page, newest first.
    pub items: Vec<ListingSummary>,
    /// Cursor for the following page; absent on the final page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    /// Total number of matches.
    pub total: u64,
}

impl From<Page<ListingSummary>> for ListingSearchPage {
    fn from(page: Page<ListingSummary>) -> Self {
        Self {
            items: page.items,
            next_cursor: page.next_cursor,
            total: page.total,
        }
    }
}

/// Optional search filters; every amount is in minor units.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Case-insensitive substring match on the title.
    pub query: Option<String>,
    /// Exact category match.
    pub category: Option<String>,
    /// Inclusive asking-price lower bound.
    pub min_price: Option<i64>,
    /// Inclusive asking-price upper bound.
    pub max_price: Option<i64>,
    /// Inclusive monthly-revenue lower bound.
    pub min_revenue: Option<i64>,
    /// Inclusive monthly-revenue upper bound.
    pub max_revenue: Option<i64>,
    /// Inclusive monthly-profit lower bound.
    pub min_profit: Option<i64>,
    /// Inclusive monthly-profit upper bound.
    pub max_profit: Option<i64>,
    /// Opaque cursor from a previous page.
    pub cursor: Option<String>,
    /// Page size; clamped server-side.
    pub limit: Option<u32>,
}

fn map_validation(err: ListingValidationError) -> Error {
    let field = match &err {
        ListingValidationError::EmptyTitle | ListingValidationError::TitleTooLong { .. } => {
            "title"
        }
        ListingValidationError::EmptyCategory => "category",
        ListingValidationError::EmptyDescription => "description",
        ListingValidationError::NegativeAmount => "amount",
        ListingValidationError::InvertedRange { field } => field,
        ListingValidationError::UnknownStatus { .. } => "status",
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field }))
}

fn map_persistence(err: ListingPersistenceError) -> Error {
    match err {
        ListingPersistenceError::Connection { message } => Error::service_unavailable(message),
        ListingPersistenceError::Query { message } => Error::internal(message),
    }
}

fn map_user_persistence(err: UserPersistenceError) -> Error {
    match err {
        UserPersistenceError::Connection { message } => Error::service_unavailable(message),
        UserPersistenceError::Query { message } => Error::internal(message),
        UserPersistenceError::DuplicateEmail => {
            Error::conflict("email address is already registered")
        }
    }
}

fn map_cursor(err: CursorError) -> Error {
    Error::invalid_request(err.to_string()).with_details(json!({ "field": "cursor" }))
}

fn money(minor: i64) -> Result<Money, Error> {
    Money::from_minor(minor).map_err(map_validation)
}

fn bound(minor: Option<i64>) -> Result<Option<Money>, Error> {
    minor.map(money).transpose()
}

impl SearchParams {
    fn into_filter(self) -> Result<(ListingFilter, PageRequest), Error> {
        let page =
            PageRequest::from_parts(self.cursor.as_deref(), self.limit).map_err(map_cursor)?;
        let filter = ListingFilter {
            query: self.query,
            category: self.category,
            asking_price: MoneyRange {
                min: bound(self.min_price)?,
                max: bound(self.max_price)?,
            },
            monthly_revenue: MoneyRange {
                min: bound(self.min_revenue)?,
                max: bound(self.max_revenue)?,
            },
            monthly_profit: MoneyRange {
                min: bound(self.min_profit)?,
                max: bound(self.max_profit)?,
            },
        }
        .validated()
        .map_err(map_validation)?;
        Ok((filter, page))
    }
}

/// Search approved listings.
#[utoipa::path(
    get,
    path = "/api/v1/listings",
    params(SearchParams),
    responses(
        (status = 200, description = "Search results", body = ListingSearchPage),
        (status = 400, description = "Invalid filter or cursor", body = crate::inbound::http::error::ApiError)
    ),
    tags = ["listings"],
    operation_id = "searchListings"
)]
#[get("/listings")]
pub async fn search_listings(
    state: web::Data<HttpState>,
    params: web::Query<SearchParams>,
) -> ApiResult<web::Json<ListingSearchPage>> {
    let (filter, page) = params.into_inner().into_filter()?;
    let result = state
        .listings
        .search_approved(&filter, page)
        .await
        .map_err(map_persistence)?;
    let summaries: Vec<ListingSummary> =
        result.items.iter().map(ListingSummary::project).collect();
    Ok(web::Json(
        Page::assemble(summaries, page, result.total).into(),
    ))
}

async fn viewer_has_premium(
    state: &HttpState,
    viewer: &AuthenticatedUser,
) -> Result<bool, Error> {
    let account = state
        .users
        .find_by_id(viewer.id)
        .await
        .map_err(map_user_persistence)?;
    Ok(account.is_some_and(|a| a.is_premium_at(Utc::now())))
}

/// Listing detail. Financials require ownership, the administrator role,
/// or premium membership.
#[utoipa::path(
    get,
    path = "/api/v1/listings/{id}",
    params(("id" = Uuid, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing detail", body = ListingDetail),
        (status = 404, description = "Not found or not visible", body = crate::inbound::http::error::ApiError)
    ),
    tags = ["listings"],
    operation_id = "getListing"
)]
#[get("/listings/{id}")]
pub async fn get_listing(
    state: web::Data<HttpState>,
    id: web::Path<Uuid>,
    viewer: MaybeAuthenticated,
) -> ApiResult<web::Json<ListingDetail>> {
    let listing = state
        .listings
        .find_by_id(*id)
        .await
        .map_err(map_persistence)?
        .ok_or_else(|| Error::not_found("no such listing"))?;

    let viewer_pair = viewer.0.map(|v| v.as_viewer());
    if !listing.is_visible_to(viewer_pair) {
        // Indistinguishable from a listing that never existed.
        return Err(Error::not_found("no such listing").into());
    }

    let include_financials = match viewer.0 {
        Some(v) if v.role == Role::Admin || v.id == listing.owner_id() => true,
        Some(v) => viewer_has_premium(&state, &v).await?,
        None => false,
    };
    Ok(web::Json(ListingDetail::project(
        &listing,
        include_financials,
    )))
}

fn build_listing(
    owner_id: Uuid,
    payload: ListingRequest,
    id: Uuid,
    created_at: DateTime<Utc>,
) -> Result<Listing, Error> {
    Listing::new(ListingDraft {
        id,
        owner_id,
        title: payload.title,
        category: payload.category,
        description: payload.description,
        asking_price: money(payload.asking_price_minor)?,
        monthly_revenue: money(payload.monthly_revenue_minor)?,
        monthly_profit: money(payload.monthly_profit_minor)?,
        status: ListingStatus::Pending,
        created_at,
        updated_at: Utc::now(),
    })
    .map_err(map_validation)
}

/// Create a listing; it enters the review queue as `pending`.
#[utoipa::path(
    post,
    path = "/api/v1/listings",
    request_body = ListingRequest,
    responses(
        (status = 201, description = "Listing created", body = ListingDetail),
        (status = 400, description = "Validation failed", body = crate::inbound::http::error::ApiError),
        (status = 403, description = "Seller role required", body = crate::inbound::http::error::ApiError)
    ),
    tags = ["listings"],
    operation_id = "createListing"
)]
#[post("/listings")]
pub async fn create_listing(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<ListingRequest>,
) -> ApiResult<HttpResponse> {
    user.require_seller()?;
    let now = Utc::now();
    let listing = build_listing(user.id, payload.into_inner(), Uuid::new_v4(), now)?;
    state
        .listings
        .create(&listing)
        .await
        .map_err(map_persistence)?;
    Ok(HttpResponse::Created().json(ListingDetail::project(&listing, true)))
}

/// Replace a listing's content; edits return it to `pending` review.
#[utoipa::path(
    put,
    path = "/api/v1/listings/{id}",
    params(("id" = Uuid, Path, description = "Listing id")),
    request_body = ListingRequest,
    responses(
        (status = 200, description = "Listing updated", body = ListingDetail),
        (status = 403, description = "Not the owner", body = crate::inbound::http::error::ApiError),
        (status = 404, description = "Not found", body = crate::inbound::http::error::ApiError)
    ),
    tags = ["listings"],
    operation_id = "updateListing"
)]
#[put("/listings/{id}")]
pub async fn update_listing(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
    payload: web::Json<ListingRequest>,
) -> ApiResult<web::Json<ListingDetail>> {
    let existing = state
        .listings
        .find_by_id(*id)
        .await
        .map_err(map_persistence)?
        .ok_or_else(|| Error::not_found("no such listing"))?;
    if existing.owner_id() != user.id && user.role != Role::Admin {
        return Err(Error::forbidden("only the owner may edit a listing").into());
    }

    let updated = build_listing(
        existing.owner_id(),
        payload.into_inner(),
        existing.id(),
        existing.created_at(),
    )?;
    state
        .listings
        .update(&updated)
        .await
        .map_err(map_persistence)?;
    Ok(web::Json(ListingDetail::project(&updated, true)))
}

/// Delete a listing.
#[utoipa::path(
    delete,
    path = "/api/v1/listings/{id}",
    params(("id" = Uuid, Path, description = "Listing id")),
    responses(
        (status = 204, description = "Listing deleted"),
        (status = 403, description = "Not the owner", body = crate::inbound::http::error::ApiError),
        (status = 404, description = "Not found", body = crate::inbound::http::error::ApiError)
    ),
    tags = ["listings"],
    operation_id = "deleteListing"
)]
#[delete("/listings/{id}")]
pub async fn delete_listing(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let existing = state
        .listings
        .find_by_id(*id)
        .await
        .map_err(map_persistence)?
        .ok_or_else(|| Error::not_found("no such listing"))?;
    if existing.owner_id() != user.id && user.role != Role::Admin {
        return Err(Error::forbidden("only the owner may delete a listing").into());
    }
    state
        .listings
        .delete(existing.id())
        .await
        .map_err(map_persistence)?;
    Ok(HttpResponse::NoContent().finish())
}

/// The bearer's own listings, any status.
#[utoipa::path(
    get,
    path = "/api/v1/users/me/listings",
    responses(
        (status = 200, description = "Own listings", body = [ListingDetail]),
        (status = 401, description = "Unauthorised", body = crate::inbound::http::error::ApiError)
    ),
    tags = ["listings"],
    operation_id = "myListings"
)]
#[get("/users/me/listings")]
pub async fn my_listings(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<Vec<ListingDetail>>> {
    let owned = state
        .listings
        .list_by_owner(user.id)
        .await
        .map_err(map_persistence)?;
    Ok(web::Json(
        owned
            .iter()
            .map(|l| ListingDetail::project(l, true))
            .collect(),
    ))
}

/// Review-queue query parameters.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReviewQueueParams {
    /// Review status to list; defaults to `pending`.
    pub status: Option<String>,
}

/// Administrator review queue, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/admin/listings",
    params(ReviewQueueParams),
    responses(
        (status = 200, description = "Review queue", body = [ListingDetail]),
        (status = 403, description = "Administrator role required", body = crate::inbound::http::error::ApiError)
    ),
    tags = ["admin"],
    operation_id = "reviewQueue"
)]
#[get("/admin/listings")]
pub async fn review_queue(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    params: web::Query<ReviewQueueParams>,
) -> ApiResult<web::Json<Vec<ListingDetail>>> {
    user.require_admin()?;
    let status = match params.into_inner().status {
        Some(raw) => ListingStatus::parse(&raw).map_err(map_validation)?,
        None => ListingStatus::Pending,
    };
    let queue = state
        .listings
        .list_by_status(status)
        .await
        .map_err(map_persistence)?;
    Ok(web::Json(
        queue
            .iter()
            .map(|l| ListingDetail::project(l, true))
            .collect(),
    ))
}

async fn moderate(
    state: &HttpState,
    user: AuthenticatedUser,
    id: Uuid,
    status: ListingStatus,
) -> ApiResult<web::Json<ListingDetail>> {
    user.require_admin()?;
    let updated = state
        .listings
        .set_status(id, status)
        .await
        .map_err(map_persistence)?
        .ok_or_else(|| Error::not_found("no such listing"))?;
    Ok(web::Json(ListingDetail::project(&updated, true)))
}

/// Approve a listing for public search.
#[utoipa::path(
    post,
    path = "/api/v1/admin/listings/{id}/approve",
    params(("id" = Uuid, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing approved", body = ListingDetail),
        (status = 403, description = "Administrator role required", body = crate::inbound::http::error::ApiError),
        (status = 404, description = "Not found", body = crate::inbound::http::error::ApiError)
    ),
    tags = ["admin"],
    operation_id = "approveListing"
)]
#[post("/admin/listings/{id}/approve")]
pub async fn approve_listing(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
) -> ApiResult<web::Json<ListingDetail>> {
    moderate(&state, user, *id, ListingStatus::Approved).await
}

/// Reject a listing.
#[utoipa::path(
    post,
    path = "/api/v1/admin/listings/{id}/reject",
    params(("id" = Uuid, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing rejected", body = ListingDetail),
        (status = 403, description = "Administrator role required", body = crate::inbound::http::error::ApiError),
        (status = 404, description = "Not found", body = crate::inbound::http::error::ApiError)
    ),
    tags = ["admin"],
    operation_id = "rejectListing"
)]
#[post("/admin/listings/{id}/reject")]
pub async fn reject_listing(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
) -> ApiResult<web::Json<ListingDetail>> {
    moderate(&state, user, *id, ListingStatus::Rejected).await
}

#[cfg(test)]
mod tests {
    //! Endpoint coverage over fixture state.

    use actix_web::{App, test as actix_test, web};
    use chrono::Duration;
    use rstest::rstest;
    use serde_json::{Value, json};

    use super::*;
    use crate::inbound::http::test_utils::{bearer, seeded_listing, seeded_user, test_state};

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
                .service(search_listings)
                .service(get_listing)
                .service(create_listing)
                .service(update_listing)
                .service(delete_listing)
                .service(my_listings)
                .service(review_queue)
                .service(approve_listing)
                .service(reject_listing),
        )
    }

    fn listing_body(title: &str) -> Value {
        json!({
            "title": title,
            "category": "saas",
            "description": "Recurring revenue, low churn.",
            "askingPriceMinor": 250_000_00_i64,
            "monthlyRevenueMinor": 12_000_00_i64,
            "monthlyProfitMinor": 5_000_00_i64,
        })
    }

    #[rstest]
    #[actix_web::test]
    async fn search_returns_only_approved_and_respects_filters() {
        let state = test_state();
        let owner = Uuid::new_v4();
        seeded_listing(&state, owner, ListingStatus::Approved).await;
        seeded_listing(&state, owner, ListingStatus::Pending).await;
        let app = actix_test::init_service(test_app(state)).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/listings")
                .to_request(),
        )
        .await;
        assert!(res.status().is_success());
        let page: Value = actix_test::read_body_json(res).await;
        assert_eq!(page["total"], 1);

        // A price floor above the fixture price excludes it.
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/listings?minPrice=99999999999")
                .to_request(),
        )
        .await;
        let page: Value = actix_test::read_body_json(res).await;
        assert_eq!(page["total"], 0);
    }

    #[rstest]
    #[actix_web::test]
    async fn search_rejects_inverted_ranges_and_bad_cursors() {
        let app = actix_test::init_service(test_app(test_state())).await;
        for uri in [
            "/api/v1/listings?minPrice=200&maxPrice=100",
            "/api/v1/listings?cursor=%21%21%21",
        ] {
            let res = actix_test::call_service(
                &app,
                actix_test::TestRequest::get().uri(uri).to_request(),
            )
            .await;
            assert_eq!(
                res.status(),
                actix_web::http::StatusCode::BAD_REQUEST,
                "{uri} should be rejected"
            );
        }
    }

    #[rstest]
    #[actix_web::test]
    async fn search_pages_with_cursors() {
        let state = test_state();
        let owner = Uuid::new_v4();
        for _ in 0..3 {
            seeded_listing(&state, owner, ListingStatus::Approved).await;
        }
        let app = actix_test::init_service(test_app(state)).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/listings?limit=2")
                .to_request(),
        )
        .await;
        let first: Value = actix_test::read_body_json(res).await;
        assert_eq!(first["items"].as_array().expect("items").len(), 2);
        let cursor = first["nextCursor"].as_str().expect("cursor present");

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/api/v1/listings?limit=2&cursor={cursor}"))
                .to_request(),
        )
        .await;
        let second: Value = actix_test::read_body_json(res).await;
        assert_eq!(second["items"].as_array().expect("items").len(), 1);
        assert!(second.get("nextCursor").is_none());
    }

    #[rstest]
    #[actix_web::test]
    async fn financials_are_gated_to_premium_owner_and_admin() {
        let state = test_state();
        let (owner, owner_token) = seeded_user(&state, Role::Seller).await;
        let (_, admin_token) = seeded_user(&state, Role::Admin).await;
        let (_, buyer_token) = seeded_user(&state, Role::Buyer).await;
        let (premium, premium_token) = seeded_user(&state, Role::Buyer).await;
        state
            .users
            .set_premium_until(premium.id(), Utc::now() + Duration::days(30))
            .await
            .expect("premium set");
        let listing = seeded_listing(&state, owner.id(), ListingStatus::Approved).await;
        let app = actix_test::init_service(test_app(state)).await;

        let cases: [(Option<&str>, bool); 5] = [
            (None, false),
            (Some(buyer_token.as_str()), false),
            (Some(owner_token.as_str()), true),
            (Some(admin_token.as_str()), true),
            (Some(premium_token.as_str()), true),
        ];
        for (token, expect_financials) in cases {
            let mut req = actix_test::TestRequest::get()
                .uri(&format!("/api/v1/listings/{}", listing.id()));
            if let Some(token) = token {
                req = req.insert_header(bearer(token));
            }
            let res = actix_test::call_service(&app, req.to_request()).await;
            assert!(res.status().is_success());
            let detail: Value = actix_test::read_body_json(res).await;
            assert_eq!(
                detail.get("financials").is_some(),
                expect_financials,
                "financials visibility mismatch"
            );
        }
    }

    #[rstest]
    #[actix_web::test]
    async fn pending_listings_read_as_missing_to_strangers() {
        let state = test_state();
        let (owner, owner_token) = seeded_user(&state, Role::Seller).await;
        let (_, stranger_token) = seeded_user(&state, Role::Buyer).await;
        let listing = seeded_listing(&state, owner.id(), ListingStatus::Pending).await;
        let app = actix_test::init_service(test_app(state)).await;

        let hidden = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/api/v1/listings/{}", listing.id()))
                .insert_header(bearer(&stranger_token))
                .to_request(),
        )
        .await;
        assert_eq!(hidden.status(), actix_web::http::StatusCode::NOT_FOUND);

        let visible = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/api/v1/listings/{}", listing.id()))
                .insert_header(bearer(&owner_token))
                .to_request(),
        )
        .await;
        assert!(visible.status().is_success());
    }

    #[rstest]
    #[actix_web::test]
    async fn creation_requires_seller_and_enters_review() {
        let state = test_state();
        let (_, seller_token) = seeded_user(&state, Role::Seller).await;
        let (_, buyer_token) = seeded_user(&state, Role::Buyer).await;
        let app = actix_test::init_service(test_app(state)).await;

        let denied = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/listings")
                .insert_header(bearer(&buyer_token))
                .set_json(listing_body("Buyer's shop"))
                .to_request(),
        )
        .await;
        assert_eq!(denied.status(), actix_web::http::StatusCode::FORBIDDEN);

        let created = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/listings")
                .insert_header(bearer(&seller_token))
                .set_json(listing_body("Seller's shop"))
                .to_request(),
        )
        .await;
        assert_eq!(created.status(), actix_web::http::StatusCode::CREATED);
        let detail: Value = actix_test::read_body_json(created).await;
        assert_eq!(detail["status"], "pending");
    }

    #[rstest]
    #[actix_web::test]
    async fn moderation_is_admin_only_and_flips_status() {
        let state = test_state();
        let (owner, _) = seeded_user(&state, Role::Seller).await;
        let (_, admin_token) = seeded_user(&state, Role::Admin).await;
        let (_, buyer_token) = seeded_user(&state, Role::Buyer).await;
        let listing = seeded_listing(&state, owner.id(), ListingStatus::Pending).await;
        let app = actix_test::init_service(test_app(state)).await;

        let denied = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/admin/listings/{}/approve", listing.id()))
                .insert_header(bearer(&buyer_token))
                .to_request(),
        )
        .await;
        assert_eq!(denied.status(), actix_web::http::StatusCode::FORBIDDEN);

        let approved = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/admin/listings/{}/approve", listing.id()))
                .insert_header(bearer(&admin_token))
                .to_request(),
        )
        .await;
        assert!(approved.status().is_success());
        let detail: Value = actix_test::read_body_json(approved).await;
        assert_eq!(detail["status"], "approved");
    }

    #[rstest]
    #[actix_web::test]
    async fn edits_reset_review_and_are_owner_only() {
        let state = test_state();
        let (owner, owner_token) = seeded_user(&state, Role::Seller).await;
        let (_, other_token) = seeded_user(&state, Role::Seller).await;
        let listing = seeded_listing(&state, owner.id(), ListingStatus::Approved).await;
        let app = actix_test::init_service(test_app(state)).await;

        let denied = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri(&format!("/api/v1/listings/{}", listing.id()))
                .insert_header(bearer(&other_token))
                .set_json(listing_body("Hijacked"))
                .to_request(),
        )
        .await;
        assert_eq!(denied.status(), actix_web::http::StatusCode::FORBIDDEN);

        let updated = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri(&format!("/api/v1/listings/{}", listing.id()))
                .insert_header(bearer(&owner_token))
                .set_json(listing_body("Renamed storefront"))
                .to_request(),
        )
        .await;
        assert!(updated.status().is_success());
        let detail: Value = actix_test::read_body_json(updated).await;
        assert_eq!(detail["title"], "Renamed storefront");
        assert_eq!(detail["status"], "pending", "edits re-enter review");
    }

    #[rstest]
    #[actix_web::test]
    async fn deletion_is_owner_or_admin() {
        let state = test_state();
        let (owner, owner_token) = seeded_user(&state, Role::Seller).await;
        let (_, stranger_token) = seeded_user(&state, Role::Buyer).await;
        let listing = seeded_listing(&state, owner.id(), ListingStatus::Approved).await;
        let app = actix_test::init_service(test_app(state)).await;

        let denied = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri(&format!("/api/v1/listings/{}", listing.id()))
                .insert_header(bearer(&stranger_token))
                .to_request(),
        )
        .await;
        assert_eq!(denied.status(), actix_web::http::StatusCode::FORBIDDEN);

        let deleted = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri(&format!("/api/v1/listings/{}", listing.id()))
                .insert_header(bearer(&owner_token))
                .to_request(),
        )
        .await;
        assert_eq!(deleted.status(), actix_web::http::StatusCode::NO_CONTENT);
    }
}
