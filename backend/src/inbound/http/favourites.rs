//! Favourite handlers: toggling and listing the bearer's saved listings.
//!
//! ```text
//! PUT /api/v1/listings/{id}/favourite
//! GET /api/v1/users/me/favourites
//! ```

use actix_web::{get, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::ports::{
    FavouritePersistenceError, FavouriteRepository, ListingPersistenceError, ListingRepository,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::listings::ListingSummary;
use crate::inbound::http::state::HttpState;

/// Toggle response: the new saved state.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FavouriteState {
    /// Listing id the toggle applied to.
    pub listing_id: Uuid,
    /// `true` when the listing is now saved.
    pub favourited: bool,
}

fn map_persistence(err: FavouritePersistenceError) -> Error {
    match err {
        FavouritePersistenceError::Connection { message } => Error::service_unavailable(message),
        FavouritePersistenceError::Query { message } => Error::internal(message),
    }
}

fn map_listing_persistence(err: ListingPersistenceError) -> Error {
    match err {
        ListingPersistenceError::Connection { message } => Error::service_unavailable(message),
        ListingPersistenceError::Query { message } => Error::internal(message),
    }
}

/// Toggle the saved state of a listing.
#[utoipa::path(
    put,
    path = "/api/v1/listings/{id}/favourite",
    params(("id" = Uuid, Path, description = "Listing id")),
    responses(
        (status = 200, description = "New saved state", body = FavouriteState),
        (status = 401, description = "Unauthorised", body = crate::inbound::http::error::ApiError),
        (status = 404, description = "Not found or not visible", body = crate::inbound::http::error::ApiError)
    ),
    tags = ["favourites"],
    operation_id = "toggleFavourite"
)]
#[put("/listings/{id}/favourite")]
pub async fn toggle_favourite(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
) -> ApiResult<web::Json<FavouriteState>> {
    let listing = state
        .listings
        .find_by_id(*id)
        .await
        .map_err(map_listing_persistence)?
        .ok_or_else(|| Error::not_found("no such listing"))?;
    if !listing.is_visible_to(Some(user.as_viewer())) {
        return Err(Error::not_found("no such listing").into());
    }

    let favourited = state
        .favourites
        .toggle(user.id, listing.id())
        .await
        .map_err(map_persistence)?;
    Ok(web::Json(FavouriteState {
        listing_id: listing.id(),
        favourited,
    }))
}

/// The bearer's saved listings, most recently saved first.
#[utoipa::path(
    get,
    path = "/api/v1/users/me/favourites",
    responses(
        (status = 200, description = "Saved listings", body = [ListingSummary]),
        (status = 401, description = "Unauthorised", body = crate::inbound::http::error::ApiError)
    ),
    tags = ["favourites"],
    operation_id = "myFavourites"
)]
#[get("/users/me/favourites")]
pub async fn my_favourites(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<Vec<ListingSummary>>> {
    let saved = state
        .favourites
        .list_for_user(user.id)
        .await
        .map_err(map_persistence)?;

    let mut summaries = Vec::with_capacity(saved.len());
    for listing_id in saved {
        // Listings deleted or pulled from review since being saved simply
        // drop out of the view.
        let Some(listing) = state
            .listings
            .find_by_id(listing_id)
            .await
            .map_err(map_listing_persistence)?
        else {
            continue;
        };
        if listing.is_visible_to(Some(user.as_viewer())) {
            summaries.push(ListingSummary::project(&listing));
        }
    }
    Ok(web::Json(summaries))
}
