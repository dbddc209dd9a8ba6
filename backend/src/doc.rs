//! OpenAPI document assembled from the handler annotations.

use utoipa::OpenApi;

use crate::domain::{AppointmentStatus, ErrorCode, ListingStatus, OrderStatus, Role};
use crate::inbound::http::appointments::{
    AppointmentView, BookAppointmentRequest, SetStatusRequest,
};
use crate::inbound::http::billing::{
    CheckoutResponse, MembershipView, NotificationRequest, NotificationResponse, OrderView,
};
use crate::inbound::http::error::ApiError;
use crate::inbound::http::favourites::FavouriteState;
use crate::inbound::http::listings::{
    ListingDetail, ListingFinancials, ListingRequest, ListingSearchPage, ListingSummary,
};
use crate::inbound::http::questions::{QuestionBody, QuestionView};
use crate::inbound::http::users::{AuthResponse, LoginRequest, RegisterRequest, UserProfile};

/// Public OpenAPI surface used by Swagger UI and tooling.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Marketstall API",
        description = "REST backend for the Marketstall business marketplace."
    ),
    paths(
        crate::inbound::http::users::register,
        crate::inbound::http::users::login,
        crate::inbound::http::users::current_user,
        crate::inbound::http::listings::search_listings,
        crate::inbound::http::listings::get_listing,
        crate::inbound::http::listings::create_listing,
        crate::inbound::http::listings::update_listing,
        crate::inbound::http::listings::delete_listing,
        crate::inbound::http::listings::my_listings,
        crate::inbound::http::listings::review_queue,
        crate::inbound::http::listings::approve_listing,
        crate::inbound::http::listings::reject_listing,
        crate::inbound::http::favourites::toggle_favourite,
        crate::inbound::http::favourites::my_favourites,
        crate::inbound::http::appointments::book_appointment,
        crate::inbound::http::appointments::list_appointments,
        crate::inbound::http::appointments::set_appointment_status,
        crate::inbound::http::appointments::withdraw_appointment,
        crate::inbound::http::questions::list_questions,
        crate::inbound::http::questions::ask_question,
        crate::inbound::http::questions::answer_question,
        crate::inbound::http::billing::start_checkout,
        crate::inbound::http::billing::gateway_notify,
        crate::inbound::http::billing::membership_state,
        crate::inbound::http::health::live,
        crate::inbound::http::health::ready,
    ),
    components(schemas(
        ApiError,
        ErrorCode,
        Role,
        ListingStatus,
        AppointmentStatus,
        OrderStatus,
        RegisterRequest,
        LoginRequest,
        AuthResponse,
        UserProfile,
        ListingRequest,
        ListingSummary,
        ListingDetail,
        ListingFinancials,
        ListingSearchPage,
        FavouriteState,
        BookAppointmentRequest,
        SetStatusRequest,
        AppointmentView,
        QuestionBody,
        QuestionView,
        CheckoutResponse,
        NotificationRequest,
        NotificationResponse,
        OrderView,
        MembershipView,
    )),
    tags(
        (name = "accounts", description = "Registration, login, and profiles"),
        (name = "listings", description = "Search, detail, and seller CRUD"),
        (name = "admin", description = "Administrator review actions"),
        (name = "favourites", description = "Saved listings"),
        (name = "appointments", description = "Buyer/seller meetings"),
        (name = "questions", description = "Listing Q&A"),
        (name = "billing", description = "Premium membership payments"),
        (name = "health", description = "Orchestration probes"),
    )
)]
pub struct ApiDoc;
