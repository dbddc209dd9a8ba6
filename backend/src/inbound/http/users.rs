//! Account handlers: registration, login, and the bearer's profile.
//!
//! ```text
//! POST /api/v1/auth/register {"email":"a@b.co","password":"...","displayName":"Ada","role":"buyer"}
//! POST /api/v1/auth/login    {"email":"a@b.co","password":"..."}
//! GET  /api/v1/users/me
//! ```

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::user::{DisplayName, EmailAddress, Role, User, UserDraft, UserValidationError};
use crate::domain::{AuthError, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::state::HttpState;

/// Registration request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Login email; must be unique.
    pub email: String,
    /// Raw password; hashed before storage.
    pub password: String,
    /// Name shown to other users.
    pub display_name: String,
    /// `buyer` or `seller`; administrator accounts are provisioned out of
    /// band.
    pub role: String,
}

/// Login request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Login email.
    pub email: String,
    /// Raw password.
    pub password: String,
}

/// Outward account representation; never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Account id.
    pub id: Uuid,
    /// Login email.
    pub email: String,
    /// Name shown to other users.
    pub display_name: String,
    /// Authorisation role.
    pub role: Role,
    /// Whether a premium membership is active right now.
    pub premium: bool,
    /// Premium expiry, when one was ever purchased.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub premium_until: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Project a domain user as of `now`.
    #[must_use]
    pub fn project(user: &User, now: DateTime<Utc>) -> Self {
        Self {
            id: user.id(),
            email: user.email().to_string(),
            display_name: user.display_name().to_string(),
            role: user.role(),
            premium: user.is_premium_at(now),
            premium_until: user.premium_until(),
        }
    }
}

/// Token plus profile returned by both auth endpoints.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Bearer token for subsequent requests.
    pub token: String,
    /// The authenticated account.
    pub user: UserProfile,
}

fn map_validation(err: UserValidationError) -> Error {
    let field = match &err {
        UserValidationError::EmptyEmail | UserValidationError::InvalidEmail => "email",
        UserValidationError::EmptyDisplayName | UserValidationError::DisplayNameTooLong { .. } => {
            "displayName"
        }
        UserValidationError::UnknownRole { .. } => "role",
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field }))
}

fn map_persistence(err: UserPersistenceError) -> Error {
    match err {
        UserPersistenceError::Connection { message } => Error::service_unavailable(message),
        UserPersistenceError::Query { message } => Error::internal(message),
        UserPersistenceError::DuplicateEmail => {
            Error::conflict("email address is already registered")
        }
    }
}

fn map_auth(err: AuthError) -> Error {
    match err {
        AuthError::WeakPassword { .. } => {
            Error::invalid_request(err.to_string()).with_details(json!({ "field": "password" }))
        }
        AuthError::InvalidToken { .. } => Error::unauthorized(err.to_string()),
        AuthError::Hashing { message } | AuthError::Issuance { message } => {
            Error::internal(message)
        }
    }
}

/// Register a buyer or seller account.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Validation failed", body = crate::inbound::http::error::ApiError),
        (status = 409, description = "Email already registered", body = crate::inbound::http::error::ApiError)
    ),
    tags = ["accounts"],
    operation_id = "register"
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let email = EmailAddress::new(payload.email).map_err(map_validation)?;
    let display_name = DisplayName::new(payload.display_name).map_err(map_validation)?;
    let role = Role::parse(&payload.role).map_err(map_validation)?;
    if role == Role::Admin {
        return Err(Error::forbidden("administrator accounts cannot self-register").into());
    }
    let password_hash = state.passwords.hash(&payload.password).map_err(map_auth)?;

    let user = User::new(UserDraft {
        id: Uuid::new_v4(),
        email,
        display_name,
        role,
        password_hash,
        premium_until: None,
        created_at: Utc::now(),
    });
    state.users.create(&user).await.map_err(map_persistence)?;

    let token = state.tokens.issue(&user).map_err(map_auth)?;
    Ok(HttpResponse::Created().json(AuthResponse {
        token,
        user: UserProfile::project(&user, Utc::now()),
    }))
}

/// Authenticate and issue a bearer token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = AuthResponse),
        (status = 400, description = "Validation failed", body = crate::inbound::http::error::ApiError),
        (status = 401, description = "Invalid credentials", body = crate::inbound::http::error::ApiError)
    ),
    tags = ["accounts"],
    operation_id = "login"
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let email = EmailAddress::new(payload.email).map_err(map_validation)?;
    // One message for unknown email and wrong password alike.
    let rejection = || Error::unauthorized("invalid credentials");

    let user = state
        .users
        .find_by_email(&email)
        .await
        .map_err(map_persistence)?
        .ok_or_else(rejection)?;
    let verified = state
        .passwords
        .verify(&payload.password, user.password_hash())
        .map_err(map_auth)?;
    if !verified {
        return Err(rejection().into());
    }

    let token = state.tokens.issue(&user).map_err(map_auth)?;
    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user: UserProfile::project(&user, Utc::now()),
    }))
}

/// Profile of the bearer.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Profile", body = UserProfile),
        (status = 401, description = "Unauthorised", body = crate::inbound::http::error::ApiError)
    ),
    tags = ["accounts"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<UserProfile>> {
    let account = state
        .users
        .find_by_id(user.id)
        .await
        .map_err(map_persistence)?
        .ok_or_else(|| Error::unauthorized("account no longer exists"))?;
    Ok(web::Json(UserProfile::project(&account, Utc::now())))
}

#[cfg(test)]
mod tests {
    //! Endpoint coverage over fixture state.

    use actix_web::{App, test as actix_test, web};
    use rstest::rstest;
    use serde_json::{Value, json};

    use super::*;
    use crate::inbound::http::test_utils::{bearer, test_state};

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
                .service(register)
                .service(login)
                .service(current_user),
        )
    }

    fn register_body(email: &str) -> Value {
        json!({
            "email": email,
            "password": "correct horse battery",
            "displayName": "Ada Lovelace",
            "role": "buyer",
        })
    }

    #[rstest]
    #[actix_web::test]
    async fn register_then_login_round_trips() {
        let app = actix_test::init_service(test_app(test_state())).await;

        let created = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/register")
                .set_json(register_body("ada@example.com"))
                .to_request(),
        )
        .await;
        assert_eq!(created.status(), actix_web::http::StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(created).await;
        assert_eq!(body["user"]["email"], "ada@example.com");
        assert_eq!(body["user"]["premium"], false);
        assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));

        let logged_in = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/login")
                .set_json(json!({
                    "email": "ada@example.com",
                    "password": "correct horse battery",
                }))
                .to_request(),
        )
        .await;
        assert!(logged_in.status().is_success());
        let body: Value = actix_test::read_body_json(logged_in).await;
        let token = body["token"].as_str().expect("token present").to_owned();

        let me = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/users/me")
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert!(me.status().is_success());
        let profile: Value = actix_test::read_body_json(me).await;
        assert_eq!(profile["displayName"], "Ada Lovelace");
        assert_eq!(profile["role"], "buyer");
    }

    #[rstest]
    #[actix_web::test]
    async fn duplicate_email_conflicts() {
        let app = actix_test::init_service(test_app(test_state())).await;
        for expected in [
            actix_web::http::StatusCode::CREATED,
            actix_web::http::StatusCode::CONFLICT,
        ] {
            let res = actix_test::call_service(
                &app,
                actix_test::TestRequest::post()
                    .uri("/api/v1/auth/register")
                    .set_json(register_body("twice@example.com"))
                    .to_request(),
            )
            .await;
            assert_eq!(res.status(), expected);
        }
    }

    #[rstest]
    #[case::bad_email(json!({
        "email": "not-an-email", "password": "long enough password",
        "displayName": "Ada", "role": "buyer",
    }), "email")]
    #[case::weak_password(json!({
        "email": "ok@example.com", "password": "short",
        "displayName": "Ada", "role": "buyer",
    }), "password")]
    #[case::unknown_role(json!({
        "email": "ok@example.com", "password": "long enough password",
        "displayName": "Ada", "role": "wizard",
    }), "role")]
    #[actix_web::test]
    async fn register_validation_failures_name_the_field(
        #[case] body: Value,
        #[case] field: &str,
    ) {
        let app = actix_test::init_service(test_app(test_state())).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/register")
                .set_json(body)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), actix_web::http::StatusCode::BAD_REQUEST);
        let value: Value = actix_test::read_body_json(res).await;
        assert_eq!(value["code"], "invalid_request");
        assert_eq!(value["details"]["field"], field);
    }

    #[rstest]
    #[actix_web::test]
    async fn admin_self_registration_is_forbidden() {
        let app = actix_test::init_service(test_app(test_state())).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/register")
                .set_json(json!({
                    "email": "root@example.com", "password": "long enough password",
                    "displayName": "Root", "role": "admin",
                }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), actix_web::http::StatusCode::FORBIDDEN);
    }

    #[rstest]
    #[actix_web::test]
    async fn wrong_password_and_unknown_email_read_the_same() {
        let app = actix_test::init_service(test_app(test_state())).await;
        actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/register")
                .set_json(register_body("known@example.com"))
                .to_request(),
        )
        .await;

        for email in ["known@example.com", "unknown@example.com"] {
            let res = actix_test::call_service(
                &app,
                actix_test::TestRequest::post()
                    .uri("/api/v1/auth/login")
                    .set_json(json!({ "email": email, "password": "wrong password" }))
                    .to_request(),
            )
            .await;
            assert_eq!(res.status(), actix_web::http::StatusCode::UNAUTHORIZED);
            let value: Value = actix_test::read_body_json(res).await;
            assert_eq!(value["message"], "invalid credentials");
        }
    }
}
