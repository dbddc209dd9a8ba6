//! Bearer-token authentication for HTTP handlers.
//!
//! Keep the handler modules focused on request/response mapping by
//! concentrating token extraction and role checks here. Handlers take an
//! [`AuthenticatedUser`] (or [`MaybeAuthenticated`] where anonymous access
//! is allowed) as an extractor argument.

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::{Ready, ready};
use uuid::Uuid;

use crate::domain::{Error, Role};
use crate::inbound::http::error::ApiError;
use crate::inbound::http::state::HttpState;

/// Identity proven by the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Account id (token subject).
    pub id: Uuid,
    /// Role frozen at token issuance.
    pub role: Role,
}

impl AuthenticatedUser {
    /// Require the administrator role.
    ///
    /// # Errors
    ///
    /// Returns `forbidden` for any other role.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == Role::Admin {
            return Ok(());
        }
        Err(Error::forbidden("administrator role required").into())
    }

    /// Require the seller (or administrator) role.
    ///
    /// # Errors
    ///
    /// Returns `forbidden` for buyers.
    pub fn require_seller(&self) -> Result<(), ApiError> {
        if matches!(self.role, Role::Seller | Role::Admin) {
            return Ok(());
        }
        Err(Error::forbidden("seller role required").into())
    }

    /// The `(id, role)` pair used by visibility checks.
    #[must_use]
    pub fn as_viewer(&self) -> (Uuid, Role) {
        (self.id, self.role)
    }
}

/// Anonymous-friendly variant: `None` when no `Authorization` header was
/// sent. A header that is present but invalid still fails the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaybeAuthenticated(pub Option<AuthenticatedUser>);

fn bearer_token(req: &HttpRequest) -> Result<Option<&str>, ApiError> {
    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let text = value
        .to_str()
        .map_err(|_| ApiError::from(Error::unauthorized("authorization header is not ASCII")))?;
    let token = text
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::from(Error::unauthorized("expected a bearer token")))?;
    Ok(Some(token))
}

fn verify(req: &HttpRequest, token: &str) -> Result<AuthenticatedUser, ApiError> {
    let state = req
        .app_data::<web::Data<HttpState>>()
        .ok_or_else(|| ApiError::from(Error::internal("handler state is not configured")))?;
    let claims = state
        .tokens
        .verify(token)
        .map_err(|err| ApiError::from(Error::unauthorized(err.to_string())))?;
    Ok(AuthenticatedUser {
        id: claims.sub,
        role: claims.role,
    })
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let outcome = match bearer_token(req) {
            Ok(Some(token)) => verify(req, token),
            Ok(None) => Err(Error::unauthorized("authentication required").into()),
            Err(err) => Err(err),
        };
        ready(outcome)
    }
}

impl FromRequest for MaybeAuthenticated {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let outcome = match bearer_token(req) {
            Ok(Some(token)) => verify(req, token).map(|user| Self(Some(user))),
            Ok(None) => Ok(Self(None)),
            Err(err) => Err(err),
        };
        ready(outcome)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for bearer extraction.

    use actix_web::{App, HttpResponse, test as actix_test, web};
    use rstest::rstest;

    use super::*;
    use crate::inbound::http::error::ApiResult;
    use crate::inbound::http::test_utils::{seeded_user, test_state};

    async fn whoami(user: AuthenticatedUser) -> ApiResult<HttpResponse> {
        Ok(HttpResponse::Ok().body(user.id.to_string()))
    }

    async fn maybe(viewer: MaybeAuthenticated) -> ApiResult<HttpResponse> {
        Ok(HttpResponse::Ok().body(match viewer.0 {
            Some(user) => user.id.to_string(),
            None => "anonymous".to_owned(),
        }))
    }

    #[rstest]
    #[actix_web::test]
    async fn missing_header_is_unauthorized() {
        let state = test_state();
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .route("/whoami", web::get().to(whoami)),
        )
        .await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/whoami").to_request(),
        )
        .await;
        assert_eq!(res.status(), actix_web::http::StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[case("Basic dXNlcjpwYXNz")]
    #[case("Bearer not-a-jwt")]
    #[actix_web::test]
    async fn malformed_credentials_are_unauthorized(#[case] header_value: &str) {
        let state = test_state();
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .route("/whoami", web::get().to(whoami)),
        )
        .await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/whoami")
                .insert_header((actix_web::http::header::AUTHORIZATION, header_value))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), actix_web::http::StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[actix_web::test]
    async fn valid_tokens_resolve_the_subject() {
        let state = test_state();
        let (user, token) = seeded_user(&state, Role::Buyer).await;
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .route("/whoami", web::get().to(whoami)),
        )
        .await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/whoami")
                .insert_header((
                    actix_web::http::header::AUTHORIZATION,
                    format!("Bearer {token}"),
                ))
                .to_request(),
        )
        .await;
        assert!(res.status().is_success());
        let body = actix_test::read_body(res).await;
        assert_eq!(body.as_ref(), user.id().to_string().as_bytes());
    }

    #[rstest]
    #[actix_web::test]
    async fn optional_auth_allows_anonymous_but_rejects_bad_tokens() {
        let state = test_state();
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .route("/maybe", web::get().to(maybe)),
        )
        .await;

        let anonymous = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/maybe").to_request(),
        )
        .await;
        assert!(anonymous.status().is_success());
        assert_eq!(actix_test::read_body(anonymous).await.as_ref(), b"anonymous");

        let bad = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/maybe")
                .insert_header((actix_web::http::header::AUTHORIZATION, "Bearer junk"))
                .to_request(),
        )
        .await;
        assert_eq!(bad.status(), actix_web::http::StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    fn role_checks_gate_by_role() {
        let admin = AuthenticatedUser {
            id: Uuid::new_v4(),
            role: Role::Admin,
        };
        let buyer = AuthenticatedUser {
            id: Uuid::new_v4(),
            role: Role::Buyer,
        };
        assert!(admin.require_admin().is_ok());
        assert!(admin.require_seller().is_ok());
        assert!(buyer.require_admin().is_err());
        assert!(buyer.require_seller().is_err());
    }
}
