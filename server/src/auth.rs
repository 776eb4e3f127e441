use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, RequestPartsExt};
use axum_extra::headers::authorization::{Basic, Bearer};
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use error_stack::Report;

use application::service::AuthenticateUserService;
use kernel::KernelError;

use crate::error::{ErrorStatus, MessageResponse};
use crate::handler::AppModule;

/// Id of the user whose bearer token was presented.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub i64);

#[async_trait]
impl FromRequestParts<AppModule> for Authenticated {
    type Rejection = ErrorStatus;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppModule,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| {
                Report::new(KernelError::Unauthorized).attach_printable("Missing bearer token")
            })?;
        let id = state.authenticate(bearer.token()).await?;
        Ok(Self(id.into()))
    }
}

/// Basic-auth guard for the administration routes.
#[derive(Debug, Clone, Copy)]
pub struct Admin;

fn challenge() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(WWW_AUTHENTICATE, r#"Basic realm="admin""#)],
        Json(MessageResponse::new("Unauthorized")),
    )
        .into_response()
}

#[async_trait]
impl FromRequestParts<AppModule> for Admin {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppModule,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(basic)) = parts
            .extract::<TypedHeader<Authorization<Basic>>>()
            .await
            .map_err(|_| challenge())?;
        if !state.admin().matches(basic.username(), basic.password()) {
            tracing::warn!(username = basic.username(), "rejected admin credentials");
            return Err(challenge());
        }
        Ok(Admin)
    }
}
