use std::fmt::Display;

use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use error_stack::Report;
use kernel::KernelError;

use crate::error::ErrorStatus;

fn rejected(rejection: impl Display) -> ErrorStatus {
    ErrorStatus::from(Report::new(KernelError::Validation).attach_printable(rejection.to_string()))
}

/// Request body extractor (`Json`, `Form`) whose rejection is reported as a validation failure.
pub struct Body<E>(pub E);

#[async_trait]
impl<S, E> FromRequest<S> for Body<E>
where
    S: Send + Sync,
    E: FromRequest<S>,
    E::Rejection: Display,
{
    type Rejection = ErrorStatus;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        E::from_request(req, state).await.map(Body).map_err(rejected)
    }
}

/// Same as [`Body`] for extractors reading the path or query string.
pub struct Params<E>(pub E);

#[async_trait]
impl<S, E> FromRequestParts<S> for Params<E>
where
    S: Send + Sync,
    E: FromRequestParts<S>,
    E::Rejection: Display,
{
    type Rejection = ErrorStatus;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        E::from_request_parts(parts, state)
            .await
            .map(Params)
            .map_err(rejected)
    }
}
