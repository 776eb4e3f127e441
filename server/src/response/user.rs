use axum::response::{IntoResponse, Response};
use serde::Serialize;
use time::OffsetDateTime;

use application::transfer::{PageDto, UserDto};

use crate::controller::Exhaust;
use crate::response::PageResponse;

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    token: String,
}

impl IntoResponse for TokenResponse {
    fn into_response(self) -> Response {
        axum::Json(self).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    id: i64,
    email: String,
    first_name: String,
    last_name: String,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}

impl From<UserDto> for UserResponse {
    fn from(value: UserDto) -> Self {
        Self {
            id: value.id,
            email: value.email,
            first_name: value.first_name,
            last_name: value.last_name,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl IntoResponse for UserResponse {
    fn into_response(self) -> Response {
        axum::Json(self).into_response()
    }
}

pub struct UserPresenter;

impl Exhaust<String> for UserPresenter {
    type To = TokenResponse;
    fn emit(&self, input: String) -> Self::To {
        TokenResponse { token: input }
    }
}

impl Exhaust<UserDto> for UserPresenter {
    type To = UserResponse;
    fn emit(&self, input: UserDto) -> Self::To {
        UserResponse::from(input)
    }
}

impl Exhaust<PageDto<UserDto>> for UserPresenter {
    type To = PageResponse<UserResponse>;
    fn emit(&self, input: PageDto<UserDto>) -> Self::To {
        PageResponse::from(input)
    }
}
