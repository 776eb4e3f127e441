use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use application::transfer::{BikeDto, RentalDto, UserDto};

use crate::controller::Exhaust;

mod bike;
mod page;
mod rental;
mod user;

pub use self::{bike::*, page::*, rental::*, user::*};

/// Acknowledges a write with the id of the affected row.
#[derive(Debug, Serialize)]
pub struct ChangeResponse {
    #[serde(skip)]
    status: StatusCode,
    id: i64,
    message: &'static str,
}

impl ChangeResponse {
    fn created(id: i64, message: &'static str) -> Self {
        Self {
            status: StatusCode::CREATED,
            id,
            message,
        }
    }

    fn updated(id: i64, message: &'static str) -> Self {
        Self {
            status: StatusCode::OK,
            id,
            message,
        }
    }
}

impl IntoResponse for ChangeResponse {
    fn into_response(self) -> Response {
        (self.status, axum::Json(self)).into_response()
    }
}

pub struct CreatedPresenter;

impl Exhaust<i64> for CreatedPresenter {
    type To = ChangeResponse;
    fn emit(&self, input: i64) -> Self::To {
        ChangeResponse::created(input, "User Created successfully")
    }
}

impl Exhaust<BikeDto> for CreatedPresenter {
    type To = ChangeResponse;
    fn emit(&self, input: BikeDto) -> Self::To {
        ChangeResponse::created(input.id, "Bike created successfully")
    }
}

pub struct UpdatedPresenter;

impl Exhaust<UserDto> for UpdatedPresenter {
    type To = ChangeResponse;
    fn emit(&self, input: UserDto) -> Self::To {
        ChangeResponse::updated(input.id, "User updated successfully")
    }
}

impl Exhaust<BikeDto> for UpdatedPresenter {
    type To = ChangeResponse;
    fn emit(&self, input: BikeDto) -> Self::To {
        ChangeResponse::updated(input.id, "Bike updated successfully")
    }
}

impl Exhaust<RentalDto> for UpdatedPresenter {
    type To = ChangeResponse;
    fn emit(&self, input: RentalDto) -> Self::To {
        ChangeResponse::updated(input.id, "Rental updated successfully")
    }
}
