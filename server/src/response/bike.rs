use axum::response::{IntoResponse, Response};
use serde::Serialize;
use time::OffsetDateTime;

use application::transfer::{BikeDto, PageDto};

use crate::controller::Exhaust;
use crate::response::PageResponse;

#[derive(Debug, Serialize)]
pub struct BikeResponse {
    id: i64,
    is_available: bool,
    price_per_minute: f64,
    latitude: f64,
    longitude: f64,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}

impl From<BikeDto> for BikeResponse {
    fn from(value: BikeDto) -> Self {
        Self {
            id: value.id,
            is_available: value.is_available,
            price_per_minute: value.price_per_minute,
            latitude: value.latitude,
            longitude: value.longitude,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl IntoResponse for BikeResponse {
    fn into_response(self) -> Response {
        axum::Json(self).into_response()
    }
}

pub struct BikePresenter;

impl Exhaust<BikeDto> for BikePresenter {
    type To = BikeResponse;
    fn emit(&self, input: BikeDto) -> Self::To {
        BikeResponse::from(input)
    }
}

impl Exhaust<PageDto<BikeDto>> for BikePresenter {
    type To = PageResponse<BikeResponse>;
    fn emit(&self, input: PageDto<BikeDto>) -> Self::To {
        PageResponse::from(input)
    }
}
