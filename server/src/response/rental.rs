use axum::response::{IntoResponse, Response};
use serde::Serialize;
use time::OffsetDateTime;

use application::transfer::{EndedRentalDto, PageDto, RentalDto, StartedRentalDto};

use crate::controller::Exhaust;
use crate::response::PageResponse;

#[derive(Debug, Serialize)]
pub struct StartedRentalResponse {
    id: i64,
    #[serde(with = "time::serde::rfc3339")]
    start_time: OffsetDateTime,
    latitude: f64,
    longitude: f64,
}

impl IntoResponse for StartedRentalResponse {
    fn into_response(self) -> Response {
        axum::Json(self).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct EndedRentalResponse {
    bike_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    end_time: OffsetDateTime,
    latitude: f64,
    longitude: f64,
    cost: f64,
    duration: i64,
    /// Kilometers between pick-up and drop-off.
    distance: f64,
}

impl IntoResponse for EndedRentalResponse {
    fn into_response(self) -> Response {
        axum::Json(self).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct RentalResponse {
    id: i64,
    user_id: i64,
    bike_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    start_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    end_time: Option<OffsetDateTime>,
    start_latitude: f64,
    start_longitude: f64,
    end_latitude: Option<f64>,
    end_longitude: Option<f64>,
    duration_minutes: Option<i64>,
    cost: f64,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}

impl From<RentalDto> for RentalResponse {
    fn from(value: RentalDto) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            bike_id: value.bike_id,
            start_time: value.start_time,
            end_time: value.end_time,
            start_latitude: value.start_latitude,
            start_longitude: value.start_longitude,
            end_latitude: value.end_latitude,
            end_longitude: value.end_longitude,
            duration_minutes: value.duration_minutes,
            cost: value.cost,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl IntoResponse for RentalResponse {
    fn into_response(self) -> Response {
        axum::Json(self).into_response()
    }
}

pub struct RentalPresenter;

impl Exhaust<StartedRentalDto> for RentalPresenter {
    type To = StartedRentalResponse;
    fn emit(&self, input: StartedRentalDto) -> Self::To {
        StartedRentalResponse {
            id: input.id,
            start_time: input.start_time,
            latitude: input.latitude,
            longitude: input.longitude,
        }
    }
}

impl Exhaust<EndedRentalDto> for RentalPresenter {
    type To = EndedRentalResponse;
    fn emit(&self, input: EndedRentalDto) -> Self::To {
        EndedRentalResponse {
            bike_id: input.bike_id,
            end_time: input.end_time,
            latitude: input.latitude,
            longitude: input.longitude,
            cost: input.cost,
            duration: input.duration_minutes,
            distance: input.distance_km,
        }
    }
}

impl Exhaust<RentalDto> for RentalPresenter {
    type To = RentalResponse;
    fn emit(&self, input: RentalDto) -> Self::To {
        RentalResponse::from(input)
    }
}

impl Exhaust<PageDto<RentalDto>> for RentalPresenter {
    type To = PageResponse<RentalResponse>;
    fn emit(&self, input: PageDto<RentalDto>) -> Self::To {
        PageResponse::from(input)
    }
}

#[cfg(test)]
mod test {
    use application::transfer::EndedRentalDto;
    use time::OffsetDateTime;

    use crate::controller::Exhaust;
    use crate::response::RentalPresenter;

    #[test]
    fn ended_rental_reports_duration_and_distance() {
        let response = RentalPresenter.emit(EndedRentalDto {
            rental_id: 4,
            bike_id: 7,
            end_time: OffsetDateTime::from_unix_timestamp(1_709_287_800).unwrap(),
            latitude: 51.51,
            longitude: -0.15,
            cost: 0.7,
            duration_minutes: 10,
            distance_km: 1.3,
        });
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "bike_id": 7,
                "end_time": "2024-03-01T10:10:00Z",
                "latitude": 51.51,
                "longitude": -0.15,
                "cost": 0.7,
                "duration": 10,
                "distance": 1.3,
            })
        );
    }
}
