use kernel::prelude::entity::{DestructRental, Rental};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct RentalDto {
    pub id: i64,
    pub user_id: i64,
    pub bike_id: i64,
    pub start_time: OffsetDateTime,
    pub end_time: Option<OffsetDateTime>,
    pub start_latitude: f64,
    pub start_longitude: f64,
    pub end_latitude: Option<f64>,
    pub end_longitude: Option<f64>,
    pub duration_minutes: Option<i64>,
    pub cost: f64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<Rental> for RentalDto {
    fn from(value: Rental) -> Self {
        let DestructRental {
            id,
            user_id,
            bike_id,
            started_at,
            start_position,
            ended_at,
            end_position,
            duration,
            cost,
            created_at,
            updated_at,
        } = value.into_destruct();
        Self {
            id: id.into(),
            user_id: user_id.into(),
            bike_id: bike_id.into(),
            start_time: started_at.into(),
            end_time: ended_at.map(OffsetDateTime::from),
            start_latitude: (*start_position.latitude()).into(),
            start_longitude: (*start_position.longitude()).into(),
            end_latitude: end_position.map(|position| (*position.latitude()).into()),
            end_longitude: end_position.map(|position| (*position.longitude()).into()),
            duration_minutes: duration.map(i64::from),
            cost: cost.into(),
            created_at: created_at.into(),
            updated_at: updated_at.into(),
        }
    }
}

#[derive(Debug)]
pub struct StartRentalDto {
    pub user_id: i64,
    pub bike_id: i64,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StartedRentalDto {
    pub id: i64,
    pub start_time: OffsetDateTime,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug)]
pub struct EndRentalDto {
    pub user_id: i64,
    pub rental_id: i64,
    /// Reported drop-off point. A random point near the start is used when absent.
    pub position: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EndedRentalDto {
    pub rental_id: i64,
    pub bike_id: i64,
    pub end_time: OffsetDateTime,
    pub latitude: f64,
    pub longitude: f64,
    pub cost: f64,
    pub duration_minutes: i64,
    pub distance_km: f64,
}

#[derive(Debug)]
pub struct ForceEndRentalDto {
    pub rental_id: i64,
}

#[derive(Debug)]
pub struct GetRentalDto {
    pub id: i64,
}

#[derive(Debug)]
pub struct GetOngoingRentalDto {
    pub user_id: i64,
}

#[derive(Debug)]
pub struct GetRentalHistoryDto {
    pub user_id: i64,
    pub page_id: i64,
}

#[derive(Debug)]
pub struct UpdateRentalDto {
    pub id: i64,
    pub bike_id: Option<i64>,
    pub user_id: Option<i64>,
    pub start_latitude: Option<f64>,
    pub start_longitude: Option<f64>,
}
