use kernel::prelude::entity::{Bike, DestructBike, DestructPosition};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct BikeDto {
    pub id: i64,
    pub is_available: bool,
    pub price_per_minute: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<Bike> for BikeDto {
    fn from(value: Bike) -> Self {
        let DestructBike {
            id,
            availability,
            price,
            position,
            created_at,
            updated_at,
        } = value.into_destruct();
        let DestructPosition {
            latitude,
            longitude,
        } = position.into_destruct();
        Self {
            id: id.into(),
            is_available: availability.into(),
            price_per_minute: price.into(),
            latitude: latitude.into(),
            longitude: longitude.into(),
            created_at: created_at.into(),
            updated_at: updated_at.into(),
        }
    }
}

#[derive(Debug)]
pub struct GetBikeDto {
    pub id: i64,
}

#[derive(Debug)]
pub struct CreateBikeDto {
    pub price_per_minute: f64,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug)]
pub struct UpdateBikeDto {
    pub id: i64,
    pub is_available: Option<bool>,
    pub price_per_minute: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}
