use serde::Deserialize;

use application::transfer::{CreateBikeDto, GetBikeDto, UpdateBikeDto};

use crate::controller::Intake;

#[derive(Debug, Deserialize)]
pub struct CreateBikeRequest {
    price_per_minute: f64,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateBikeRequest {
    is_available: Option<bool>,
    price_per_minute: Option<f64>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug)]
pub struct GetBikeRequest {
    id: i64,
}

impl GetBikeRequest {
    pub fn new(id: i64) -> Self {
        Self { id }
    }
}

pub struct BikeTransformer;

impl Intake<CreateBikeRequest> for BikeTransformer {
    type To = CreateBikeDto;
    fn emit(&self, input: CreateBikeRequest) -> Self::To {
        CreateBikeDto {
            price_per_minute: input.price_per_minute,
            latitude: input.latitude,
            longitude: input.longitude,
        }
    }
}

impl Intake<GetBikeRequest> for BikeTransformer {
    type To = GetBikeDto;
    fn emit(&self, input: GetBikeRequest) -> Self::To {
        GetBikeDto { id: input.id }
    }
}

impl Intake<(i64, UpdateBikeRequest)> for BikeTransformer {
    type To = UpdateBikeDto;
    fn emit(&self, (id, input): (i64, UpdateBikeRequest)) -> Self::To {
        UpdateBikeDto {
            id,
            is_available: input.is_available,
            price_per_minute: input.price_per_minute,
            latitude: input.latitude,
            longitude: input.longitude,
        }
    }
}
