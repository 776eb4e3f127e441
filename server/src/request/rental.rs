use error_stack::Report;
use serde::Deserialize;

use application::transfer::{
    EndRentalDto, ForceEndRentalDto, GetRentalDto, GetRentalHistoryDto, StartRentalDto,
    UpdateRentalDto,
};
use kernel::KernelError;

use crate::controller::{Intake, TryIntake};
use crate::request::PageRequest;

#[derive(Debug, Deserialize)]
pub struct StartRentalRequest {
    bike_id: i64,
    latitude: f64,
    longitude: f64,
}

/// Drop-off coordinates are optional but come as a pair.
#[derive(Debug, Deserialize)]
pub struct EndRentalRequest {
    rental_id: i64,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRentalRequest {
    bike_id: Option<i64>,
    user_id: Option<i64>,
    start_latitude: Option<f64>,
    start_longitude: Option<f64>,
}

#[derive(Debug)]
pub struct GetRentalRequest {
    id: i64,
}

impl GetRentalRequest {
    pub fn new(id: i64) -> Self {
        Self { id }
    }
}

#[derive(Debug)]
pub struct ForceEndRentalRequest {
    id: i64,
}

impl ForceEndRentalRequest {
    pub fn new(id: i64) -> Self {
        Self { id }
    }
}

pub struct RentalTransformer;

impl Intake<(i64, StartRentalRequest)> for RentalTransformer {
    type To = StartRentalDto;
    fn emit(&self, (user_id, input): (i64, StartRentalRequest)) -> Self::To {
        StartRentalDto {
            user_id,
            bike_id: input.bike_id,
            latitude: input.latitude,
            longitude: input.longitude,
        }
    }
}

impl TryIntake<(i64, EndRentalRequest)> for RentalTransformer {
    type To = EndRentalDto;
    type Error = Report<KernelError>;
    fn emit(&self, (user_id, input): (i64, EndRentalRequest)) -> Result<Self::To, Self::Error> {
        let position = match (input.latitude, input.longitude) {
            (Some(latitude), Some(longitude)) => Some((latitude, longitude)),
            (None, None) => None,
            _ => {
                return Err(Report::new(KernelError::Validation)
                    .attach_printable("latitude and longitude must be given together"))
            }
        };
        Ok(EndRentalDto {
            user_id,
            rental_id: input.rental_id,
            position,
        })
    }
}

impl TryIntake<(i64, PageRequest)> for RentalTransformer {
    type To = GetRentalHistoryDto;
    type Error = Report<KernelError>;
    fn emit(&self, (user_id, input): (i64, PageRequest)) -> Result<Self::To, Self::Error> {
        Ok(GetRentalHistoryDto {
            user_id,
            page_id: input.cursor()?,
        })
    }
}

impl Intake<GetRentalRequest> for RentalTransformer {
    type To = GetRentalDto;
    fn emit(&self, input: GetRentalRequest) -> Self::To {
        GetRentalDto { id: input.id }
    }
}

impl Intake<ForceEndRentalRequest> for RentalTransformer {
    type To = ForceEndRentalDto;
    fn emit(&self, input: ForceEndRentalRequest) -> Self::To {
        ForceEndRentalDto {
            rental_id: input.id,
        }
    }
}

impl Intake<(i64, UpdateRentalRequest)> for RentalTransformer {
    type To = UpdateRentalDto;
    fn emit(&self, (id, input): (i64, UpdateRentalRequest)) -> Self::To {
        UpdateRentalDto {
            id,
            bike_id: input.bike_id,
            user_id: input.user_id,
            start_latitude: input.start_latitude,
            start_longitude: input.start_longitude,
        }
    }
}
