mod availability;
mod id;
mod price;

pub use self::{availability::*, id::*, price::*};
use crate::entity::{CreatedAt, Position, UpdatedAt};
use destructure::Destructure;
use vodca::References;

#[derive(Debug, Clone, PartialEq, References, Destructure)]
pub struct Bike {
    id: BikeId,
    availability: BikeAvailability,
    price: PricePerMinute,
    position: Position,
    created_at: CreatedAt<Bike>,
    updated_at: UpdatedAt<Bike>,
}

impl Bike {
    pub fn new(
        id: BikeId,
        availability: BikeAvailability,
        price: PricePerMinute,
        position: Position,
        created_at: CreatedAt<Bike>,
        updated_at: UpdatedAt<Bike>,
    ) -> Self {
        Self {
            id,
            availability,
            price,
            position,
            created_at,
            updated_at,
        }
    }
}
