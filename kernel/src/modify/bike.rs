use destructure::Destructure;
use vodca::References;

use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{BikeAvailability, BikeId, Latitude, Longitude, Position, PricePerMinute};
use crate::KernelError;

#[derive(Debug, Clone, PartialEq, References, Destructure)]
pub struct NewBike {
    price: PricePerMinute,
    position: Position,
}

impl NewBike {
    pub fn new(price: PricePerMinute, position: Position) -> Self {
        Self { price, position }
    }
}

/// Columns of a bike row to overwrite; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, References, Destructure)]
pub struct BikePatch {
    availability: Option<BikeAvailability>,
    price: Option<PricePerMinute>,
    latitude: Option<Latitude>,
    longitude: Option<Longitude>,
}

impl BikePatch {
    pub fn new(
        availability: Option<BikeAvailability>,
        price: Option<PricePerMinute>,
        latitude: Option<Latitude>,
        longitude: Option<Longitude>,
    ) -> Self {
        Self {
            availability,
            price,
            latitude,
            longitude,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.availability.is_none()
            && self.price.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
    }
}

#[async_trait::async_trait]
pub trait BikeModifier: 'static + Sync + Send {
    type Transaction: Transaction;
    /// Inserts an available bike and returns its id.
    async fn create(
        &self,
        con: &mut Self::Transaction,
        bike: &NewBike,
    ) -> error_stack::Result<BikeId, KernelError>;
    async fn update(
        &self,
        con: &mut Self::Transaction,
        id: &BikeId,
        patch: &BikePatch,
    ) -> error_stack::Result<(), KernelError>;
    /// Unconditional write of the availability flag. Fails with `NotFound` for unknown bikes.
    async fn set_availability(
        &self,
        con: &mut Self::Transaction,
        id: &BikeId,
        availability: BikeAvailability,
    ) -> error_stack::Result<(), KernelError>;
    /// Writes `next` only if the stored flag still equals `expected`.
    /// Returns whether the row changed.
    async fn compare_and_set_availability(
        &self,
        con: &mut Self::Transaction,
        id: &BikeId,
        expected: BikeAvailability,
        next: BikeAvailability,
    ) -> error_stack::Result<bool, KernelError>;
}

pub trait DependOnBikeModifier: 'static + Sync + Send + DependOnDatabaseConnection {
    type BikeModifier: BikeModifier<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn bike_modifier(&self) -> &Self::BikeModifier;
}
