use destructure::Destructure;
use vodca::References;

use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{
    BikeId, Latitude, Longitude, Position, RentalId, Settlement, StartedAt, UserId,
};
use crate::KernelError;

#[derive(Debug, Clone, PartialEq, References, Destructure)]
pub struct NewRental {
    user_id: UserId,
    bike_id: BikeId,
    started_at: StartedAt,
    start_position: Position,
}

impl NewRental {
    pub fn new(
        user_id: UserId,
        bike_id: BikeId,
        started_at: StartedAt,
        start_position: Position,
    ) -> Self {
        Self {
            user_id,
            bike_id,
            started_at,
            start_position,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, References, Destructure)]
pub struct RentalPatch {
    bike_id: Option<BikeId>,
    user_id: Option<UserId>,
    start_latitude: Option<Latitude>,
    start_longitude: Option<Longitude>,
}

impl RentalPatch {
    pub fn new(
        bike_id: Option<BikeId>,
        user_id: Option<UserId>,
        start_latitude: Option<Latitude>,
        start_longitude: Option<Longitude>,
    ) -> Self {
        Self {
            bike_id,
            user_id,
            start_latitude,
            start_longitude,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bike_id.is_none()
            && self.user_id.is_none()
            && self.start_latitude.is_none()
            && self.start_longitude.is_none()
    }
}

#[async_trait::async_trait]
pub trait RentalModifier: 'static + Sync + Send {
    type Transaction: Transaction;
    /// Inserts an open rental with zero cost.
    ///
    /// Fails with `UserAlreadyRenting` or `BikeNotAvailable` when the storage already holds an
    /// open rental for the same user or bike.
    async fn open(
        &self,
        con: &mut Self::Transaction,
        rental: &NewRental,
    ) -> error_stack::Result<RentalId, KernelError>;
    /// Fills the end columns of a rental that is still open. Returns `false` when the rental
    /// does not exist or was already closed.
    async fn close(
        &self,
        con: &mut Self::Transaction,
        id: &RentalId,
        settlement: &Settlement,
    ) -> error_stack::Result<bool, KernelError>;
    async fn update(
        &self,
        con: &mut Self::Transaction,
        id: &RentalId,
        patch: &RentalPatch,
    ) -> error_stack::Result<(), KernelError>;
}

pub trait DependOnRentalModifier: 'static + Sync + Send + DependOnDatabaseConnection {
    type RentalModifier: RentalModifier<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn rental_modifier(&self) -> &Self::RentalModifier;
}
