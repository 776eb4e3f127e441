use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{Bike, BikeAvailability, BikeId, PageId, PricePerMinute};
use crate::KernelError;

#[async_trait::async_trait]
pub trait BikeQuery: 'static + Sync + Send {
    type Transaction: Transaction;
    async fn find_by_id(
        &self,
        con: &mut Self::Transaction,
        id: &BikeId,
    ) -> error_stack::Result<Option<Bike>, KernelError>;
    async fn find_availability(
        &self,
        con: &mut Self::Transaction,
        id: &BikeId,
    ) -> error_stack::Result<Option<BikeAvailability>, KernelError>;
    async fn find_price(
        &self,
        con: &mut Self::Transaction,
        id: &BikeId,
    ) -> error_stack::Result<Option<PricePerMinute>, KernelError>;
    /// One page of every bike with `id > page`, ordered by id.
    async fn find_all(
        &self,
        con: &mut Self::Transaction,
        page: &PageId,
    ) -> error_stack::Result<Vec<Bike>, KernelError>;
    async fn find_available(
        &self,
        con: &mut Self::Transaction,
        page: &PageId,
    ) -> error_stack::Result<Vec<Bike>, KernelError>;
}

pub trait DependOnBikeQuery: 'static + Sync + Send + DependOnDatabaseConnection {
    type BikeQuery: BikeQuery<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn bike_query(&self) -> &Self::BikeQuery;
}
