use error_stack::Report;
use kernel::interface::database::TransactionOf;
use kernel::interface::query::{BikeQuery, DependOnBikeQuery};
use kernel::interface::update::{BikeModifier, DependOnBikeModifier};
use kernel::prelude::entity::{BikeAvailability, BikeId, PricePerMinute};
use kernel::KernelError;

/// Owner of the per-bike availability flag and cost rate.
///
/// Every method runs on a transaction opened by the caller; the flag is only ever written from
/// inside the rental ledger's transactions.
#[async_trait::async_trait]
pub trait BikeAvailabilityStore: 'static + Sync + Send + DependOnBikeQuery + DependOnBikeModifier {
    async fn is_available(
        &self,
        con: &mut TransactionOf<Self>,
        bike_id: &BikeId,
    ) -> error_stack::Result<bool, KernelError> {
        let availability = self
            .bike_query()
            .find_availability(con, bike_id)
            .await?
            .ok_or_else(|| bike_not_found(bike_id))?;
        Ok(availability.is_available())
    }

    async fn cost_per_minute(
        &self,
        con: &mut TransactionOf<Self>,
        bike_id: &BikeId,
    ) -> error_stack::Result<PricePerMinute, KernelError> {
        self.bike_query()
            .find_price(con, bike_id)
            .await?
            .ok_or_else(|| bike_not_found(bike_id))
    }

    async fn set_availability(
        &self,
        con: &mut TransactionOf<Self>,
        bike_id: &BikeId,
        availability: BikeAvailability,
    ) -> error_stack::Result<(), KernelError> {
        self.bike_modifier()
            .set_availability(con, bike_id, availability)
            .await
    }

    /// Flips the flag from available to rented, failing with `BikeNotAvailable` when another
    /// transaction got there first.
    async fn claim(
        &self,
        con: &mut TransactionOf<Self>,
        bike_id: &BikeId,
    ) -> error_stack::Result<(), KernelError> {
        let claimed = self
            .bike_modifier()
            .compare_and_set_availability(
                con,
                bike_id,
                BikeAvailability::AVAILABLE,
                BikeAvailability::RENTED,
            )
            .await?;
        if claimed {
            return Ok(());
        }
        match self.bike_query().find_availability(con, bike_id).await? {
            None => Err(bike_not_found(bike_id)),
            Some(_) => Err(Report::new(KernelError::BikeNotAvailable)
                .attach_printable(format!("bike {} is already rented", bike_id.as_ref()))),
        }
    }

    async fn release(
        &self,
        con: &mut TransactionOf<Self>,
        bike_id: &BikeId,
    ) -> error_stack::Result<(), KernelError> {
        self.set_availability(con, bike_id, BikeAvailability::AVAILABLE)
            .await
    }
}

impl<T> BikeAvailabilityStore for T where T: DependOnBikeQuery + DependOnBikeModifier {}

fn bike_not_found(bike_id: &BikeId) -> Report<KernelError> {
    Report::new(KernelError::NotFound).attach_printable(format!("bike {} not found", bike_id.as_ref()))
}
