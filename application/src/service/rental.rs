use std::f64::consts::TAU;

use error_stack::Report;
use rand::Rng;
use time::OffsetDateTime;

use kernel::interface::database::{
    DatabaseConnection, DependOnDatabaseConnection, Transaction, TransactionOf,
};
use kernel::interface::query::{
    BikeQuery, DependOnRentalQuery, DependOnUserQuery, RentalQuery, UserQuery,
};
use kernel::interface::update::{
    DependOnRentalModifier, NewRental, RentalModifier, RentalPatch,
};
use kernel::prelude::entity::{
    BikeId, EndedAt, Latitude, Longitude, Page, PageId, Position, Rental, RentalId,
    Settlement, StartedAt, UserId,
};
use kernel::KernelError;

use crate::service::BikeAvailabilityStore;
use crate::transfer::{
    EndRentalDto, EndedRentalDto, ForceEndRentalDto, GetOngoingRentalDto, GetPageDto,
    GetRentalDto, GetRentalHistoryDto, PageDto, RentalDto, StartRentalDto, StartedRentalDto,
    UpdateRentalDto,
};

/// Upper bound of the distance between start and generated drop-off point.
pub const MAX_DROP_OFF_RADIUS_KM: f64 = 5.0;

#[async_trait::async_trait]
pub trait StartRentalService:
    'static
    + Sync
    + Send
    + DependOnDatabaseConnection
    + DependOnRentalQuery
    + DependOnRentalModifier
    + BikeAvailabilityStore
{
    /// Opens a rental and marks the bike rented in the same transaction.
    #[tracing::instrument(skip_all, fields(user_id = dto.user_id, bike_id = dto.bike_id))]
    async fn start_rental(
        &self,
        dto: StartRentalDto,
    ) -> error_stack::Result<StartedRentalDto, KernelError> {
        let user_id = UserId::new(dto.user_id);
        let bike_id = BikeId::new(dto.bike_id);
        let start_position = Position::new(
            Latitude::try_new(dto.latitude)?,
            Longitude::try_new(dto.longitude)?,
        );

        let mut connection = self.database_connection().transact().await?;

        if let Some(open) = self
            .rental_query()
            .find_open_by_user_id(&mut connection, &user_id)
            .await?
        {
            return Err(Report::new(KernelError::UserAlreadyRenting).attach_printable(format!(
                "user {} already has open rental {}",
                user_id.as_ref(),
                open.id().as_ref()
            )));
        }
        if !self.is_available(&mut connection, &bike_id).await? {
            return Err(Report::new(KernelError::BikeNotAvailable)
                .attach_printable(format!("bike {} is already rented", bike_id.as_ref())));
        }

        // The pre-checks above are advisory; the conditional flip is what serialises racing starts.
        self.claim(&mut connection, &bike_id).await?;

        let started_at = StartedAt::new(OffsetDateTime::now_utc());
        let rental = NewRental::new(user_id, bike_id, started_at, start_position);
        let rental_id = self
            .rental_modifier()
            .open(&mut connection, &rental)
            .await?;

        connection.commit().await?;
        tracing::info!(
            rental_id = rental_id.as_ref(),
            user_id = user_id.as_ref(),
            bike_id = bike_id.as_ref(),
            "rental started"
        );

        Ok(StartedRentalDto {
            id: rental_id.into(),
            start_time: started_at.into(),
            latitude: (*start_position.latitude()).into(),
            longitude: (*start_position.longitude()).into(),
        })
    }
}

impl<T> StartRentalService for T where
    T: DependOnDatabaseConnection + DependOnRentalQuery + DependOnRentalModifier + BikeAvailabilityStore
{
}

#[async_trait::async_trait]
pub trait EndRentalService:
    'static
    + Sync
    + Send
    + DependOnDatabaseConnection
    + DependOnRentalQuery
    + DependOnRentalModifier
    + BikeAvailabilityStore
{
    /// Closes the caller's open rental, bills it and releases the bike.
    #[tracing::instrument(skip_all, fields(user_id = dto.user_id, rental_id = dto.rental_id))]
    async fn end_rental(
        &self,
        dto: EndRentalDto,
    ) -> error_stack::Result<EndedRentalDto, KernelError> {
        let user_id = UserId::new(dto.user_id);
        let requested = RentalId::new(dto.rental_id);
        let end_position = match dto.position {
            Some((latitude, longitude)) => Some(Position::new(
                Latitude::try_new(latitude)?,
                Longitude::try_new(longitude)?,
            )),
            None => None,
        };

        let mut connection = self.database_connection().transact().await?;

        let open = self
            .rental_query()
            .find_open_by_user_id(&mut connection, &user_id)
            .await?
            .ok_or_else(|| {
                Report::new(KernelError::NoOpenRental)
                    .attach_printable(format!("user {} has no open rental", user_id.as_ref()))
            })?;
        if open.id() != &requested {
            return Err(Report::new(KernelError::RentalMismatch).attach_printable(format!(
                "requested rental {} but open rental is {}",
                requested.as_ref(),
                open.id().as_ref()
            )));
        }

        settle(self, connection, open, end_position).await
    }

    /// Administrative close of any open rental, billed exactly like a regular end.
    #[tracing::instrument(skip_all, fields(rental_id = dto.rental_id))]
    async fn force_end_rental(
        &self,
        dto: ForceEndRentalDto,
    ) -> error_stack::Result<EndedRentalDto, KernelError> {
        let rental_id = RentalId::new(dto.rental_id);
        let mut connection = self.database_connection().transact().await?;

        let rental = self
            .rental_query()
            .find_by_id(&mut connection, &rental_id)
            .await?
            .ok_or_else(|| rental_not_found(&rental_id))?;
        if !rental.is_open() {
            return Err(Report::new(KernelError::NoOpenRental)
                .attach_printable(format!("rental {} is already closed", rental_id.as_ref())));
        }

        settle(self, connection, rental, None).await
    }
}

impl<T> EndRentalService for T where
    T: DependOnDatabaseConnection + DependOnRentalQuery + DependOnRentalModifier + BikeAvailabilityStore
{
}

async fn settle<T>(
    service: &T,
    mut connection: TransactionOf<T>,
    rental: Rental,
    end_position: Option<Position>,
) -> error_stack::Result<EndedRentalDto, KernelError>
where
    T: DependOnRentalModifier + BikeAvailabilityStore + ?Sized,
{
    let price = service
        .cost_per_minute(&mut connection, rental.bike_id())
        .await?;
    let end_position = end_position.unwrap_or_else(|| random_drop_off(rental.start_position()));
    let settlement = Settlement::compute(
        &price,
        rental.started_at(),
        EndedAt::new(OffsetDateTime::now_utc()),
        end_position,
    );

    let closed = service
        .rental_modifier()
        .close(&mut connection, rental.id(), &settlement)
        .await?;
    if !closed {
        return Err(Report::new(KernelError::NoOpenRental)
            .attach_printable(format!("rental {} was closed concurrently", rental.id().as_ref())));
    }
    service.release(&mut connection, rental.bike_id()).await?;

    connection.commit().await?;
    tracing::info!(
        rental_id = rental.id().as_ref(),
        bike_id = rental.bike_id().as_ref(),
        cost = settlement.cost().as_ref(),
        "rental ended"
    );

    Ok(EndedRentalDto {
        rental_id: (*rental.id()).into(),
        bike_id: (*rental.bike_id()).into(),
        end_time: (*settlement.ended_at()).into(),
        latitude: (*end_position.latitude()).into(),
        longitude: (*end_position.longitude()).into(),
        cost: (*settlement.cost()).into(),
        duration_minutes: (*settlement.duration()).into(),
        distance_km: rental.start_position().distance_km(&end_position),
    })
}

/// Placeholder for a tracked drop-off point: uniform bearing, distance up to
/// [`MAX_DROP_OFF_RADIUS_KM`].
fn random_drop_off(start: &Position) -> Position {
    let mut rng = rand::thread_rng();
    let bearing = rng.gen::<f64>() * TAU;
    let distance = rng.gen::<f64>() * MAX_DROP_OFF_RADIUS_KM;
    start.destination(distance, bearing)
}

fn rental_not_found(rental_id: &RentalId) -> Report<KernelError> {
    Report::new(KernelError::NotFound)
        .attach_printable(format!("rental {} not found", rental_id.as_ref()))
}

#[async_trait::async_trait]
pub trait GetRentalService: 'static + Sync + Send + DependOnDatabaseConnection + DependOnRentalQuery {
    async fn get_rental(&self, dto: GetRentalDto) -> error_stack::Result<RentalDto, KernelError> {
        let mut connection = self.database_connection().transact().await?;
        let id = RentalId::new(dto.id);
        let rental = self
            .rental_query()
            .find_by_id(&mut connection, &id)
            .await?
            .ok_or_else(|| rental_not_found(&id))?;
        Ok(RentalDto::from(rental))
    }

    async fn get_ongoing_rental(
        &self,
        dto: GetOngoingRentalDto,
    ) -> error_stack::Result<RentalDto, KernelError> {
        let mut connection = self.database_connection().transact().await?;
        let user_id = UserId::new(dto.user_id);
        let rental = self
            .rental_query()
            .find_open_by_user_id(&mut connection, &user_id)
            .await?
            .ok_or_else(|| {
                Report::new(KernelError::NotFound)
                    .attach_printable(format!("user {} has no open rental", user_id.as_ref()))
            })?;
        Ok(RentalDto::from(rental))
    }

    async fn get_rental_history(
        &self,
        dto: GetRentalHistoryDto,
    ) -> error_stack::Result<PageDto<RentalDto>, KernelError> {
        let mut connection = self.database_connection().transact().await?;
        let rentals = self
            .rental_query()
            .find_by_user_id(
                &mut connection,
                &UserId::new(dto.user_id),
                &PageId::new(dto.page_id),
            )
            .await?;
        Ok(PageDto::from(Page::from_rows(rentals, |rental| {
            (*rental.id()).into()
        })))
    }

    async fn get_all_rentals(
        &self,
        dto: GetPageDto,
    ) -> error_stack::Result<PageDto<RentalDto>, KernelError> {
        let mut connection = self.database_connection().transact().await?;
        let rentals = self
            .rental_query()
            .find_all(&mut connection, &PageId::new(dto.page_id))
            .await?;
        Ok(PageDto::from(Page::from_rows(rentals, |rental| {
            (*rental.id()).into()
        })))
    }
}

impl<T> GetRentalService for T where T: DependOnDatabaseConnection + DependOnRentalQuery {}

#[async_trait::async_trait]
pub trait UpdateRentalService:
    'static
    + Sync
    + Send
    + DependOnDatabaseConnection
    + DependOnRentalQuery
    + DependOnRentalModifier
    + DependOnUserQuery
    + BikeAvailabilityStore
{
    /// Administrative edit of `bike_id`, `user_id` and the start position.
    ///
    /// Reassigning an open rental goes through the same guards as starting one: the new bike is
    /// claimed with the conditional flip and the old one released, and a user may not end up
    /// with two open rentals. Closed rentals only have their attribution rewritten. A new user or
    /// bike must exist in either case.
    async fn update_rental(
        &self,
        dto: UpdateRentalDto,
    ) -> error_stack::Result<RentalDto, KernelError> {
        let rental_id = RentalId::new(dto.id);
        let start_latitude = dto.start_latitude.map(Latitude::try_new).transpose()?;
        let start_longitude = dto.start_longitude.map(Longitude::try_new).transpose()?;

        let mut connection = self.database_connection().transact().await?;

        let rental = self
            .rental_query()
            .find_by_id(&mut connection, &rental_id)
            .await?
            .ok_or_else(|| rental_not_found(&rental_id))?;

        let patch = RentalPatch::new(
            dto.bike_id
                .map(BikeId::new)
                .filter(|bike_id| bike_id != rental.bike_id()),
            dto.user_id
                .map(UserId::new)
                .filter(|user_id| user_id != rental.user_id()),
            start_latitude.filter(|latitude| latitude != rental.start_position().latitude()),
            start_longitude.filter(|longitude| longitude != rental.start_position().longitude()),
        );
        if patch.is_empty() {
            return Err(
                Report::new(KernelError::Validation).attach_printable("No fields to update")
            );
        }

        if let Some(user_id) = patch.user_id() {
            if self
                .user_query()
                .find_by_id(&mut connection, user_id)
                .await?
                .is_none()
            {
                return Err(Report::new(KernelError::NotFound)
                    .attach_printable(format!("user {} not found", user_id.as_ref())));
            }
        }
        if let Some(bike_id) = patch.bike_id() {
            if self
                .bike_query()
                .find_by_id(&mut connection, bike_id)
                .await?
                .is_none()
            {
                return Err(Report::new(KernelError::NotFound)
                    .attach_printable(format!("bike {} not found", bike_id.as_ref())));
            }
        }

        if rental.is_open() {
            if let Some(user_id) = patch.user_id() {
                if self
                    .rental_query()
                    .find_open_by_user_id(&mut connection, user_id)
                    .await?
                    .is_some()
                {
                    return Err(Report::new(KernelError::UserAlreadyRenting).attach_printable(
                        format!("user {} already has an open rental", user_id.as_ref()),
                    ));
                }
            }
            if let Some(bike_id) = patch.bike_id() {
                self.claim(&mut connection, bike_id).await?;
                self.release(&mut connection, rental.bike_id()).await?;
            }
        }

        self.rental_modifier()
            .update(&mut connection, &rental_id, &patch)
            .await?;
        let updated = self
            .rental_query()
            .find_by_id(&mut connection, &rental_id)
            .await?
            .ok_or_else(|| rental_not_found(&rental_id))?;

        connection.commit().await?;
        tracing::info!(rental_id = rental_id.as_ref(), ?patch, "rental updated");

        Ok(RentalDto::from(updated))
    }
}

impl<T> UpdateRentalService for T where
    T: DependOnDatabaseConnection
        + DependOnRentalQuery
        + DependOnRentalModifier
        + DependOnUserQuery
        + BikeAvailabilityStore
{
}
