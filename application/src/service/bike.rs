use error_stack::Report;

use kernel::interface::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use kernel::interface::query::{BikeQuery, DependOnBikeQuery, DependOnRentalQuery, RentalQuery};
use kernel::interface::update::{BikeModifier, BikePatch, DependOnBikeModifier, NewBike};
use kernel::prelude::entity::{
    BikeAvailability, BikeId, Latitude, Longitude, Page, PageId, Position, PricePerMinute,
};
use kernel::KernelError;

use crate::transfer::{BikeDto, CreateBikeDto, GetBikeDto, GetPageDto, PageDto, UpdateBikeDto};

fn bike_not_found(id: &BikeId) -> Report<KernelError> {
    Report::new(KernelError::NotFound).attach_printable(format!("bike {} not found", id.as_ref()))
}

#[async_trait::async_trait]
pub trait GetBikeService: 'static + Sync + Send + DependOnDatabaseConnection + DependOnBikeQuery {
    async fn get_bike(&self, dto: GetBikeDto) -> error_stack::Result<BikeDto, KernelError> {
        let mut connection = self.database_connection().transact().await?;
        let id = BikeId::new(dto.id);
        let bike = self
            .bike_query()
            .find_by_id(&mut connection, &id)
            .await?
            .ok_or_else(|| bike_not_found(&id))?;
        Ok(BikeDto::from(bike))
    }

    async fn get_all_bikes(
        &self,
        dto: GetPageDto,
    ) -> error_stack::Result<PageDto<BikeDto>, KernelError> {
        let mut connection = self.database_connection().transact().await?;
        let bikes = self
            .bike_query()
            .find_all(&mut connection, &PageId::new(dto.page_id))
            .await?;
        Ok(PageDto::from(Page::from_rows(bikes, |bike| (*bike.id()).into())))
    }

    async fn get_available_bikes(
        &self,
        dto: GetPageDto,
    ) -> error_stack::Result<PageDto<BikeDto>, KernelError> {
        let mut connection = self.database_connection().transact().await?;
        let bikes = self
            .bike_query()
            .find_available(&mut connection, &PageId::new(dto.page_id))
            .await?;
        Ok(PageDto::from(Page::from_rows(bikes, |bike| (*bike.id()).into())))
    }
}

impl<T> GetBikeService for T where T: DependOnDatabaseConnection + DependOnBikeQuery {}

#[async_trait::async_trait]
pub trait CreateBikeService:
    'static + Sync + Send + DependOnDatabaseConnection + DependOnBikeQuery + DependOnBikeModifier
{
    async fn create_bike(&self, dto: CreateBikeDto) -> error_stack::Result<BikeDto, KernelError> {
        let bike = NewBike::new(
            PricePerMinute::try_new(dto.price_per_minute)?,
            Position::new(
                Latitude::try_new(dto.latitude)?,
                Longitude::try_new(dto.longitude)?,
            ),
        );

        let mut connection = self.database_connection().transact().await?;
        let id = self.bike_modifier().create(&mut connection, &bike).await?;
        let created = self
            .bike_query()
            .find_by_id(&mut connection, &id)
            .await?
            .ok_or_else(|| bike_not_found(&id))?;
        connection.commit().await?;

        tracing::info!(bike_id = id.as_ref(), "bike created");
        Ok(BikeDto::from(created))
    }
}

impl<T> CreateBikeService for T where
    T: DependOnDatabaseConnection + DependOnBikeQuery + DependOnBikeModifier
{
}

#[async_trait::async_trait]
pub trait UpdateBikeService:
    'static
    + Sync
    + Send
    + DependOnDatabaseConnection
    + DependOnBikeQuery
    + DependOnBikeModifier
    + DependOnRentalQuery
{
    /// Writes only the fields that differ from the stored bike.
    ///
    /// The availability flag may be edited only towards the state implied by the bike's open
    /// rental, so an administrator can repair a stale flag but cannot free a bike that is out.
    async fn update_bike(&self, dto: UpdateBikeDto) -> error_stack::Result<BikeDto, KernelError> {
        let id = BikeId::new(dto.id);
        let price = dto.price_per_minute.map(PricePerMinute::try_new).transpose()?;
        let latitude = dto.latitude.map(Latitude::try_new).transpose()?;
        let longitude = dto.longitude.map(Longitude::try_new).transpose()?;

        let mut connection = self.database_connection().transact().await?;
        let bike = self
            .bike_query()
            .find_by_id(&mut connection, &id)
            .await?
            .ok_or_else(|| bike_not_found(&id))?;

        let patch = BikePatch::new(
            dto.is_available
                .map(BikeAvailability::new)
                .filter(|availability| availability != bike.availability()),
            price.filter(|price| price != bike.price()),
            latitude.filter(|latitude| latitude != bike.position().latitude()),
            longitude.filter(|longitude| longitude != bike.position().longitude()),
        );
        if patch.is_empty() {
            return Err(
                Report::new(KernelError::Validation).attach_printable("No fields to update")
            );
        }

        if let Some(availability) = patch.availability() {
            let open = self
                .rental_query()
                .find_open_by_bike_id(&mut connection, &id)
                .await?;
            if availability.is_available() == open.is_some() {
                return Err(Report::new(KernelError::Conflict).attach_printable(format!(
                    "bike {} availability must match its open rental state",
                    id.as_ref()
                )));
            }
        }

        self.bike_modifier()
            .update(&mut connection, &id, &patch)
            .await?;
        let updated = self
            .bike_query()
            .find_by_id(&mut connection, &id)
            .await?
            .ok_or_else(|| bike_not_found(&id))?;
        connection.commit().await?;

        tracing::info!(bike_id = id.as_ref(), ?patch, "bike updated");
        Ok(BikeDto::from(updated))
    }
}

impl<T> UpdateBikeService for T where
    T: DependOnDatabaseConnection + DependOnBikeQuery + DependOnBikeModifier + DependOnRentalQuery
{
}

#[cfg(test)]
mod test {
    use kernel::KernelError;

    use crate::service::{CreateBikeService, GetBikeService, StartRentalService, UpdateBikeService};
    use crate::test_support::TestModule;
    use crate::transfer::{CreateBikeDto, GetPageDto, StartRentalDto, UpdateBikeDto};

    fn patch(id: i64) -> UpdateBikeDto {
        UpdateBikeDto {
            id,
            is_available: None,
            price_per_minute: None,
            latitude: None,
            longitude: None,
        }
    }

    #[tokio::test]
    async fn created_bikes_start_available() -> error_stack::Result<(), KernelError> {
        let module = TestModule::default();
        let bike = module
            .create_bike(CreateBikeDto {
                price_per_minute: 0.25,
                latitude: 40.4,
                longitude: -3.7,
            })
            .await?;
        assert!(bike.is_available);
        assert_eq!(bike.price_per_minute, 0.25);

        let error = module
            .create_bike(CreateBikeDto {
                price_per_minute: -1.0,
                latitude: 40.4,
                longitude: -3.7,
            })
            .await
            .unwrap_err();
        assert_eq!(error.current_context(), &KernelError::Validation);
        Ok(())
    }

    #[tokio::test]
    async fn available_listing_skips_rented_bikes() -> error_stack::Result<(), KernelError> {
        let module = TestModule::default();
        let user = module.seed_user("u1@example.com").await;
        let rented = module.seed_bike(0.07, 51.5, -0.16).await;
        let free = module.seed_bike(0.07, 51.5, -0.16).await;
        module
            .start_rental(StartRentalDto {
                user_id: user,
                bike_id: rented,
                latitude: 51.5,
                longitude: -0.16,
            })
            .await?;

        let available = module
            .get_available_bikes(GetPageDto { page_id: 0 })
            .await?;
        let ids = available.items.iter().map(|bike| bike.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![free]);
        assert_eq!(available.next_page_id, None);

        let all = module.get_all_bikes(GetPageDto { page_id: 0 }).await?;
        assert_eq!(all.items.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn update_writes_only_changed_fields() -> error_stack::Result<(), KernelError> {
        let module = TestModule::default();
        let bike = module.seed_bike(0.07, 51.5, -0.16).await;

        let mut dto = patch(bike);
        dto.price_per_minute = Some(0.07);
        let error = module.update_bike(dto).await.unwrap_err();
        assert_eq!(error.current_context(), &KernelError::Validation);

        let mut dto = patch(bike);
        dto.price_per_minute = Some(0.1);
        dto.latitude = Some(51.6);
        let updated = module.update_bike(dto).await?;
        assert_eq!(updated.price_per_minute, 0.1);
        assert_eq!(updated.latitude, 51.6);
        assert_eq!(updated.longitude, -0.16);
        Ok(())
    }

    #[tokio::test]
    async fn availability_must_follow_open_rentals() -> error_stack::Result<(), KernelError> {
        let module = TestModule::default();
        let user = module.seed_user("u1@example.com").await;
        let bike = module.seed_bike(0.07, 51.5, -0.16).await;

        let mut dto = patch(bike);
        dto.is_available = Some(false);
        let error = module.update_bike(dto).await.unwrap_err();
        assert_eq!(error.current_context(), &KernelError::Conflict);

        module
            .start_rental(StartRentalDto {
                user_id: user,
                bike_id: bike,
                latitude: 51.5,
                longitude: -0.16,
            })
            .await?;
        let mut dto = patch(bike);
        dto.is_available = Some(true);
        let error = module.update_bike(dto).await.unwrap_err();
        assert_eq!(error.current_context(), &KernelError::Conflict);
        Ok(())
    }
}
