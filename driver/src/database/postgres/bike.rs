use error_stack::Report;
use sqlx::PgConnection;
use time::OffsetDateTime;

use kernel::interface::query::BikeQuery;
use kernel::interface::update::{BikeModifier, BikePatch, NewBike};
use kernel::prelude::entity::{
    Bike, BikeAvailability, BikeId, CreatedAt, Latitude, Longitude, PAGE_SIZE, PageId, Position,
    PricePerMinute, UpdatedAt,
};
use kernel::KernelError;

use crate::database::postgres::PostgresConnection;
use crate::error::ConvertError;

#[derive(Clone, Default)]
pub struct PostgresBikeRepository;

#[async_trait::async_trait]
impl BikeQuery for PostgresBikeRepository {
    type Transaction = PostgresConnection;

    async fn find_by_id(
        &self,
        con: &mut PostgresConnection,
        id: &BikeId,
    ) -> error_stack::Result<Option<Bike>, KernelError> {
        PgBikeInternal::find_by_id(con, id).await
    }

    async fn find_availability(
        &self,
        con: &mut PostgresConnection,
        id: &BikeId,
    ) -> error_stack::Result<Option<BikeAvailability>, KernelError> {
        PgBikeInternal::find_availability(con, id).await
    }

    async fn find_price(
        &self,
        con: &mut PostgresConnection,
        id: &BikeId,
    ) -> error_stack::Result<Option<PricePerMinute>, KernelError> {
        PgBikeInternal::find_price(con, id).await
    }

    async fn find_all(
        &self,
        con: &mut PostgresConnection,
        page: &PageId,
    ) -> error_stack::Result<Vec<Bike>, KernelError> {
        PgBikeInternal::find_page(con, page, false).await
    }

    async fn find_available(
        &self,
        con: &mut PostgresConnection,
        page: &PageId,
    ) -> error_stack::Result<Vec<Bike>, KernelError> {
        PgBikeInternal::find_page(con, page, true).await
    }
}

#[async_trait::async_trait]
impl BikeModifier for PostgresBikeRepository {
    type Transaction = PostgresConnection;

    async fn create(
        &self,
        con: &mut PostgresConnection,
        bike: &NewBike,
    ) -> error_stack::Result<BikeId, KernelError> {
        PgBikeInternal::create(con, bike).await
    }

    async fn update(
        &self,
        con: &mut PostgresConnection,
        id: &BikeId,
        patch: &BikePatch,
    ) -> error_stack::Result<(), KernelError> {
        PgBikeInternal::update(con, id, patch).await
    }

    async fn set_availability(
        &self,
        con: &mut PostgresConnection,
        id: &BikeId,
        availability: BikeAvailability,
    ) -> error_stack::Result<(), KernelError> {
        PgBikeInternal::set_availability(con, id, availability).await
    }

    async fn compare_and_set_availability(
        &self,
        con: &mut PostgresConnection,
        id: &BikeId,
        expected: BikeAvailability,
        next: BikeAvailability,
    ) -> error_stack::Result<bool, KernelError> {
        PgBikeInternal::compare_and_set_availability(con, id, expected, next).await
    }
}

#[derive(sqlx::FromRow)]
struct BikeRow {
    id: i64,
    is_available: bool,
    price_per_minute: f64,
    latitude: f64,
    longitude: f64,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<BikeRow> for Bike {
    fn from(row: BikeRow) -> Self {
        Bike::new(
            BikeId::new(row.id),
            BikeAvailability::new(row.is_available),
            PricePerMinute::new(row.price_per_minute),
            Position::new(Latitude::new(row.latitude), Longitude::new(row.longitude)),
            CreatedAt::new(row.created_at),
            UpdatedAt::new(row.updated_at),
        )
    }
}

pub(in crate::database) struct PgBikeInternal;

impl PgBikeInternal {
    async fn find_by_id(
        con: &mut PgConnection,
        id: &BikeId,
    ) -> error_stack::Result<Option<Bike>, KernelError> {
        let row = sqlx::query_as::<_, BikeRow>(
            // language=postgresql
            r#"
            SELECT id, is_available, price_per_minute, latitude, longitude, created_at, updated_at
            FROM bikes
            WHERE id = $1
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(Bike::from))
    }

    async fn find_availability(
        con: &mut PgConnection,
        id: &BikeId,
    ) -> error_stack::Result<Option<BikeAvailability>, KernelError> {
        let available = sqlx::query_scalar::<_, bool>(
            // language=postgresql
            r#"
            SELECT is_available FROM bikes WHERE id = $1
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(available.map(BikeAvailability::new))
    }

    async fn find_price(
        con: &mut PgConnection,
        id: &BikeId,
    ) -> error_stack::Result<Option<PricePerMinute>, KernelError> {
        let price = sqlx::query_scalar::<_, f64>(
            // language=postgresql
            r#"
            SELECT price_per_minute FROM bikes WHERE id = $1
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(price.map(PricePerMinute::new))
    }

    async fn find_page(
        con: &mut PgConnection,
        page: &PageId,
        only_available: bool,
    ) -> error_stack::Result<Vec<Bike>, KernelError> {
        let rows = sqlx::query_as::<_, BikeRow>(
            // language=postgresql
            r#"
            SELECT id, is_available, price_per_minute, latitude, longitude, created_at, updated_at
            FROM bikes
            WHERE id > $1 AND (NOT $2 OR is_available)
            ORDER BY id
            LIMIT $3
            "#,
        )
        .bind(page.as_ref())
        .bind(only_available)
        .bind(PAGE_SIZE)
        .fetch_all(con)
        .await
        .convert_error()?;
        Ok(rows.into_iter().map(Bike::from).collect())
    }

    async fn create(con: &mut PgConnection, bike: &NewBike) -> error_stack::Result<BikeId, KernelError> {
        let id = sqlx::query_scalar::<_, i64>(
            // language=postgresql
            r#"
            INSERT INTO bikes (is_available, price_per_minute, latitude, longitude)
            VALUES (TRUE, $1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(bike.price().as_ref())
        .bind(bike.position().latitude().as_ref())
        .bind(bike.position().longitude().as_ref())
        .fetch_one(con)
        .await
        .convert_error()?;
        Ok(BikeId::new(id))
    }

    async fn update(
        con: &mut PgConnection,
        id: &BikeId,
        patch: &BikePatch,
    ) -> error_stack::Result<(), KernelError> {
        // language=postgresql
        let result = sqlx::query(
            r#"
            UPDATE bikes
            SET is_available     = COALESCE($2, is_available),
                price_per_minute = COALESCE($3, price_per_minute),
                latitude         = COALESCE($4, latitude),
                longitude        = COALESCE($5, longitude),
                updated_at       = now()
            WHERE id = $1
            "#,
        )
        .bind(id.as_ref())
        .bind(patch.availability().map(|availability| availability.is_available()))
        .bind(patch.price().map(f64::from))
        .bind(patch.latitude().map(f64::from))
        .bind(patch.longitude().map(f64::from))
        .execute(con)
        .await
        .convert_error()?;
        if result.rows_affected() == 0 {
            return Err(Report::new(KernelError::NotFound)
                .attach_printable(format!("bike {} not found", id.as_ref())));
        }
        Ok(())
    }

    async fn set_availability(
        con: &mut PgConnection,
        id: &BikeId,
        availability: BikeAvailability,
    ) -> error_stack::Result<(), KernelError> {
        // language=postgresql
        let result = sqlx::query(
            r#"
            UPDATE bikes SET is_available = $2, updated_at = now() WHERE id = $1
            "#,
        )
        .bind(id.as_ref())
        .bind(availability.is_available())
        .execute(con)
        .await
        .convert_error()?;
        if result.rows_affected() == 0 {
            return Err(Report::new(KernelError::NotFound)
                .attach_printable(format!("bike {} not found", id.as_ref())));
        }
        Ok(())
    }

    async fn compare_and_set_availability(
        con: &mut PgConnection,
        id: &BikeId,
        expected: BikeAvailability,
        next: BikeAvailability,
    ) -> error_stack::Result<bool, KernelError> {
        // language=postgresql
        let result = sqlx::query(
            r#"
            UPDATE bikes
            SET is_available = $3, updated_at = now()
            WHERE id = $1 AND is_available = $2
            "#,
        )
        .bind(id.as_ref())
        .bind(expected.is_available())
        .bind(next.is_available())
        .execute(con)
        .await
        .convert_error()?;
        Ok(result.rows_affected() == 1)
    }
}
