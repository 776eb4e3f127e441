use error_stack::Report;
use sqlx::PgConnection;
use time::OffsetDateTime;

use kernel::interface::query::RentalQuery;
use kernel::interface::update::{NewRental, RentalModifier, RentalPatch};
use kernel::prelude::entity::{
    BikeId, CreatedAt, DurationMinutes, EndedAt, Latitude, Longitude, PAGE_SIZE, PageId,
    Position, Rental, RentalCost, RentalId, Settlement, StartedAt, UpdatedAt, UserId,
};
use kernel::KernelError;

use crate::database::postgres::PostgresConnection;
use crate::error::{violated_foreign_key, violated_unique_index, ConvertError};

const ONE_OPEN_PER_USER: &str = "rentals_one_open_per_user";
const ONE_OPEN_PER_BIKE: &str = "rentals_one_open_per_bike";

#[derive(Clone, Default)]
pub struct PostgresRentalRepository;

#[async_trait::async_trait]
impl RentalQuery for PostgresRentalRepository {
    type Transaction = PostgresConnection;

    async fn find_by_id(
        &self,
        con: &mut PostgresConnection,
        id: &RentalId,
    ) -> error_stack::Result<Option<Rental>, KernelError> {
        PgRentalInternal::find_by_id(con, id).await
    }

    async fn find_open_by_user_id(
        &self,
        con: &mut PostgresConnection,
        user_id: &UserId,
    ) -> error_stack::Result<Option<Rental>, KernelError> {
        PgRentalInternal::find_open_by_user_id(con, user_id).await
    }

    async fn find_open_by_bike_id(
        &self,
        con: &mut PostgresConnection,
        bike_id: &BikeId,
    ) -> error_stack::Result<Option<Rental>, KernelError> {
        PgRentalInternal::find_open_by_bike_id(con, bike_id).await
    }

    async fn find_by_user_id(
        &self,
        con: &mut PostgresConnection,
        user_id: &UserId,
        page: &PageId,
    ) -> error_stack::Result<Vec<Rental>, KernelError> {
        PgRentalInternal::find_by_user_id(con, user_id, page).await
    }

    async fn find_all(
        &self,
        con: &mut PostgresConnection,
        page: &PageId,
    ) -> error_stack::Result<Vec<Rental>, KernelError> {
        PgRentalInternal::find_all(con, page).await
    }
}

#[async_trait::async_trait]
impl RentalModifier for PostgresRentalRepository {
    type Transaction = PostgresConnection;

    async fn open(
        &self,
        con: &mut PostgresConnection,
        rental: &NewRental,
    ) -> error_stack::Result<RentalId, KernelError> {
        PgRentalInternal::open(con, rental).await
    }

    async fn close(
        &self,
        con: &mut PostgresConnection,
        id: &RentalId,
        settlement: &Settlement,
    ) -> error_stack::Result<bool, KernelError> {
        PgRentalInternal::close(con, id, settlement).await
    }

    async fn update(
        &self,
        con: &mut PostgresConnection,
        id: &RentalId,
        patch: &RentalPatch,
    ) -> error_stack::Result<(), KernelError> {
        PgRentalInternal::update(con, id, patch).await
    }
}

#[derive(sqlx::FromRow)]
struct RentalRow {
    id: i64,
    user_id: i64,
    bike_id: i64,
    start_time: OffsetDateTime,
    end_time: Option<OffsetDateTime>,
    start_latitude: f64,
    start_longitude: f64,
    end_latitude: Option<f64>,
    end_longitude: Option<f64>,
    duration_minutes: Option<i64>,
    cost: f64,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<RentalRow> for Rental {
    fn from(row: RentalRow) -> Self {
        let end_position = row
            .end_latitude
            .zip(row.end_longitude)
            .map(|(latitude, longitude)| {
                Position::new(Latitude::new(latitude), Longitude::new(longitude))
            });
        Rental::new(
            RentalId::new(row.id),
            UserId::new(row.user_id),
            BikeId::new(row.bike_id),
            StartedAt::new(row.start_time),
            Position::new(
                Latitude::new(row.start_latitude),
                Longitude::new(row.start_longitude),
            ),
            row.end_time.map(EndedAt::new),
            end_position,
            row.duration_minutes.map(DurationMinutes::new),
            RentalCost::new(row.cost),
            CreatedAt::new(row.created_at),
            UpdatedAt::new(row.updated_at),
        )
    }
}

/// Turns a hit on one of the open-rental indexes into the matching ledger error, and a dangling
/// user or bike reference into `NotFound`.
fn open_rental_conflict(error: sqlx::Error) -> Report<KernelError> {
    if violated_foreign_key(&error) {
        return Report::new(error)
            .change_context(KernelError::NotFound)
            .attach_printable("referenced user or bike not found");
    }
    let context = match violated_unique_index(&error) {
        Some(ONE_OPEN_PER_USER) => KernelError::UserAlreadyRenting,
        Some(ONE_OPEN_PER_BIKE) => KernelError::BikeNotAvailable,
        _ => KernelError::Internal,
    };
    Report::new(error).change_context(context)
}

pub(in crate::database) struct PgRentalInternal;

impl PgRentalInternal {
    async fn find_by_id(
        con: &mut PgConnection,
        id: &RentalId,
    ) -> error_stack::Result<Option<Rental>, KernelError> {
        let row = sqlx::query_as::<_, RentalRow>(
            // language=postgresql
            r#"
            SELECT id, user_id, bike_id, start_time, end_time, start_latitude, start_longitude,
                   end_latitude, end_longitude, duration_minutes, cost, created_at, updated_at
            FROM rentals
            WHERE id = $1
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(Rental::from))
    }

    async fn find_open_by_user_id(
        con: &mut PgConnection,
        user_id: &UserId,
    ) -> error_stack::Result<Option<Rental>, KernelError> {
        let row = sqlx::query_as::<_, RentalRow>(
            // language=postgresql
            r#"
            SELECT id, user_id, bike_id, start_time, end_time, start_latitude, start_longitude,
                   end_latitude, end_longitude, duration_minutes, cost, created_at, updated_at
            FROM rentals
            WHERE user_id = $1 AND end_time IS NULL
            ORDER BY start_time DESC
            LIMIT 1
            "#,
        )
        .bind(user_id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(Rental::from))
    }

    async fn find_open_by_bike_id(
        con: &mut PgConnection,
        bike_id: &BikeId,
    ) -> error_stack::Result<Option<Rental>, KernelError> {
        let row = sqlx::query_as::<_, RentalRow>(
            // language=postgresql
            r#"
            SELECT id, user_id, bike_id, start_time, end_time, start_latitude, start_longitude,
                   end_latitude, end_longitude, duration_minutes, cost, created_at, updated_at
            FROM rentals
            WHERE bike_id = $1 AND end_time IS NULL
            ORDER BY start_time DESC
            LIMIT 1
            "#,
        )
        .bind(bike_id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(Rental::from))
    }

    async fn find_by_user_id(
        con: &mut PgConnection,
        user_id: &UserId,
        page: &PageId,
    ) -> error_stack::Result<Vec<Rental>, KernelError> {
        let rows = sqlx::query_as::<_, RentalRow>(
            // language=postgresql
            r#"
            SELECT id, user_id, bike_id, start_time, end_time, start_latitude, start_longitude,
                   end_latitude, end_longitude, duration_minutes, cost, created_at, updated_at
            FROM rentals
            WHERE user_id = $1 AND id > $2
            ORDER BY id
            LIMIT $3
            "#,
        )
        .bind(user_id.as_ref())
        .bind(page.as_ref())
        .bind(PAGE_SIZE)
        .fetch_all(con)
        .await
        .convert_error()?;
        Ok(rows.into_iter().map(Rental::from).collect())
    }

    async fn find_all(
        con: &mut PgConnection,
        page: &PageId,
    ) -> error_stack::Result<Vec<Rental>, KernelError> {
        let rows = sqlx::query_as::<_, RentalRow>(
            // language=postgresql
            r#"
            SELECT id, user_id, bike_id, start_time, end_time, start_latitude, start_longitude,
                   end_latitude, end_longitude, duration_minutes, cost, created_at, updated_at
            FROM rentals
            WHERE id > $1
            ORDER BY id
            LIMIT $2
            "#,
        )
        .bind(page.as_ref())
        .bind(PAGE_SIZE)
        .fetch_all(con)
        .await
        .convert_error()?;
        Ok(rows.into_iter().map(Rental::from).collect())
    }

    async fn open(
        con: &mut PgConnection,
        rental: &NewRental,
    ) -> error_stack::Result<RentalId, KernelError> {
        let id = sqlx::query_scalar::<_, i64>(
            // language=postgresql
            r#"
            INSERT INTO rentals (user_id, bike_id, start_time, start_latitude, start_longitude, cost)
            VALUES ($1, $2, $3, $4, $5, 0)
            RETURNING id
            "#,
        )
        .bind(rental.user_id().as_ref())
        .bind(rental.bike_id().as_ref())
        .bind(rental.started_at().as_ref())
        .bind(rental.start_position().latitude().as_ref())
        .bind(rental.start_position().longitude().as_ref())
        .fetch_one(con)
        .await
        .map_err(open_rental_conflict)?;
        Ok(RentalId::new(id))
    }

    async fn close(
        con: &mut PgConnection,
        id: &RentalId,
        settlement: &Settlement,
    ) -> error_stack::Result<bool, KernelError> {
        // language=postgresql
        let result = sqlx::query(
            r#"
            UPDATE rentals
            SET end_time         = $2,
                end_latitude     = $3,
                end_longitude    = $4,
                duration_minutes = $5,
                cost             = $6,
                updated_at       = now()
            WHERE id = $1 AND end_time IS NULL
            "#,
        )
        .bind(id.as_ref())
        .bind(settlement.ended_at().as_ref())
        .bind(settlement.end_position().latitude().as_ref())
        .bind(settlement.end_position().longitude().as_ref())
        .bind(settlement.duration().as_ref())
        .bind(settlement.cost().as_ref())
        .execute(con)
        .await
        .convert_error()?;
        Ok(result.rows_affected() == 1)
    }

    async fn update(
        con: &mut PgConnection,
        id: &RentalId,
        patch: &RentalPatch,
    ) -> error_stack::Result<(), KernelError> {
        // language=postgresql
        let result = sqlx::query(
            r#"
            UPDATE rentals
            SET bike_id         = COALESCE($2, bike_id),
                user_id         = COALESCE($3, user_id),
                start_latitude  = COALESCE($4, start_latitude),
                start_longitude = COALESCE($5, start_longitude),
                updated_at      = now()
            WHERE id = $1
            "#,
        )
        .bind(id.as_ref())
        .bind(patch.bike_id().map(i64::from))
        .bind(patch.user_id().map(i64::from))
        .bind(patch.start_latitude().map(f64::from))
        .bind(patch.start_longitude().map(f64::from))
        .execute(con)
        .await
        .map_err(open_rental_conflict)?;
        if result.rows_affected() == 0 {
            return Err(Report::new(KernelError::NotFound)
                .attach_printable(format!("rental {} not found", id.as_ref())));
        }
        Ok(())
    }
}
