use std::ops::{Deref, DerefMut};
use std::time::Duration;

use error_stack::{Report, ResultExt};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, Pool, Postgres};

use kernel::interface::database::{DatabaseConnection, Transaction};
use kernel::KernelError;

use crate::config::PostgresConfig;
use crate::error::ConvertError;

pub use self::{bike::*, rental::*, user::*};

mod bike;
mod rental;
mod user;

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Clone)]
pub struct PostgresDatabase {
    pool: Pool<Postgres>,
}

impl PostgresDatabase {
    pub async fn new(config: &PostgresConfig) -> error_stack::Result<Self, KernelError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections())
            .acquire_timeout(config.acquire_timeout())
            .connect(config.url())
            .await
            .convert_error()?;
        Ok(Self { pool })
    }

    /// Builds the pool without opening a connection. The first query connects.
    pub fn connect_lazy(config: &PostgresConfig) -> error_stack::Result<Self, KernelError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections())
            .acquire_timeout(config.acquire_timeout())
            .connect_lazy(config.url())
            .convert_error()?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> error_stack::Result<(), KernelError> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .change_context_lazy(|| KernelError::Internal)
            .attach_printable("failed to apply migrations")
    }
}

#[async_trait::async_trait]
impl DatabaseConnection for PostgresDatabase {
    type Transaction = PostgresConnection;

    async fn transact(&self) -> error_stack::Result<PostgresConnection, KernelError> {
        let con = self.pool.begin().await.convert_error()?;
        Ok(PostgresConnection(con))
    }

    async fn health(&self) -> error_stack::Result<(), KernelError> {
        let ping = sqlx::query("SELECT 1").execute(&self.pool);
        match tokio::time::timeout(HEALTH_CHECK_TIMEOUT, ping).await {
            Ok(result) => result.map(|_| ()).convert_error(),
            Err(elapsed) => Err(Report::new(elapsed).change_context(KernelError::Timeout)),
        }
    }
}

/// An open database transaction. Dropping it without [`Transaction::commit`] rolls back.
pub struct PostgresConnection(sqlx::Transaction<'static, Postgres>);

#[async_trait::async_trait]
impl Transaction for PostgresConnection {
    async fn commit(self) -> error_stack::Result<(), KernelError> {
        self.0.commit().await.convert_error()
    }

    async fn roll_back(self) -> error_stack::Result<(), KernelError> {
        self.0.rollback().await.convert_error()
    }
}

impl Deref for PostgresConnection {
    type Target = PgConnection;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for PostgresConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[cfg(test)]
pub(in crate::database) mod test_support {
    use error_stack::ResultExt;
    use kernel::KernelError;

    use crate::config::PostgresConfig;
    use crate::database::postgres::PostgresDatabase;

    pub async fn database() -> error_stack::Result<PostgresDatabase, KernelError> {
        let config = PostgresConfig::from_env()?;
        let db = PostgresDatabase::new(&config)
            .await
            .change_context_lazy(|| KernelError::Internal)?;
        db.migrate().await?;
        Ok(db)
    }
}
