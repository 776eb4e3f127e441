use std::ops::Deref;
use std::sync::Arc;

use driver::config::AdminCredentials;
use driver::database::postgres::{
    PostgresBikeRepository, PostgresDatabase, PostgresRentalRepository, PostgresUserRepository,
};
use driver::identity::{BcryptPasswordHasher, JwtTokenAuthority};
use kernel::interface::database::DependOnDatabaseConnection;
use kernel::interface::identity::{DependOnPasswordHasher, DependOnTokenAuthority};
use kernel::interface::query::{DependOnBikeQuery, DependOnRentalQuery, DependOnUserQuery};
use kernel::interface::update::{DependOnBikeModifier, DependOnRentalModifier, DependOnUserModifier};
use kernel::KernelError;
use vodca::References;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppModule(Arc<Handler>);

impl AppModule {
    pub fn new(handler: Handler) -> Self {
        Self(Arc::new(handler))
    }
}

impl Deref for AppModule {
    type Target = Handler;
    fn deref(&self) -> &Self::Target {
        Deref::deref(&self.0)
    }
}

#[derive(References)]
pub struct Handler {
    pgpool: PostgresDatabase,
    bikes: PostgresBikeRepository,
    rentals: PostgresRentalRepository,
    users: PostgresUserRepository,
    hasher: BcryptPasswordHasher,
    tokens: JwtTokenAuthority,
    admin: AdminCredentials,
}

impl Handler {
    pub fn new(pgpool: PostgresDatabase, config: &AppConfig) -> Self {
        Self {
            pgpool,
            bikes: PostgresBikeRepository,
            rentals: PostgresRentalRepository,
            users: PostgresUserRepository,
            hasher: BcryptPasswordHasher::default(),
            tokens: JwtTokenAuthority::new(config.jwt()),
            admin: config.admin().clone(),
        }
    }

    pub async fn init(config: &AppConfig) -> error_stack::Result<Self, KernelError> {
        let pgpool = PostgresDatabase::new(config.postgres()).await?;
        Ok(Self::new(pgpool, config))
    }
}

impl DependOnDatabaseConnection for Handler {
    type DatabaseConnection = PostgresDatabase;
    fn database_connection(&self) -> &Self::DatabaseConnection {
        &self.pgpool
    }
}

impl DependOnBikeQuery for Handler {
    type BikeQuery = PostgresBikeRepository;
    fn bike_query(&self) -> &Self::BikeQuery {
        &self.bikes
    }
}

impl DependOnBikeModifier for Handler {
    type BikeModifier = PostgresBikeRepository;
    fn bike_modifier(&self) -> &Self::BikeModifier {
        &self.bikes
    }
}

impl DependOnRentalQuery for Handler {
    type RentalQuery = PostgresRentalRepository;
    fn rental_query(&self) -> &Self::RentalQuery {
        &self.rentals
    }
}

impl DependOnRentalModifier for Handler {
    type RentalModifier = PostgresRentalRepository;
    fn rental_modifier(&self) -> &Self::RentalModifier {
        &self.rentals
    }
}

impl DependOnUserQuery for Handler {
    type UserQuery = PostgresUserRepository;
    fn user_query(&self) -> &Self::UserQuery {
        &self.users
    }
}

impl DependOnUserModifier for Handler {
    type UserModifier = PostgresUserRepository;
    fn user_modifier(&self) -> &Self::UserModifier {
        &self.users
    }
}

impl DependOnPasswordHasher for Handler {
    type PasswordHasher = BcryptPasswordHasher;
    fn password_hasher(&self) -> &Self::PasswordHasher {
        &self.hasher
    }
}

impl DependOnTokenAuthority for Handler {
    type TokenAuthority = JwtTokenAuthority;
    fn token_authority(&self) -> &Self::TokenAuthority {
        &self.tokens
    }
}
