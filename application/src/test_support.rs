use std::collections::BTreeMap;
use std::sync::Arc;

use error_stack::Report;
use time::{Duration, OffsetDateTime};
use tokio::sync::{Mutex, OwnedMutexGuard};

use kernel::interface::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use kernel::interface::identity::{
    DependOnPasswordHasher, DependOnTokenAuthority, PasswordHasher, TokenAuthority,
};
use kernel::interface::query::{
    BikeQuery, DependOnBikeQuery, DependOnRentalQuery, DependOnUserQuery, RentalQuery, UserQuery,
};
use kernel::interface::update::{
    BikeModifier, BikePatch, DependOnBikeModifier, DependOnRentalModifier, DependOnUserModifier,
    NewBike, NewRental, NewUser, RentalModifier, RentalPatch, UserModifier, UserPatch,
};
use kernel::prelude::entity::{
    AccessToken, Bike, BikeAvailability, BikeId, CreatedAt, DurationMinutes, EndedAt, FirstName,
    LastName, Latitude, Longitude, PageId, PasswordHash, Position, PricePerMinute, RawPassword,
    Rental, RentalCost, RentalId, Settlement, StartedAt, UpdatedAt, User, UserEmail, UserId,
    PAGE_SIZE,
};
use kernel::KernelError;

#[derive(Debug, Clone)]
struct BikeRow {
    available: bool,
    price: f64,
    latitude: f64,
    longitude: f64,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
struct RentalRow {
    user_id: i64,
    bike_id: i64,
    start_time: OffsetDateTime,
    end_time: Option<OffsetDateTime>,
    start_latitude: f64,
    start_longitude: f64,
    end_latitude: Option<f64>,
    end_longitude: Option<f64>,
    duration: Option<i64>,
    cost: f64,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
struct UserRow {
    email: String,
    password: String,
    first_name: String,
    last_name: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct Tables {
    bikes: BTreeMap<i64, BikeRow>,
    rentals: BTreeMap<i64, RentalRow>,
    users: BTreeMap<i64, UserRow>,
}

fn next_id<V>(table: &BTreeMap<i64, V>) -> i64 {
    table.keys().next_back().map_or(1, |last| last + 1)
}

fn page<V: Clone>(
    table: &BTreeMap<i64, V>,
    page: &PageId,
    filter: impl Fn(&V) -> bool,
) -> Vec<(i64, V)> {
    table
        .range(i64::from(*page) + 1..)
        .filter(|(_, row)| filter(row))
        .take(PAGE_SIZE as usize)
        .map(|(id, row)| (*id, row.clone()))
        .collect()
}

fn bike_of(id: i64, row: BikeRow) -> Bike {
    Bike::new(
        BikeId::new(id),
        BikeAvailability::new(row.available),
        PricePerMinute::new(row.price),
        Position::new(Latitude::new(row.latitude), Longitude::new(row.longitude)),
        CreatedAt::new(row.created_at),
        UpdatedAt::new(row.updated_at),
    )
}

fn rental_of(id: i64, row: RentalRow) -> Rental {
    let end_position = match (row.end_latitude, row.end_longitude) {
        (Some(latitude), Some(longitude)) => Some(Position::new(
            Latitude::new(latitude),
            Longitude::new(longitude),
        )),
        _ => None,
    };
    Rental::new(
        RentalId::new(id),
        UserId::new(row.user_id),
        BikeId::new(row.bike_id),
        StartedAt::new(row.start_time),
        Position::new(
            Latitude::new(row.start_latitude),
            Longitude::new(row.start_longitude),
        ),
        row.end_time.map(EndedAt::new),
        end_position,
        row.duration.map(DurationMinutes::new),
        RentalCost::new(row.cost),
        CreatedAt::new(row.created_at),
        UpdatedAt::new(row.updated_at),
    )
}

fn user_of(id: i64, row: UserRow) -> User {
    User::new(
        UserId::new(id),
        UserEmail::new(row.email),
        PasswordHash::new(row.password),
        FirstName::new(row.first_name),
        LastName::new(row.last_name),
        CreatedAt::new(row.created_at),
        UpdatedAt::new(row.updated_at),
    )
}

/// Serializes transactions behind one lock. Interleavings across real connections are covered
/// by the Postgres tests in the driver.
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryDatabase {
    /// Moves the start of a rental into the past.
    pub async fn backdate_rental(&self, id: i64, by: Duration) {
        let mut tables = self.tables.lock().await;
        if let Some(row) = tables.rentals.get_mut(&id) {
            row.start_time -= by;
        }
    }

    pub async fn open_rentals_of_bike(&self, bike_id: i64) -> usize {
        let tables = self.tables.lock().await;
        tables
            .rentals
            .values()
            .filter(|row| row.bike_id == bike_id && row.end_time.is_none())
            .count()
    }

    pub async fn rental_count(&self) -> usize {
        self.tables.lock().await.rentals.len()
    }
}

pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait::async_trait]
impl DatabaseConnection for InMemoryDatabase {
    type Transaction = InMemoryTransaction;

    async fn transact(&self) -> error_stack::Result<InMemoryTransaction, KernelError> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(InMemoryTransaction { guard, working })
    }

    async fn health(&self) -> error_stack::Result<(), KernelError> {
        Ok(())
    }
}

#[async_trait::async_trait]
impl Transaction for InMemoryTransaction {
    async fn commit(self) -> error_stack::Result<(), KernelError> {
        let InMemoryTransaction { mut guard, working } = self;
        *guard = working;
        Ok(())
    }

    async fn roll_back(self) -> error_stack::Result<(), KernelError> {
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryRepository;

#[async_trait::async_trait]
impl BikeQuery for InMemoryRepository {
    type Transaction = InMemoryTransaction;

    async fn find_by_id(
        &self,
        con: &mut InMemoryTransaction,
        id: &BikeId,
    ) -> error_stack::Result<Option<Bike>, KernelError> {
        let id = *id.as_ref();
        Ok(con.working.bikes.get(&id).cloned().map(|row| bike_of(id, row)))
    }

    async fn find_availability(
        &self,
        con: &mut InMemoryTransaction,
        id: &BikeId,
    ) -> error_stack::Result<Option<BikeAvailability>, KernelError> {
        Ok(con
            .working
            .bikes
            .get(id.as_ref())
            .map(|row| BikeAvailability::new(row.available)))
    }

    async fn find_price(
        &self,
        con: &mut InMemoryTransaction,
        id: &BikeId,
    ) -> error_stack::Result<Option<PricePerMinute>, KernelError> {
        Ok(con
            .working
            .bikes
            .get(id.as_ref())
            .map(|row| PricePerMinute::new(row.price)))
    }

    async fn find_all(
        &self,
        con: &mut InMemoryTransaction,
        page_id: &PageId,
    ) -> error_stack::Result<Vec<Bike>, KernelError> {
        Ok(page(&con.working.bikes, page_id, |_| true)
            .into_iter()
            .map(|(id, row)| bike_of(id, row))
            .collect())
    }

    async fn find_available(
        &self,
        con: &mut InMemoryTransaction,
        page_id: &PageId,
    ) -> error_stack::Result<Vec<Bike>, KernelError> {
        Ok(page(&con.working.bikes, page_id, |row| row.available)
            .into_iter()
            .map(|(id, row)| bike_of(id, row))
            .collect())
    }
}

#[async_trait::async_trait]
impl BikeModifier for InMemoryRepository {
    type Transaction = InMemoryTransaction;

    async fn create(
        &self,
        con: &mut InMemoryTransaction,
        bike: &NewBike,
    ) -> error_stack::Result<BikeId, KernelError> {
        let id = next_id(&con.working.bikes);
        let now = OffsetDateTime::now_utc();
        con.working.bikes.insert(
            id,
            BikeRow {
                available: true,
                price: (*bike.price()).into(),
                latitude: (*bike.position().latitude()).into(),
                longitude: (*bike.position().longitude()).into(),
                created_at: now,
                updated_at: now,
            },
        );
        Ok(BikeId::new(id))
    }

    async fn update(
        &self,
        con: &mut InMemoryTransaction,
        id: &BikeId,
        patch: &BikePatch,
    ) -> error_stack::Result<(), KernelError> {
        let row = con
            .working
            .bikes
            .get_mut(id.as_ref())
            .ok_or_else(|| Report::new(KernelError::NotFound))?;
        if let Some(availability) = patch.availability() {
            row.available = availability.is_available();
        }
        if let Some(price) = patch.price() {
            row.price = (*price).into();
        }
        if let Some(latitude) = patch.latitude() {
            row.latitude = (*latitude).into();
        }
        if let Some(longitude) = patch.longitude() {
            row.longitude = (*longitude).into();
        }
        row.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }

    async fn set_availability(
        &self,
        con: &mut InMemoryTransaction,
        id: &BikeId,
        availability: BikeAvailability,
    ) -> error_stack::Result<(), KernelError> {
        let row = con
            .working
            .bikes
            .get_mut(id.as_ref())
            .ok_or_else(|| Report::new(KernelError::NotFound))?;
        row.available = availability.is_available();
        row.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }

    async fn compare_and_set_availability(
        &self,
        con: &mut InMemoryTransaction,
        id: &BikeId,
        expected: BikeAvailability,
        next: BikeAvailability,
    ) -> error_stack::Result<bool, KernelError> {
        match con.working.bikes.get_mut(id.as_ref()) {
            Some(row) if row.available == expected.is_available() => {
                row.available = next.is_available();
                row.updated_at = OffsetDateTime::now_utc();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

fn open_rental_by(
    tables: &Tables,
    matches: impl Fn(&RentalRow) -> bool,
) -> Option<(i64, RentalRow)> {
    tables
        .rentals
        .iter()
        .rev()
        .find(|(_, row)| row.end_time.is_none() && matches(row))
        .map(|(id, row)| (*id, row.clone()))
}

#[async_trait::async_trait]
impl RentalQuery for InMemoryRepository {
    type Transaction = InMemoryTransaction;

    async fn find_by_id(
        &self,
        con: &mut InMemoryTransaction,
        id: &RentalId,
    ) -> error_stack::Result<Option<Rental>, KernelError> {
        let id = *id.as_ref();
        Ok(con
            .working
            .rentals
            .get(&id)
            .cloned()
            .map(|row| rental_of(id, row)))
    }

    async fn find_open_by_user_id(
        &self,
        con: &mut InMemoryTransaction,
        user_id: &UserId,
    ) -> error_stack::Result<Option<Rental>, KernelError> {
        let user_id = *user_id.as_ref();
        Ok(open_rental_by(&con.working, |row| row.user_id == user_id)
            .map(|(id, row)| rental_of(id, row)))
    }

    async fn find_open_by_bike_id(
        &self,
        con: &mut InMemoryTransaction,
        bike_id: &BikeId,
    ) -> error_stack::Result<Option<Rental>, KernelError> {
        let bike_id = *bike_id.as_ref();
        Ok(open_rental_by(&con.working, |row| row.bike_id == bike_id)
            .map(|(id, row)| rental_of(id, row)))
    }

    async fn find_by_user_id(
        &self,
        con: &mut InMemoryTransaction,
        user_id: &UserId,
        page_id: &PageId,
    ) -> error_stack::Result<Vec<Rental>, KernelError> {
        let user_id = *user_id.as_ref();
        Ok(page(&con.working.rentals, page_id, |row| row.user_id == user_id)
            .into_iter()
            .map(|(id, row)| rental_of(id, row))
            .collect())
    }

    async fn find_all(
        &self,
        con: &mut InMemoryTransaction,
        page_id: &PageId,
    ) -> error_stack::Result<Vec<Rental>, KernelError> {
        Ok(page(&con.working.rentals, page_id, |_| true)
            .into_iter()
            .map(|(id, row)| rental_of(id, row))
            .collect())
    }
}

/// Mirrors the partial unique indexes on open rentals.
fn check_open_uniqueness(
    tables: &Tables,
    skip: Option<i64>,
    user_id: i64,
    bike_id: i64,
) -> error_stack::Result<(), KernelError> {
    let others = tables
        .rentals
        .iter()
        .filter(|(id, row)| Some(**id) != skip && row.end_time.is_none());
    for (_, row) in others {
        if row.user_id == user_id {
            return Err(Report::new(KernelError::UserAlreadyRenting));
        }
        if row.bike_id == bike_id {
            return Err(Report::new(KernelError::BikeNotAvailable));
        }
    }
    Ok(())
}

#[async_trait::async_trait]
impl RentalModifier for InMemoryRepository {
    type Transaction = InMemoryTransaction;

    async fn open(
        &self,
        con: &mut InMemoryTransaction,
        rental: &NewRental,
    ) -> error_stack::Result<RentalId, KernelError> {
        let user_id = *rental.user_id().as_ref();
        let bike_id = *rental.bike_id().as_ref();
        check_open_uniqueness(&con.working, None, user_id, bike_id)?;

        let id = next_id(&con.working.rentals);
        let now = OffsetDateTime::now_utc();
        con.working.rentals.insert(
            id,
            RentalRow {
                user_id,
                bike_id,
                start_time: (*rental.started_at()).into(),
                end_time: None,
                start_latitude: (*rental.start_position().latitude()).into(),
                start_longitude: (*rental.start_position().longitude()).into(),
                end_latitude: None,
                end_longitude: None,
                duration: None,
                cost: 0.0,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(RentalId::new(id))
    }

    async fn close(
        &self,
        con: &mut InMemoryTransaction,
        id: &RentalId,
        settlement: &Settlement,
    ) -> error_stack::Result<bool, KernelError> {
        let row = match con.working.rentals.get_mut(id.as_ref()) {
            Some(row) if row.end_time.is_none() => row,
            _ => return Ok(false),
        };
        row.end_time = Some((*settlement.ended_at()).into());
        row.end_latitude = Some((*settlement.end_position().latitude()).into());
        row.end_longitude = Some((*settlement.end_position().longitude()).into());
        row.duration = Some((*settlement.duration()).into());
        row.cost = (*settlement.cost()).into();
        row.updated_at = OffsetDateTime::now_utc();
        Ok(true)
    }

    async fn update(
        &self,
        con: &mut InMemoryTransaction,
        id: &RentalId,
        patch: &RentalPatch,
    ) -> error_stack::Result<(), KernelError> {
        let id = *id.as_ref();
        let mut row = con
            .working
            .rentals
            .get(&id)
            .cloned()
            .ok_or_else(|| Report::new(KernelError::NotFound))?;
        if let Some(bike_id) = patch.bike_id() {
            row.bike_id = (*bike_id).into();
        }
        if let Some(user_id) = patch.user_id() {
            row.user_id = (*user_id).into();
        }
        if let Some(latitude) = patch.start_latitude() {
            row.start_latitude = (*latitude).into();
        }
        if let Some(longitude) = patch.start_longitude() {
            row.start_longitude = (*longitude).into();
        }
        if row.end_time.is_none() {
            check_open_uniqueness(&con.working, Some(id), row.user_id, row.bike_id)?;
        }
        row.updated_at = OffsetDateTime::now_utc();
        con.working.rentals.insert(id, row);
        Ok(())
    }
}

#[async_trait::async_trait]
impl UserQuery for InMemoryRepository {
    type Transaction = InMemoryTransaction;

    async fn find_by_id(
        &self,
        con: &mut InMemoryTransaction,
        id: &UserId,
    ) -> error_stack::Result<Option<User>, KernelError> {
        let id = *id.as_ref();
        Ok(con.working.users.get(&id).cloned().map(|row| user_of(id, row)))
    }

    async fn find_by_email(
        &self,
        con: &mut InMemoryTransaction,
        email: &UserEmail,
    ) -> error_stack::Result<Option<User>, KernelError> {
        let email: &String = email.as_ref();
        Ok(con
            .working
            .users
            .iter()
            .find(|(_, row)| row.email == *email)
            .map(|(id, row)| user_of(*id, row.clone())))
    }

    async fn find_all(
        &self,
        con: &mut InMemoryTransaction,
        page_id: &PageId,
    ) -> error_stack::Result<Vec<User>, KernelError> {
        Ok(page(&con.working.users, page_id, |_| true)
            .into_iter()
            .map(|(id, row)| user_of(id, row))
            .collect())
    }
}

#[async_trait::async_trait]
impl UserModifier for InMemoryRepository {
    type Transaction = InMemoryTransaction;

    async fn create(
        &self,
        con: &mut InMemoryTransaction,
        user: &NewUser,
    ) -> error_stack::Result<UserId, KernelError> {
        let email: &String = user.email().as_ref();
        if con.working.users.values().any(|row| row.email == *email) {
            return Err(Report::new(KernelError::Conflict));
        }
        let id = next_id(&con.working.users);
        let now = OffsetDateTime::now_utc();
        con.working.users.insert(
            id,
            UserRow {
                email: email.clone(),
                password: user.password().clone().into(),
                first_name: user.first_name().as_ref().to_string(),
                last_name: user.last_name().as_ref().to_string(),
                created_at: now,
                updated_at: now,
            },
        );
        Ok(UserId::new(id))
    }

    async fn update(
        &self,
        con: &mut InMemoryTransaction,
        id: &UserId,
        patch: &UserPatch,
    ) -> error_stack::Result<(), KernelError> {
        let row = con
            .working
            .users
            .get_mut(id.as_ref())
            .ok_or_else(|| Report::new(KernelError::NotFound))?;
        if let Some(email) = patch.email() {
            row.email = email.as_ref().to_string();
        }
        if let Some(first_name) = patch.first_name() {
            row.first_name = first_name.as_ref().to_string();
        }
        if let Some(last_name) = patch.last_name() {
            row.last_name = last_name.as_ref().to_string();
        }
        row.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }
}

/// Reversible "hash" so tests stay fast.
#[derive(Clone, Default)]
pub struct PlainPasswordHasher;

#[async_trait::async_trait]
impl PasswordHasher for PlainPasswordHasher {
    async fn hash(
        &self,
        password: &RawPassword,
    ) -> error_stack::Result<PasswordHash, KernelError> {
        let password: &String = password.as_ref();
        Ok(PasswordHash::new(format!("plain${password}")))
    }

    async fn verify(
        &self,
        password: &RawPassword,
        hash: &PasswordHash,
    ) -> error_stack::Result<bool, KernelError> {
        Ok(self.hash(password).await? == *hash)
    }
}

#[derive(Clone, Default)]
pub struct FakeTokenAuthority;

impl TokenAuthority for FakeTokenAuthority {
    fn issue(&self, user: &User) -> error_stack::Result<AccessToken, KernelError> {
        Ok(AccessToken::new(format!("token-{}", user.id().as_ref())))
    }

    fn verify(&self, token: &str) -> error_stack::Result<UserId, KernelError> {
        token
            .strip_prefix("token-")
            .and_then(|id| id.parse::<i64>().ok())
            .map(UserId::new)
            .ok_or_else(|| Report::new(KernelError::Unauthorized))
    }
}

#[derive(Clone, Default)]
pub struct TestModule {
    database: InMemoryDatabase,
    repository: InMemoryRepository,
    hasher: PlainPasswordHasher,
    tokens: FakeTokenAuthority,
}

impl TestModule {
    pub fn database(&self) -> &InMemoryDatabase {
        &self.database
    }

    /// Inserts an available bike directly, bypassing the services.
    pub async fn seed_bike(&self, price: f64, latitude: f64, longitude: f64) -> i64 {
        let mut con = self.database.tables.lock().await;
        let id = next_id(&con.bikes);
        let now = OffsetDateTime::now_utc();
        con.bikes.insert(
            id,
            BikeRow {
                available: true,
                price,
                latitude,
                longitude,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    pub async fn seed_user(&self, email: &str) -> i64 {
        let mut con = self.database.tables.lock().await;
        let id = next_id(&con.users);
        let now = OffsetDateTime::now_utc();
        con.users.insert(
            id,
            UserRow {
                email: email.to_string(),
                password: "plain$password".to_string(),
                first_name: "Test".to_string(),
                last_name: "Rider".to_string(),
                created_at: now,
                updated_at: now,
            },
        );
        id
    }
}

impl DependOnDatabaseConnection for TestModule {
    type DatabaseConnection = InMemoryDatabase;
    fn database_connection(&self) -> &Self::DatabaseConnection {
        &self.database
    }
}

impl DependOnBikeQuery for TestModule {
    type BikeQuery = InMemoryRepository;
    fn bike_query(&self) -> &Self::BikeQuery {
        &self.repository
    }
}

impl DependOnBikeModifier for TestModule {
    type BikeModifier = InMemoryRepository;
    fn bike_modifier(&self) -> &Self::BikeModifier {
        &self.repository
    }
}

impl DependOnRentalQuery for TestModule {
    type RentalQuery = InMemoryRepository;
    fn rental_query(&self) -> &Self::RentalQuery {
        &self.repository
    }
}

impl DependOnRentalModifier for TestModule {
    type RentalModifier = InMemoryRepository;
    fn rental_modifier(&self) -> &Self::RentalModifier {
        &self.repository
    }
}

impl DependOnUserQuery for TestModule {
    type UserQuery = InMemoryRepository;
    fn user_query(&self) -> &Self::UserQuery {
        &self.repository
    }
}

impl DependOnUserModifier for TestModule {
    type UserModifier = InMemoryRepository;
    fn user_modifier(&self) -> &Self::UserModifier {
        &self.repository
    }
}

impl DependOnPasswordHasher for TestModule {
    type PasswordHasher = PlainPasswordHasher;
    fn password_hasher(&self) -> &Self::PasswordHasher {
        &self.hasher
    }
}

impl DependOnTokenAuthority for TestModule {
    type TokenAuthority = FakeTokenAuthority;
    fn token_authority(&self) -> &Self::TokenAuthority {
        &self.tokens
    }
}
