use error_stack::Report;
use sqlx::PgConnection;
use time::OffsetDateTime;

use kernel::interface::query::UserQuery;
use kernel::interface::update::{NewUser, UserModifier, UserPatch};
use kernel::prelude::entity::{
    CreatedAt, FirstName, LastName, PAGE_SIZE, PageId, PasswordHash, UpdatedAt, User, UserEmail,
    UserId,
};
use kernel::KernelError;

use crate::database::postgres::PostgresConnection;
use crate::error::{violated_unique_index, ConvertError};

#[derive(Clone, Default)]
pub struct PostgresUserRepository;

#[async_trait::async_trait]
impl UserQuery for PostgresUserRepository {
    type Transaction = PostgresConnection;

    async fn find_by_id(
        &self,
        con: &mut PostgresConnection,
        id: &UserId,
    ) -> error_stack::Result<Option<User>, KernelError> {
        PgUserInternal::find_by_id(con, id).await
    }

    async fn find_by_email(
        &self,
        con: &mut PostgresConnection,
        email: &UserEmail,
    ) -> error_stack::Result<Option<User>, KernelError> {
        PgUserInternal::find_by_email(con, email).await
    }

    async fn find_all(
        &self,
        con: &mut PostgresConnection,
        page: &PageId,
    ) -> error_stack::Result<Vec<User>, KernelError> {
        PgUserInternal::find_all(con, page).await
    }
}

#[async_trait::async_trait]
impl UserModifier for PostgresUserRepository {
    type Transaction = PostgresConnection;

    async fn create(
        &self,
        con: &mut PostgresConnection,
        user: &NewUser,
    ) -> error_stack::Result<UserId, KernelError> {
        PgUserInternal::create(con, user).await
    }

    async fn update(
        &self,
        con: &mut PostgresConnection,
        id: &UserId,
        patch: &UserPatch,
    ) -> error_stack::Result<(), KernelError> {
        PgUserInternal::update(con, id, patch).await
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    hashed_password: String,
    first_name: String,
    last_name: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User::new(
            UserId::new(row.id),
            UserEmail::new(row.email),
            PasswordHash::new(row.hashed_password),
            FirstName::new(row.first_name),
            LastName::new(row.last_name),
            CreatedAt::new(row.created_at),
            UpdatedAt::new(row.updated_at),
        )
    }
}

fn duplicate_email(error: sqlx::Error) -> Report<KernelError> {
    if violated_unique_index(&error).is_some() {
        return Report::new(error)
            .change_context(KernelError::Conflict)
            .attach_printable("Email already exists");
    }
    Report::new(error).change_context(KernelError::Internal)
}

pub(in crate::database) struct PgUserInternal;

impl PgUserInternal {
    async fn find_by_id(
        con: &mut PgConnection,
        id: &UserId,
    ) -> error_stack::Result<Option<User>, KernelError> {
        let row = sqlx::query_as::<_, UserRow>(
            // language=postgresql
            r#"
            SELECT id, email, hashed_password, first_name, last_name, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(User::from))
    }

    async fn find_by_email(
        con: &mut PgConnection,
        email: &UserEmail,
    ) -> error_stack::Result<Option<User>, KernelError> {
        let row = sqlx::query_as::<_, UserRow>(
            // language=postgresql
            r#"
            SELECT id, email, hashed_password, first_name, last_name, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(User::from))
    }

    async fn find_all(
        con: &mut PgConnection,
        page: &PageId,
    ) -> error_stack::Result<Vec<User>, KernelError> {
        let rows = sqlx::query_as::<_, UserRow>(
            // language=postgresql
            r#"
            SELECT id, email, hashed_password, first_name, last_name, created_at, updated_at
            FROM users
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
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn create(con: &mut PgConnection, user: &NewUser) -> error_stack::Result<UserId, KernelError> {
        let id = sqlx::query_scalar::<_, i64>(
            // language=postgresql
            r#"
            INSERT INTO users (email, hashed_password, first_name, last_name)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(user.email().as_ref())
        .bind(user.password().as_ref())
        .bind(user.first_name().as_ref())
        .bind(user.last_name().as_ref())
        .fetch_one(con)
        .await
        .map_err(duplicate_email)?;
        Ok(UserId::new(id))
    }

    async fn update(
        con: &mut PgConnection,
        id: &UserId,
        patch: &UserPatch,
    ) -> error_stack::Result<(), KernelError> {
        // language=postgresql
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email      = COALESCE($2, email),
                first_name = COALESCE($3, first_name),
                last_name  = COALESCE($4, last_name),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id.as_ref())
        .bind(patch.email().clone().map(String::from))
        .bind(patch.first_name().clone().map(String::from))
        .bind(patch.last_name().clone().map(String::from))
        .execute(con)
        .await
        .map_err(duplicate_email)?;
        if result.rows_affected() == 0 {
            return Err(Report::new(KernelError::NotFound)
                .attach_printable(format!("user {} not found", id.as_ref())));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use kernel::interface::database::DatabaseConnection;
    use kernel::interface::query::UserQuery;
    use kernel::interface::update::{NewUser, UserModifier, UserPatch};
    use kernel::prelude::entity::{FirstName, LastName, PasswordHash, UserEmail};
    use kernel::KernelError;

    use crate::database::postgres::test_support::database;
    use crate::database::postgres::PostgresUserRepository;

    #[test_with::env(POSTGRES_TEST)]
    #[tokio::test]
    async fn create_find_update() -> error_stack::Result<(), KernelError> {
        let db = database().await?;
        let mut con = db.transact().await?;

        let email = UserEmail::new(format!("user-{}@example.com", rand::random::<u32>()));
        let user = NewUser::new(
            email.clone(),
            PasswordHash::new("hash"),
            FirstName::new("Ada"),
            LastName::new("Lovelace"),
        );
        let id = PostgresUserRepository.create(&mut con, &user).await?;

        let found = PostgresUserRepository
            .find_by_email(&mut con, &email)
            .await?
            .expect("user exists");
        assert_eq!(found.id(), &id);
        assert_eq!(found.first_name(), &FirstName::new("Ada"));

        let patch = UserPatch::new(None, Some(FirstName::new("Augusta")), None);
        PostgresUserRepository.update(&mut con, &id, &patch).await?;
        let found = PostgresUserRepository
            .find_by_id(&mut con, &id)
            .await?
            .expect("user exists");
        assert_eq!(found.first_name(), &FirstName::new("Augusta"));
        assert_eq!(found.last_name(), &LastName::new("Lovelace"));

        let error = PostgresUserRepository
            .create(&mut con, &user)
            .await
            .unwrap_err();
        assert_eq!(error.current_context(), &KernelError::Conflict);
        Ok(())
    }
}
