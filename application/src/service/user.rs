use error_stack::Report;

use kernel::interface::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use kernel::interface::identity::{
    DependOnPasswordHasher, DependOnTokenAuthority, PasswordHasher, TokenAuthority,
};
use kernel::interface::query::{DependOnUserQuery, UserQuery};
use kernel::interface::update::{DependOnUserModifier, NewUser, UserModifier, UserPatch};
use kernel::prelude::entity::{
    FirstName, LastName, Page, PageId, RawPassword, UserEmail, UserId,
};
use kernel::KernelError;

use crate::transfer::{
    GetPageDto, GetUserDto, LoginDto, PageDto, RegisterUserDto, SeedAdminDto, UpdateUserDto,
    UserDto,
};

const INVALID_LOGIN: &str = "Invalid username or password.";

fn user_not_found(id: &UserId) -> Report<KernelError> {
    Report::new(KernelError::NotFound).attach_printable(format!("user {} not found", id.as_ref()))
}

fn email_taken() -> Report<KernelError> {
    Report::new(KernelError::Conflict).attach_printable("Email already exists")
}

#[async_trait::async_trait]
pub trait RegisterUserService:
    'static
    + Sync
    + Send
    + DependOnDatabaseConnection
    + DependOnUserQuery
    + DependOnUserModifier
    + DependOnPasswordHasher
{
    async fn register_user(&self, dto: RegisterUserDto) -> error_stack::Result<i64, KernelError> {
        let email = UserEmail::try_new(dto.email)?;
        let password = RawPassword::try_new(dto.password)?;
        let first_name = FirstName::try_new(dto.first_name)?;
        let last_name = LastName::try_new(dto.last_name)?;

        let mut connection = self.database_connection().transact().await?;
        if self
            .user_query()
            .find_by_email(&mut connection, &email)
            .await?
            .is_some()
        {
            return Err(email_taken());
        }

        let hash = self.password_hasher().hash(&password).await?;
        let user = NewUser::new(email, hash, first_name, last_name);
        let id = self.user_modifier().create(&mut connection, &user).await?;
        connection.commit().await?;

        tracing::info!(user_id = id.as_ref(), "user registered");
        Ok(id.into())
    }
}

impl<T> RegisterUserService for T where
    T: DependOnDatabaseConnection + DependOnUserQuery + DependOnUserModifier + DependOnPasswordHasher
{
}

#[async_trait::async_trait]
pub trait AuthenticateUserService:
    'static
    + Sync
    + Send
    + DependOnDatabaseConnection
    + DependOnUserQuery
    + DependOnPasswordHasher
    + DependOnTokenAuthority
{
    /// Exchanges credentials for a bearer token.
    ///
    /// Unknown email, wrong password and malformed input all fail the same way.
    async fn login(&self, dto: LoginDto) -> error_stack::Result<String, KernelError> {
        let invalid = || Report::new(KernelError::Unauthorized).attach_printable(INVALID_LOGIN);

        let email = UserEmail::try_new(dto.email).map_err(|_| invalid())?;
        let password = RawPassword::new(dto.password);

        let mut connection = self.database_connection().transact().await?;
        let user = self
            .user_query()
            .find_by_email(&mut connection, &email)
            .await?
            .ok_or_else(invalid)?;
        connection.roll_back().await?;

        let matches = self
            .password_hasher()
            .verify(&password, user.password())
            .await
            .map_err(|report| report.change_context(KernelError::Unauthorized))?;
        if !matches {
            return Err(invalid());
        }

        let token = self.token_authority().issue(&user)?;
        tracing::debug!(user_id = user.id().as_ref(), "token issued");
        Ok(token.into())
    }

    /// Resolves a bearer token to the id of an existing user.
    async fn authenticate(&self, token: &str) -> error_stack::Result<UserId, KernelError> {
        let id = self.token_authority().verify(token)?;
        let mut connection = self.database_connection().transact().await?;
        self.user_query()
            .find_by_id(&mut connection, &id)
            .await?
            .ok_or_else(|| {
                Report::new(KernelError::Unauthorized)
                    .attach_printable(format!("token subject {} no longer exists", id.as_ref()))
            })?;
        Ok(id)
    }
}

impl<T> AuthenticateUserService for T where
    T: DependOnDatabaseConnection + DependOnUserQuery + DependOnPasswordHasher + DependOnTokenAuthority
{
}

#[async_trait::async_trait]
pub trait GetUserService: 'static + Sync + Send + DependOnDatabaseConnection + DependOnUserQuery {
    async fn get_user(&self, dto: GetUserDto) -> error_stack::Result<UserDto, KernelError> {
        let mut connection = self.database_connection().transact().await?;
        let id = UserId::new(dto.id);
        let user = self
            .user_query()
            .find_by_id(&mut connection, &id)
            .await?
            .ok_or_else(|| user_not_found(&id))?;
        Ok(UserDto::from(user))
    }

    async fn get_all_users(
        &self,
        dto: GetPageDto,
    ) -> error_stack::Result<PageDto<UserDto>, KernelError> {
        let mut connection = self.database_connection().transact().await?;
        let users = self
            .user_query()
            .find_all(&mut connection, &PageId::new(dto.page_id))
            .await?;
        Ok(PageDto::from(Page::from_rows(users, |user| (*user.id()).into())))
    }
}

impl<T> GetUserService for T where T: DependOnDatabaseConnection + DependOnUserQuery {}

#[async_trait::async_trait]
pub trait UpdateUserService:
    'static + Sync + Send + DependOnDatabaseConnection + DependOnUserQuery + DependOnUserModifier
{
    async fn update_user(&self, dto: UpdateUserDto) -> error_stack::Result<UserDto, KernelError> {
        let id = UserId::new(dto.id);
        let email = dto.email.map(UserEmail::try_new).transpose()?;
        let first_name = dto.first_name.map(FirstName::try_new).transpose()?;
        let last_name = dto.last_name.map(LastName::try_new).transpose()?;

        let mut connection = self.database_connection().transact().await?;
        let user = self
            .user_query()
            .find_by_id(&mut connection, &id)
            .await?
            .ok_or_else(|| user_not_found(&id))?;

        let patch = UserPatch::new(
            email.filter(|email| email != user.email()),
            first_name.filter(|first_name| first_name != user.first_name()),
            last_name.filter(|last_name| last_name != user.last_name()),
        );
        if patch.is_empty() {
            return Err(
                Report::new(KernelError::Validation).attach_printable("No fields to update")
            );
        }
        if let Some(email) = patch.email() {
            if self
                .user_query()
                .find_by_email(&mut connection, email)
                .await?
                .is_some()
            {
                return Err(email_taken());
            }
        }

        self.user_modifier()
            .update(&mut connection, &id, &patch)
            .await?;
        let updated = self
            .user_query()
            .find_by_id(&mut connection, &id)
            .await?
            .ok_or_else(|| user_not_found(&id))?;
        connection.commit().await?;

        tracing::info!(user_id = id.as_ref(), "user updated");
        Ok(UserDto::from(updated))
    }
}

impl<T> UpdateUserService for T where
    T: DependOnDatabaseConnection + DependOnUserQuery + DependOnUserModifier
{
}

#[async_trait::async_trait]
pub trait SeedAdminService:
    'static
    + Sync
    + Send
    + DependOnDatabaseConnection
    + DependOnUserQuery
    + DependOnUserModifier
    + DependOnPasswordHasher
{
    /// Inserts the configured administrator unless a user with that email already exists.
    ///
    /// The configured name is taken as is; it does not have to be an email address.
    async fn seed_admin(&self, dto: SeedAdminDto) -> error_stack::Result<(), KernelError> {
        let email = UserEmail::new(dto.email.trim().to_lowercase());
        let mut connection = self.database_connection().transact().await?;
        if self
            .user_query()
            .find_by_email(&mut connection, &email)
            .await?
            .is_some()
        {
            tracing::debug!("admin user already present");
            return Ok(());
        }

        let hash = self
            .password_hasher()
            .hash(&RawPassword::new(dto.password))
            .await?;
        let admin = NewUser::new(email, hash, FirstName::new("Admin"), LastName::new("Admin"));
        let id = self.user_modifier().create(&mut connection, &admin).await?;
        connection.commit().await?;

        tracing::info!(user_id = id.as_ref(), "admin user seeded");
        Ok(())
    }
}

impl<T> SeedAdminService for T where
    T: DependOnDatabaseConnection + DependOnUserQuery + DependOnUserModifier + DependOnPasswordHasher
{
}

#[cfg(test)]
mod test {
    use kernel::prelude::entity::UserId;
    use kernel::KernelError;

    use crate::service::{
        AuthenticateUserService, GetUserService, RegisterUserService, SeedAdminService,
        UpdateUserService,
    };
    use crate::test_support::TestModule;
    use crate::transfer::{
        GetPageDto, GetUserDto, LoginDto, RegisterUserDto, SeedAdminDto, UpdateUserDto,
    };

    fn register(email: &str, password: &str) -> RegisterUserDto {
        RegisterUserDto {
            email: email.to_string(),
            password: password.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        }
    }

    #[tokio::test]
    async fn register_then_login() -> error_stack::Result<(), KernelError> {
        let module = TestModule::default();
        let id = module
            .register_user(register("Ada@Example.com", "correct horse"))
            .await?;

        let user = module.get_user(GetUserDto { id }).await?;
        assert_eq!(user.email, "ada@example.com");

        let token = module
            .login(LoginDto {
                email: "ada@example.com".to_string(),
                password: "correct horse".to_string(),
            })
            .await?;
        assert_eq!(module.authenticate(&token).await?, UserId::new(id));
        Ok(())
    }

    #[tokio::test]
    async fn registration_rules() {
        let module = TestModule::default();
        let error = module
            .register_user(register("ada@example.com", "short"))
            .await
            .unwrap_err();
        assert_eq!(error.current_context(), &KernelError::Validation);

        let error = module
            .register_user(register("not-an-email", "long enough"))
            .await
            .unwrap_err();
        assert_eq!(error.current_context(), &KernelError::Validation);

        module
            .register_user(register("ada@example.com", "long enough"))
            .await
            .unwrap();
        let error = module
            .register_user(register("ADA@example.com", "long enough"))
            .await
            .unwrap_err();
        assert_eq!(error.current_context(), &KernelError::Conflict);
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() -> error_stack::Result<(), KernelError> {
        let module = TestModule::default();
        module
            .register_user(register("ada@example.com", "long enough"))
            .await?;

        for (email, password) in [
            ("ada@example.com", "wrong password"),
            ("nobody@example.com", "long enough"),
            ("garbage", "long enough"),
        ] {
            let error = module
                .login(LoginDto {
                    email: email.to_string(),
                    password: password.to_string(),
                })
                .await
                .unwrap_err();
            assert_eq!(error.current_context(), &KernelError::Unauthorized);
        }

        let error = module.authenticate("token-42").await.unwrap_err();
        assert_eq!(error.current_context(), &KernelError::Unauthorized);
        Ok(())
    }

    #[tokio::test]
    async fn update_checks_diff_and_email_uniqueness() -> error_stack::Result<(), KernelError> {
        let module = TestModule::default();
        let ada = module
            .register_user(register("ada@example.com", "long enough"))
            .await?;
        module
            .register_user(register("grace@example.com", "long enough"))
            .await?;

        let error = module
            .update_user(UpdateUserDto {
                id: ada,
                email: Some("ada@example.com".to_string()),
                first_name: Some("Ada".to_string()),
                last_name: None,
            })
            .await
            .unwrap_err();
        assert_eq!(error.current_context(), &KernelError::Validation);

        let error = module
            .update_user(UpdateUserDto {
                id: ada,
                email: Some("grace@example.com".to_string()),
                first_name: None,
                last_name: None,
            })
            .await
            .unwrap_err();
        assert_eq!(error.current_context(), &KernelError::Conflict);

        let updated = module
            .update_user(UpdateUserDto {
                id: ada,
                email: None,
                first_name: Some("Augusta".to_string()),
                last_name: None,
            })
            .await?;
        assert_eq!(updated.first_name, "Augusta");
        assert_eq!(updated.last_name, "Lovelace");
        Ok(())
    }

    #[tokio::test]
    async fn admin_seeding_is_idempotent() -> error_stack::Result<(), KernelError> {
        let module = TestModule::default();
        for _ in 0..2 {
            module
                .seed_admin(SeedAdminDto {
                    email: "admin".to_string(),
                    password: "secret".to_string(),
                })
                .await?;
        }
        let users = module.get_all_users(GetPageDto { page_id: 0 }).await?;
        assert_eq!(users.items.len(), 1);
        assert_eq!(users.items[0].email, "admin");
        Ok(())
    }
}
