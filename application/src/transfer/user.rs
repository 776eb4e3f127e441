use kernel::prelude::entity::{DestructUser, User};
use time::OffsetDateTime;

/// Public view of a user. The password hash never leaves the service layer.
#[derive(Debug, Clone, PartialEq)]
pub struct UserDto {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<User> for UserDto {
    fn from(value: User) -> Self {
        let DestructUser {
            id,
            email,
            first_name,
            last_name,
            created_at,
            updated_at,
            ..
        } = value.into_destruct();
        Self {
            id: id.into(),
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            created_at: created_at.into(),
            updated_at: updated_at.into(),
        }
    }
}

pub struct RegisterUserDto {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

pub struct LoginDto {
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct GetUserDto {
    pub id: i64,
}

#[derive(Debug)]
pub struct UpdateUserDto {
    pub id: i64,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

pub struct SeedAdminDto {
    pub email: String,
    pub password: String,
}
