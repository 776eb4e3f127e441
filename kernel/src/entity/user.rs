mod credential;
mod email;
mod id;
mod name;

pub use self::{credential::*, email::*, id::*, name::*};
use crate::entity::{CreatedAt, UpdatedAt};
use destructure::Destructure;
use vodca::References;

#[derive(Debug, Clone, Eq, PartialEq, Destructure, References)]
pub struct User {
    id: UserId,
    email: UserEmail,
    password: PasswordHash,
    first_name: FirstName,
    last_name: LastName,
    created_at: CreatedAt<User>,
    updated_at: UpdatedAt<User>,
}

impl User {
    pub fn new(
        id: UserId,
        email: UserEmail,
        password: PasswordHash,
        first_name: FirstName,
        last_name: LastName,
        created_at: CreatedAt<User>,
        updated_at: UpdatedAt<User>,
    ) -> Self {
        Self {
            id,
            email,
            password,
            first_name,
            last_name,
            created_at,
            updated_at,
        }
    }
}
