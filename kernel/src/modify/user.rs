use destructure::Destructure;
use vodca::References;

use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{FirstName, LastName, PasswordHash, UserEmail, UserId};
use crate::KernelError;

#[derive(Debug, Clone, PartialEq, References, Destructure)]
pub struct NewUser {
    email: UserEmail,
    password: PasswordHash,
    first_name: FirstName,
    last_name: LastName,
}

impl NewUser {
    pub fn new(
        email: UserEmail,
        password: PasswordHash,
        first_name: FirstName,
        last_name: LastName,
    ) -> Self {
        Self {
            email,
            password,
            first_name,
            last_name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, References, Destructure)]
pub struct UserPatch {
    email: Option<UserEmail>,
    first_name: Option<FirstName>,
    last_name: Option<LastName>,
}

impl UserPatch {
    pub fn new(
        email: Option<UserEmail>,
        first_name: Option<FirstName>,
        last_name: Option<LastName>,
    ) -> Self {
        Self {
            email,
            first_name,
            last_name,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.first_name.is_none() && self.last_name.is_none()
    }
}

#[async_trait::async_trait]
pub trait UserModifier: 'static + Sync + Send {
    type Transaction: Transaction;
    /// Fails with `Conflict` when the email is already registered.
    async fn create(
        &self,
        con: &mut Self::Transaction,
        user: &NewUser,
    ) -> error_stack::Result<UserId, KernelError>;
    async fn update(
        &self,
        con: &mut Self::Transaction,
        id: &UserId,
        patch: &UserPatch,
    ) -> error_stack::Result<(), KernelError>;
}

pub trait DependOnUserModifier: 'static + Sync + Send + DependOnDatabaseConnection {
    type UserModifier: UserModifier<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn user_modifier(&self) -> &Self::UserModifier;
}
