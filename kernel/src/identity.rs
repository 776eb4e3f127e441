use crate::entity::{AccessToken, PasswordHash, RawPassword, User, UserId};
use crate::KernelError;

/// One-way password hashing. Implementations may be CPU heavy and must not stall the caller's
/// executor.
#[async_trait::async_trait]
pub trait PasswordHasher: 'static + Sync + Send {
    async fn hash(
        &self,
        password: &RawPassword,
    ) -> error_stack::Result<PasswordHash, KernelError>;
    async fn verify(
        &self,
        password: &RawPassword,
        hash: &PasswordHash,
    ) -> error_stack::Result<bool, KernelError>;
}

pub trait DependOnPasswordHasher: 'static + Sync + Send {
    type PasswordHasher: PasswordHasher;
    fn password_hasher(&self) -> &Self::PasswordHasher;
}

/// Issues and checks the bearer tokens carried by authenticated requests.
///
/// `verify` fails with [`KernelError::Unauthorized`] for malformed, forged and expired tokens.
pub trait TokenAuthority: 'static + Sync + Send {
    fn issue(&self, user: &User) -> error_stack::Result<AccessToken, KernelError>;
    fn verify(&self, token: &str) -> error_stack::Result<UserId, KernelError>;
}

pub trait DependOnTokenAuthority: 'static + Sync + Send {
    type TokenAuthority: TokenAuthority;
    fn token_authority(&self) -> &Self::TokenAuthority;
}
