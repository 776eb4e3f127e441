use error_stack::Report;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use kernel::interface::identity::{PasswordHasher, TokenAuthority};
use kernel::prelude::entity::{AccessToken, PasswordHash, RawPassword, User, UserId};
use kernel::KernelError;

use crate::config::JwtConfig;
use crate::error::ConvertError;

#[derive(Clone)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

/// Runs bcrypt on the blocking pool so a hash never holds up an async worker.
#[async_trait::async_trait]
impl PasswordHasher for BcryptPasswordHasher {
    async fn hash(
        &self,
        password: &RawPassword,
    ) -> error_stack::Result<PasswordHash, KernelError> {
        let password: &String = password.as_ref();
        let password = password.clone();
        let cost = self.cost;
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .convert_error()?
            .convert_error()?;
        Ok(PasswordHash::new(hash))
    }

    async fn verify(
        &self,
        password: &RawPassword,
        hash: &PasswordHash,
    ) -> error_stack::Result<bool, KernelError> {
        let password: &String = password.as_ref();
        let password = password.clone();
        let hash: &String = hash.as_ref();
        let hash = hash.clone();
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .convert_error()?
            .convert_error()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
    iat: i64,
    email: String,
}

/// HS256 bearer tokens whose subject is the stringified user id.
#[derive(Clone)]
pub struct JwtTokenAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: time::Duration,
}

impl JwtTokenAuthority {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(config.secret()),
            decoding: DecodingKey::from_secret(config.secret()),
            validation,
            ttl: config.ttl(),
        }
    }
}

impl TokenAuthority for JwtTokenAuthority {
    fn issue(&self, user: &User) -> error_stack::Result<AccessToken, KernelError> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: user.id().as_ref().to_string(),
            exp: (now + self.ttl).unix_timestamp(),
            iat: now.unix_timestamp(),
            email: user.email().as_ref().clone(),
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|error| Report::new(error).change_context(KernelError::Internal))?;
        Ok(AccessToken::new(token))
    }

    fn verify(&self, token: &str) -> error_stack::Result<UserId, KernelError> {
        let data =
            jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation).convert_error()?;
        let id = data.claims.sub.parse::<i64>().map_err(|error| {
            Report::new(error)
                .change_context(KernelError::Unauthorized)
                .attach_printable("token subject is not a user id")
        })?;
        Ok(UserId::new(id))
    }
}
