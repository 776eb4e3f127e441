use std::str::FromStr;
use std::time::Duration;

use base64::Engine;
use error_stack::{Report, ResultExt};
use kernel::KernelError;
use subtle::ConstantTimeEq;

use crate::env;

const POSTGRES_URL: &str = "POSTGRES_URL";
const POSTGRES_MAX_CONNECTIONS: &str = "POSTGRES_MAX_CONNECTIONS";
const DATABASE_TIMEOUT_MS: &str = "DATABASE_TIMEOUT_MS";
const JWT_SECRET: &str = "JWT_SECRET";
const JWT_TTL_HOURS: &str = "JWT_TTL_HOURS";
const ADMIN_CREDENTIALS: &str = "ADMIN_CREDENTIALS";

/// Reads an optional variable, falling back to `default` when it is not set.
pub fn env_or<T: FromStr>(key: &str, default: T) -> error_stack::Result<T, KernelError> {
    match dotenvy::var(key) {
        Ok(value) => value.trim().parse().map_err(|_| {
            Report::new(KernelError::Internal)
                .attach_printable(format!("Env {key} has an invalid value '{value}'"))
        }),
        Err(dotenvy::Error::EnvVar(std::env::VarError::NotPresent)) => Ok(default),
        Err(error) => Err(Report::new(error).change_context(KernelError::Internal)),
    }
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    url: String,
    max_connections: u32,
    acquire_timeout: Duration,
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>, max_connections: u32, acquire_timeout: Duration) -> Self {
        Self {
            url: url.into(),
            max_connections,
            acquire_timeout,
        }
    }

    pub fn from_env() -> error_stack::Result<Self, KernelError> {
        Ok(Self::new(
            env(POSTGRES_URL)?,
            env_or(POSTGRES_MAX_CONNECTIONS, 10)?,
            Duration::from_millis(env_or(DATABASE_TIMEOUT_MS, 1000)?),
        ))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn max_connections(&self) -> u32 {
        self.max_connections
    }

    pub fn acquire_timeout(&self) -> Duration {
        self.acquire_timeout
    }
}

#[derive(Clone)]
pub struct JwtConfig {
    secret: String,
    ttl: time::Duration,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, ttl: time::Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    pub fn from_env() -> error_stack::Result<Self, KernelError> {
        Ok(Self::new(
            env(JWT_SECRET)?,
            time::Duration::hours(env_or(JWT_TTL_HOURS, 24 * 30)?),
        ))
    }

    pub fn secret(&self) -> &[u8] {
        self.secret.as_bytes()
    }

    pub fn ttl(&self) -> time::Duration {
        self.ttl
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"***")
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Static administrator identity, configured as base64 of `username:password`.
#[derive(Clone)]
pub struct AdminCredentials {
    username: String,
    password: String,
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn from_env() -> error_stack::Result<Self, KernelError> {
        Self::decode(&env(ADMIN_CREDENTIALS)?)
    }

    pub fn decode(encoded: &str) -> error_stack::Result<Self, KernelError> {
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .change_context_lazy(|| KernelError::Internal)
            .attach_printable("admin credentials are not valid base64")?;
        let decoded = String::from_utf8(decoded)
            .change_context_lazy(|| KernelError::Internal)
            .attach_printable("admin credentials are not valid utf-8")?;
        let (username, password) = decoded.split_once(':').ok_or_else(|| {
            Report::new(KernelError::Internal)
                .attach_printable("admin credentials must have the form username:password")
        })?;
        Ok(Self::new(username, password))
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Compares both fields in constant time and without short-circuiting between them.
    pub fn matches(&self, username: &str, password: &str) -> bool {
        let username = self.username.as_bytes().ct_eq(username.as_bytes());
        let password = self.password.as_bytes().ct_eq(password.as_bytes());
        (username & password).into()
    }
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::AdminCredentials;

    #[test]
    fn decodes_admin_credentials() {
        // base64("admin@example.com:s3cret:with-colon")
        let credentials =
            AdminCredentials::decode("YWRtaW5AZXhhbXBsZS5jb206czNjcmV0OndpdGgtY29sb24=").unwrap();
        assert_eq!(credentials.username(), "admin@example.com");
        assert_eq!(credentials.password(), "s3cret:with-colon");
        assert!(credentials.matches("admin@example.com", "s3cret:with-colon"));
        assert!(!credentials.matches("admin@example.com", "s3cret"));
    }

    #[test]
    fn admin_match_requires_both_fields_in_full() {
        // base64("admin@example.com:s3cret")
        let credentials = AdminCredentials::decode("YWRtaW5AZXhhbXBsZS5jb206czNjcmV0").unwrap();
        assert!(credentials.matches("admin@example.com", "s3cret"));
        assert!(!credentials.matches("admin@example.com", "s3cre"));
        assert!(!credentials.matches("admin@example.com", "s3cret!"));
        assert!(!credentials.matches("admin@example.org", "s3cret"));
        assert!(!credentials.matches("admin@example.org", "wrong!"));
        assert!(!credentials.matches("", ""));
    }

    #[test]
    fn rejects_malformed_admin_credentials() {
        assert!(AdminCredentials::decode("%%%").is_err());
        // base64("no-separator")
        assert!(AdminCredentials::decode("bm8tc2VwYXJhdG9y").is_err());
    }
}
