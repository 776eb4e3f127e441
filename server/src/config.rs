use std::time::Duration;

use driver::config::{env_or, AdminCredentials, JwtConfig, PostgresConfig};
use kernel::KernelError;
use vodca::References;

const PORT: &str = "PORT";
const REQUEST_TIMEOUT_MS: &str = "REQUEST_TIMEOUT_MS";

#[derive(Debug, Clone, References)]
pub struct AppConfig {
    postgres: PostgresConfig,
    jwt: JwtConfig,
    admin: AdminCredentials,
    port: u16,
    request_timeout: Duration,
}

impl AppConfig {
    pub fn new(
        postgres: PostgresConfig,
        jwt: JwtConfig,
        admin: AdminCredentials,
        port: u16,
        request_timeout: Duration,
    ) -> Self {
        Self {
            postgres,
            jwt,
            admin,
            port,
            request_timeout,
        }
    }

    pub fn from_env() -> error_stack::Result<Self, KernelError> {
        Ok(Self::new(
            PostgresConfig::from_env()?,
            JwtConfig::from_env()?,
            AdminCredentials::from_env()?,
            env_or(PORT, 8080)?,
            Duration::from_millis(env_or(REQUEST_TIMEOUT_MS, 5000)?),
        ))
    }
}
