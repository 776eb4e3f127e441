use error_stack::Report;
use vodca::{AsRefln, Fromln};

use crate::KernelError;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Plain text password as typed by the user. Never stored and never printed.
#[derive(Clone, PartialEq, Eq, AsRefln)]
pub struct RawPassword(String);

impl RawPassword {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    pub fn try_new(password: impl Into<String>) -> error_stack::Result<Self, KernelError> {
        let password = password.into();
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(Report::new(KernelError::Validation).attach_printable(format!(
                "password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }
        Ok(Self(password))
    }
}

impl std::fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RawPassword(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Fromln, AsRefln)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Fromln, AsRefln)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}
