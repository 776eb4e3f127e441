use error_stack::ResultExt;
use kernel::KernelError;

use crate::error::ConvertError;

pub mod config;
pub mod database;
pub mod error;
pub mod identity;

pub(crate) fn env(key: &str) -> error_stack::Result<String, KernelError> {
    dotenvy::var(key)
        .convert_error()
        .attach_printable_lazy(|| format!("Env {key} not specified"))
}
