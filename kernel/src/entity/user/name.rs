use error_stack::Report;
use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln};

use crate::KernelError;

fn required(field: &str, name: String) -> error_stack::Result<String, KernelError> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(Report::new(KernelError::Validation)
            .attach_printable(format!("{field} must not be empty")));
    }
    Ok(name)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Fromln, AsRefln, Serialize, Deserialize)]
pub struct FirstName(String);

impl FirstName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn try_new(name: impl Into<String>) -> error_stack::Result<Self, KernelError> {
        required("first_name", name.into()).map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Fromln, AsRefln, Serialize, Deserialize)]
pub struct LastName(String);

impl LastName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn try_new(name: impl Into<String>) -> error_stack::Result<Self, KernelError> {
        required("last_name", name.into()).map(Self)
    }
}
