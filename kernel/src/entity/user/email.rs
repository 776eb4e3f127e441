use error_stack::Report;
use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln};

use crate::KernelError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Fromln, AsRefln, Serialize, Deserialize)]
pub struct UserEmail(String);

impl UserEmail {
    pub fn new(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    /// Normalizes to lower case, the form every lookup uses.
    pub fn try_new(email: impl Into<String>) -> error_stack::Result<Self, KernelError> {
        let email = email.into().trim().to_lowercase();
        let valid = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
            }
            None => false,
        };
        if !valid {
            return Err(Report::new(KernelError::Validation)
                .attach_printable(format!("'{email}' is not a valid email address")));
        }
        Ok(Self(email))
    }
}

#[cfg(test)]
mod test {
    use super::UserEmail;

    #[test]
    fn lowercases_and_validates() {
        let email = UserEmail::try_new(" Rider@Example.COM ").unwrap();
        assert_eq!(email, UserEmail::new("rider@example.com"));

        assert!(UserEmail::try_new("rider").is_err());
        assert!(UserEmail::try_new("@example.com").is_err());
        assert!(UserEmail::try_new("rider@localhost").is_err());
    }
}
