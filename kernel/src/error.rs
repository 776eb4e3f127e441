use std::fmt::Display;

use error_stack::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    NotFound,
    Conflict,
    UserAlreadyRenting,
    BikeNotAvailable,
    NoOpenRental,
    RentalMismatch,
    Validation,
    Unauthorized,
    Timeout,
    Internal,
}

impl Display for KernelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KernelError::NotFound => write!(f, "Resource not found"),
            KernelError::Conflict => write!(f, "Resource already exists"),
            KernelError::UserAlreadyRenting => write!(f, "User is already renting a bike"),
            KernelError::BikeNotAvailable => write!(f, "Bike is not available for rent"),
            KernelError::NoOpenRental => write!(f, "User is not currently renting a bike"),
            KernelError::RentalMismatch => write!(
                f,
                "Rental in request does not match with current bike rental by user"
            ),
            KernelError::Validation => write!(f, "Validation failed"),
            KernelError::Unauthorized => write!(f, "Unauthorized"),
            KernelError::Timeout => write!(f, "Process timed out"),
            KernelError::Internal => write!(f, "Transaction failed"),
        }
    }
}

impl Context for KernelError {}
