use error_stack::Report;
use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln};

use crate::KernelError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Fromln, AsRefln)]
pub struct PricePerMinute(f64);

impl PricePerMinute {
    pub fn new(price: impl Into<f64>) -> Self {
        Self(price.into())
    }

    pub fn try_new(price: impl Into<f64>) -> error_stack::Result<Self, KernelError> {
        let price = price.into();
        if !price.is_finite() || price < 0.0 {
            return Err(Report::new(KernelError::Validation)
                .attach_printable(format!("price per minute {price} must be a non-negative number")));
        }
        Ok(Self(price))
    }
}
