use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln};

/// Per-bike proxy for "no open rental references this bike".
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, Fromln, AsRefln)]
pub struct BikeAvailability(bool);

impl BikeAvailability {
    pub const AVAILABLE: Self = Self(true);
    pub const RENTED: Self = Self(false);

    pub fn new(available: impl Into<bool>) -> Self {
        Self(available.into())
    }

    pub fn is_available(&self) -> bool {
        self.0
    }
}
