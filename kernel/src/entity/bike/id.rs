use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln};

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize, Fromln, AsRefln)]
pub struct BikeId(i64);

impl BikeId {
    pub fn new(id: impl Into<i64>) -> Self {
        Self(id.into())
    }
}
