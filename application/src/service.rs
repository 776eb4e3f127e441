mod availability;
mod bike;
mod rental;
mod user;

pub use self::{availability::*, bike::*, rental::*, user::*};
