mod bike;
mod page;
mod rental;
mod user;

pub use self::{bike::*, page::*, rental::*, user::*};
