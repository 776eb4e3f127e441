mod page;
mod position;
mod time;

pub use self::{page::*, position::*, time::*};
