use axum::Router;

use crate::handler::AppModule;

mod admin;
mod bike;
mod rental;
mod status;
mod user;

pub use self::{admin::*, bike::*, rental::*, status::*, user::*};

pub fn router() -> Router<AppModule> {
    Router::new()
        .route_status()
        .route_user()
        .route_bike()
        .route_rental()
        .route_admin()
}
