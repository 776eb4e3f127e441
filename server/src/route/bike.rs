use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;

use application::service::GetBikeService;

use crate::auth::Authenticated;
use crate::controller::Controller;
use crate::error::ErrorStatus;
use crate::extract::Params;
use crate::handler::AppModule;
use crate::request::{PageRequest, PageTransformer};
use crate::response::BikePresenter;

pub trait BikeRouter {
    fn route_bike(self) -> Self;
}

impl BikeRouter for Router<AppModule> {
    fn route_bike(self) -> Self {
        self.route(
            "/bikes/available",
            get(
                |State(module): State<AppModule>,
                 _: Authenticated,
                 Params(Query(req)): Params<Query<PageRequest>>| async move {
                    Controller::new(PageTransformer, BikePresenter)
                        .try_intake(req)
                        .map_err(ErrorStatus::from)?
                        .handle(|dto| async move { module.get_available_bikes(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
    }
}
