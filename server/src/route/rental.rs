use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use application::service::{EndRentalService, GetRentalService, StartRentalService};
use application::transfer::GetOngoingRentalDto;

use crate::auth::Authenticated;
use crate::controller::Controller;
use crate::error::ErrorStatus;
use crate::extract::{Body, Params};
use crate::handler::AppModule;
use crate::request::{EndRentalRequest, PageRequest, RentalTransformer, StartRentalRequest};
use crate::response::{RentalPresenter, RentalResponse};

pub trait RentalRouter {
    fn route_rental(self) -> Self;
}

impl RentalRouter for Router<AppModule> {
    fn route_rental(self) -> Self {
        self.route(
            "/rentals/start",
            post(
                |State(module): State<AppModule>,
                 Authenticated(id): Authenticated,
                 Body(Json(req)): Body<Json<StartRentalRequest>>| async move {
                    Controller::new(RentalTransformer, RentalPresenter)
                        .intake((id, req))
                        .handle(|dto| async move { module.start_rental(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/rentals/end",
            post(
                |State(module): State<AppModule>,
                 Authenticated(id): Authenticated,
                 Body(Json(req)): Body<Json<EndRentalRequest>>| async move {
                    Controller::new(RentalTransformer, RentalPresenter)
                        .try_intake((id, req))
                        .map_err(ErrorStatus::from)?
                        .handle(|dto| async move { module.end_rental(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/rentals/ongoing",
            get(
                |State(module): State<AppModule>, Authenticated(id): Authenticated| async move {
                    module
                        .get_ongoing_rental(GetOngoingRentalDto { user_id: id })
                        .await
                        .map(RentalResponse::from)
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/rentals/history",
            get(
                |State(module): State<AppModule>,
                 Authenticated(id): Authenticated,
                 Params(Query(req)): Params<Query<PageRequest>>| async move {
                    Controller::new(RentalTransformer, RentalPresenter)
                        .try_intake((id, req))
                        .map_err(ErrorStatus::from)?
                        .handle(|dto| async move { module.get_rental_history(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
    }
}
