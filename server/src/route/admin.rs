use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use application::service::{
    CreateBikeService, EndRentalService, GetBikeService, GetRentalService, GetUserService,
    UpdateBikeService, UpdateRentalService, UpdateUserService,
};

use crate::auth::Admin;
use crate::controller::Controller;
use crate::error::ErrorStatus;
use crate::extract::{Body, Params};
use crate::handler::AppModule;
use crate::request::{
    BikeTransformer, CreateBikeRequest, ForceEndRentalRequest, GetBikeRequest, GetRentalRequest,
    GetUserRequest, PageRequest, PageTransformer, RentalTransformer, UpdateBikeRequest,
    UpdateRentalRequest, UpdateUserRequest, UserTransformer,
};
use crate::response::{
    BikePresenter, CreatedPresenter, RentalPresenter, UpdatedPresenter, UserPresenter,
};

/// Back-office routes, all behind the basic-auth [`Admin`] guard.
pub trait AdminRouter {
    fn route_admin(self) -> Self;
}

impl AdminRouter for Router<AppModule> {
    fn route_admin(self) -> Self {
        self.route_admin_bikes()
            .route_admin_users()
            .route_admin_rentals()
    }
}

trait AdminResourceRouter {
    fn route_admin_bikes(self) -> Self;
    fn route_admin_users(self) -> Self;
    fn route_admin_rentals(self) -> Self;
}

impl AdminResourceRouter for Router<AppModule> {
    fn route_admin_bikes(self) -> Self {
        self.route(
            "/admin/bikes",
            get(
                |State(module): State<AppModule>,
                 _: Admin,
                 Params(Query(req)): Params<Query<PageRequest>>| async move {
                    Controller::new(PageTransformer, BikePresenter)
                        .try_intake(req)
                        .map_err(ErrorStatus::from)?
                        .handle(|dto| async move { module.get_all_bikes(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            )
            .post(
                |State(module): State<AppModule>,
                 _: Admin,
                 Body(Json(req)): Body<Json<CreateBikeRequest>>| async move {
                    Controller::new(BikeTransformer, CreatedPresenter)
                        .intake(req)
                        .handle(|dto| async move { module.create_bike(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/admin/bikes/:id",
            get(
                |State(module): State<AppModule>,
                 _: Admin,
                 Params(Path(id)): Params<Path<i64>>| async move {
                    Controller::new(BikeTransformer, BikePresenter)
                        .intake(GetBikeRequest::new(id))
                        .handle(|dto| async move { module.get_bike(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            )
            .patch(
                |State(module): State<AppModule>,
                 _: Admin,
                 Params(Path(id)): Params<Path<i64>>,
                 Body(Json(req)): Body<Json<UpdateBikeRequest>>| async move {
                    Controller::new(BikeTransformer, UpdatedPresenter)
                        .intake((id, req))
                        .handle(|dto| async move { module.update_bike(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
    }

    fn route_admin_users(self) -> Self {
        self.route(
            "/admin/users",
            get(
                |State(module): State<AppModule>,
                 _: Admin,
                 Params(Query(req)): Params<Query<PageRequest>>| async move {
                    Controller::new(PageTransformer, UserPresenter)
                        .try_intake(req)
                        .map_err(ErrorStatus::from)?
                        .handle(|dto| async move { module.get_all_users(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/admin/users/:id",
            get(
                |State(module): State<AppModule>,
                 _: Admin,
                 Params(Path(id)): Params<Path<i64>>| async move {
                    Controller::new(UserTransformer, UserPresenter)
                        .intake(GetUserRequest::new(id))
                        .handle(|dto| async move { module.get_user(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            )
            .patch(
                |State(module): State<AppModule>,
                 _: Admin,
                 Params(Path(id)): Params<Path<i64>>,
                 Body(Json(req)): Body<Json<UpdateUserRequest>>| async move {
                    Controller::new(UserTransformer, UpdatedPresenter)
                        .intake((id, req))
                        .handle(|dto| async move { module.update_user(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
    }

    fn route_admin_rentals(self) -> Self {
        self.route(
            "/admin/rentals",
            get(
                |State(module): State<AppModule>,
                 _: Admin,
                 Params(Query(req)): Params<Query<PageRequest>>| async move {
                    Controller::new(PageTransformer, RentalPresenter)
                        .try_intake(req)
                        .map_err(ErrorStatus::from)?
                        .handle(|dto| async move { module.get_all_rentals(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/admin/rentals/:id",
            get(
                |State(module): State<AppModule>,
                 _: Admin,
                 Params(Path(id)): Params<Path<i64>>| async move {
                    Controller::new(RentalTransformer, RentalPresenter)
                        .intake(GetRentalRequest::new(id))
                        .handle(|dto| async move { module.get_rental(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            )
            .patch(
                |State(module): State<AppModule>,
                 _: Admin,
                 Params(Path(id)): Params<Path<i64>>,
                 Body(Json(req)): Body<Json<UpdateRentalRequest>>| async move {
                    Controller::new(RentalTransformer, UpdatedPresenter)
                        .intake((id, req))
                        .handle(|dto| async move { module.update_rental(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/admin/rentals/:id/end",
            post(
                |State(module): State<AppModule>,
                 _: Admin,
                 Params(Path(id)): Params<Path<i64>>| async move {
                    Controller::new(RentalTransformer, RentalPresenter)
                        .intake(ForceEndRentalRequest::new(id))
                        .handle(|dto| async move { module.force_end_rental(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
    }
}
