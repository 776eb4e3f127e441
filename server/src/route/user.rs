use axum::extract::{Form, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use application::service::{
    AuthenticateUserService, GetUserService, RegisterUserService, UpdateUserService,
};

use crate::auth::Authenticated;
use crate::controller::Controller;
use crate::error::ErrorStatus;
use crate::extract::Body;
use crate::handler::AppModule;
use crate::request::{
    GetUserRequest, LoginRequest, RegisterRequest, UpdateUserRequest, UserTransformer,
};
use crate::response::{CreatedPresenter, UpdatedPresenter, UserPresenter};

pub trait UserRouter {
    fn route_user(self) -> Self;
}

impl UserRouter for Router<AppModule> {
    fn route_user(self) -> Self {
        self.route(
            "/users/register",
            post(
                |State(module): State<AppModule>,
                 Body(Json(req)): Body<Json<RegisterRequest>>| async move {
                    Controller::new(UserTransformer, CreatedPresenter)
                        .intake(req)
                        .handle(|dto| async move { module.register_user(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/users/login",
            post(
                |State(module): State<AppModule>,
                 Body(Form(req)): Body<Form<LoginRequest>>| async move {
                    Controller::new(UserTransformer, UserPresenter)
                        .intake(req)
                        .handle(|dto| async move { module.login(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/users/me",
            get(
                |State(module): State<AppModule>, Authenticated(id): Authenticated| async move {
                    Controller::new(UserTransformer, UserPresenter)
                        .intake(GetUserRequest::new(id))
                        .handle(|dto| async move { module.get_user(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            )
            .patch(
                |State(module): State<AppModule>,
                 Authenticated(id): Authenticated,
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
}
