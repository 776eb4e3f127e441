use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use kernel::interface::database::{DatabaseConnection, DependOnDatabaseConnection};

use crate::error::MessageResponse;
use crate::handler::AppModule;

pub trait StatusRouter {
    fn route_status(self) -> Self;
}

impl StatusRouter for Router<AppModule> {
    fn route_status(self) -> Self {
        self.route(
            "/status",
            get(|State(module): State<AppModule>| async move {
                match module.database_connection().health().await {
                    Ok(()) => (
                        StatusCode::OK,
                        Json(MessageResponse::new("Server is up and running")),
                    )
                        .into_response(),
                    Err(report) => {
                        tracing::error!("health check failed: {report:?}");
                        (
                            StatusCode::SERVICE_UNAVAILABLE,
                            Json(MessageResponse::new("Database is unreachable")),
                        )
                            .into_response()
                    }
                }
            }),
        )
    }
}
