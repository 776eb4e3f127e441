use std::net::SocketAddr;

use error_stack::ResultExt;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use application::service::SeedAdminService;
use application::transfer::SeedAdminDto;
use kernel::KernelError;

use crate::config::AppConfig;
use crate::error::StackTrace;
use crate::handler::{AppModule, Handler};

mod auth;
mod config;
mod controller;
mod error;
mod extract;
mod handler;
mod request;
mod response;
mod route;

#[tokio::main]
async fn main() -> Result<(), StackTrace> {
    let appender = tracing_appender::rolling::daily(std::path::Path::new("./logs/"), "debug.log");
    let (non_blocking_appender, _guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_filter(tracing_subscriber::EnvFilter::new(
                    std::env::var("RUST_LOG").unwrap_or_else(|_| {
                        "driver=debug,application=debug,server=debug,tower_http=debug,sqlx=info"
                            .into()
                    }),
                ))
                .with_filter(tracing_subscriber::filter::LevelFilter::DEBUG),
        )
        .with(
            tracing_subscriber::fmt::Layer::default()
                .with_writer(non_blocking_appender)
                .with_ansi(false)
                .with_filter(tracing_subscriber::filter::LevelFilter::DEBUG),
        )
        .init();

    let config = AppConfig::from_env()?;
    let handler = Handler::init(&config).await?;
    handler.pgpool().migrate().await?;
    handler
        .seed_admin(SeedAdminDto {
            email: config.admin().username().to_string(),
            password: config.admin().password().to_string(),
        })
        .await?;

    let router = route::router()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(*config.request_timeout()))
        .layer(CorsLayer::new())
        .with_state(AppModule::new(handler));

    let bind = SocketAddr::from(([0, 0, 0, 0], *config.port()));
    let tcp = TcpListener::bind(bind)
        .await
        .change_context_lazy(|| KernelError::Internal)
        .attach_printable_lazy(|| format!("Failed to listen on {bind}"))?;
    tracing::info!("listening on {bind}");

    axum::serve(tcp, router.into_make_service())
        .await
        .change_context_lazy(|| KernelError::Internal)?;

    Ok(())
}
