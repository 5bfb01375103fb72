use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use dotenvy::dotenv;
use tracing::info;

use grubhub_api::bootstrap::app_context::{AppContext, AppServices};
use grubhub_api::bootstrap::config::Config;
use grubhub_api::infrastructure::db;
use grubhub_api::infrastructure::realtime::DeliverySocketHandler;
use grubhub_api::presentation::http::modules::{ApiModule, RouteModules};
use grubhub_api::presentation::http::router::build_app;
use grubhub_api::presentation::ws::delivery_socket::DELIVERY_SOCKET_PATH;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "grubhub_api=debug,axum=info,tower_http=info".into()),
        )
        .init();

    let cfg = Config::from_env()?;
    info!(
        port = cfg.port,
        serve_frontend = cfg.serve_frontend,
        origins = ?cfg.allowed_origins,
        "Starting Protein Grub Hub backend"
    );

    // Database
    let database = db::connect(
        &cfg.mongo_uri,
        cfg.mongo_db.as_deref(),
        Duration::from_secs(cfg.db_connect_timeout_secs),
    )
    .await?;

    // Single delivery socket handler, shared by the WS endpoint and route modules
    let delivery_socket = Arc::new(DeliverySocketHandler::default());

    let ctx = AppContext::new(cfg.clone(), AppServices::new(database, delivery_socket));

    let modules = RouteModules::new().with(
        ApiModule::Delivery,
        grubhub_api::presentation::http::delivery::routes,
    );
    let app = build_app(ctx, modules);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(port = cfg.port, "Server is running on port {}", cfg.port);
    info!(path = DELIVERY_SOCKET_PATH, "Delivery socket is ready for real-time tracking");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = ?e, "shutdown_signal_listener_failed");
        std::future::pending::<()>().await;
    }
    info!("shutdown_requested");
}
