use std::net::SocketAddr;

use dotenvy::dotenv;
use tracing::{error, info};

use schoolhub::logging::{init_tracing, shutdown_tracer};
use schoolhub::metrics::{init_metrics, metrics_app};
use schoolhub::router::init_router;
use schoolhub::state::init_app_state;
use schoolhub_db::run_migrations;

fn port_from_env(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    let state = init_app_state().await;
    run_migrations(&state.db)
        .await
        .expect("Failed to run database migrations");

    if let Some(handle) = init_metrics() {
        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], port_from_env("METRICS_PORT", 9090)));
        tokio::spawn(async move {
            match tokio::net::TcpListener::bind(metrics_addr).await {
                Ok(listener) => {
                    info!(%metrics_addr, "Metrics server listening");
                    if let Err(e) = axum::serve(listener, metrics_app(handle)).await {
                        error!(error = %e, "Metrics server stopped");
                    }
                }
                Err(e) => error!(error = %e, %metrics_addr, "Failed to bind metrics server"),
            }
        });
    }

    let app = init_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port_from_env("PORT", 3000)));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server address");

    info!(%addr, "Server running");
    info!("Swagger UI available at http://{}/swagger-ui", addr);
    info!("Scalar UI available at http://{}/scalar", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    shutdown_tracer();
}
