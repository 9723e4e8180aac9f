use std::sync::Arc;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    Server,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use todo_auth_service::{config::Config, route::create_router, AppState};

// Entry point of the application
#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_auth_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "Invalid configuration");
            std::process::exit(1);
        }
    };

    let addr = match config.socket_addr() {
        Ok(addr) => addr,
        Err(err) => {
            error!(error = %err, "Invalid listen address");
            std::process::exit(1);
        }
    };

    // Stores are created once per process and shared by every handler
    let app_state = Arc::new(AppState::in_memory(&config));

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]);
    let cors = match config
        .cors_origin
        .as_deref()
        .map(str::parse::<HeaderValue>)
    {
        Some(Ok(origin)) => cors.allow_origin(origin).allow_credentials(true),
        Some(Err(err)) => {
            error!(error = %err, "CORS_ORIGIN is not a valid header value");
            std::process::exit(1);
        }
        None => cors.allow_origin(Any),
    };

    let app = create_router(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    info!(%addr, "Server started successfully");

    let server = Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal());

    if let Err(err) = server.await {
        error!(error = %err, "Server error");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
