//! Laceup API server binary.
//!
//! Loads configuration from the environment, connects to `PostgreSQL`, runs
//! pending migrations and serves the JSON API.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use laceup_api::config::ApiConfig;
use laceup_api::routes;
use laceup_api::services::payment::StripeGateway;
use laceup_api::state::AppState;
use laceup_api::store::postgres::{create_pool, PgStore};

#[tokio::main]
async fn main() {
    // .env is optional; real deployments set the environment directly.
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().expect("Failed to load configuration");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "laceup_api=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = create_pool(&config)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database pool created, migrations applied");

    let store = Arc::new(PgStore::new(pool));
    let gateway = Arc::new(StripeGateway::new(config.payment.clone()));
    let state = AppState::new(config.clone(), store, gateway);

    let app = routes::router(state);

    let addr = config.socket_addr();
    tracing::info!("laceup-api listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
