//! API server entry point.

use std::sync::Arc;

use api::{Authenticator, Config, TokenTable};
use common::{Principal, UserId};
use store::{InMemoryStore, PostgresStore, Store};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Builds the token table from `ADMIN_TOKEN` / `USER_TOKEN` environment
/// variables. Stands in for the real authentication collaborator.
fn build_authenticator() -> Arc<dyn Authenticator> {
    let table = TokenTable::new();
    if let Ok(token) = std::env::var("ADMIN_TOKEN") {
        let principal = Principal::admin(UserId::new());
        tracing::info!(user_id = %principal.id, "granted admin credential from ADMIN_TOKEN");
        table.grant(token, principal);
    }
    if let Ok(token) = std::env::var("USER_TOKEN") {
        let principal = Principal::user(UserId::new());
        tracing::info!(user_id = %principal.id, "granted user credential from USER_TOKEN");
        table.grant(token, principal);
    }
    Arc::new(table)
}

async fn serve<S: Store>(store: S, config: Config) {
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    let state = api::create_state(store, config.cart_policy(), build_authenticator());
    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    match config.database_url.clone() {
        Some(url) => {
            let store = PostgresStore::connect(&url)
                .await
                .expect("failed to connect to database");
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            serve(store, config).await;
        }
        None => {
            tracing::warn!("DATABASE_URL not set, falling back to the in-memory store");
            serve(InMemoryStore::new(), config).await;
        }
    }
}
