//! Kasir API server binary.
//!
//! ```bash
//! KASIR_DB_PATH=./kasir.db KASIR_PORT=8080 cargo run -p kasir-api
//! ```

use anyhow::Context;
use kasir_api::config::ApiConfig;
use kasir_api::{build_router, AppState};
use kasir_db::Database;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; real deployments set the environment directly.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,kasir=debug,sqlx=warn")),
        )
        .with_target(true)
        .init();

    info!("Starting Kasir API server...");

    let config = ApiConfig::load().context("loading configuration")?;
    info!(
        addr = %config.socket_addr(),
        db_path = %config.db_path,
        timezone = config.default_timezone.name(),
        "Configuration loaded"
    );

    let db = Database::new(config.db_config())
        .await
        .context("opening database")?;

    let listener = TcpListener::bind(config.socket_addr())
        .await
        .with_context(|| format!("binding {}", config.socket_addr()))?;
    info!(addr = %listener.local_addr()?, "Listening");

    let app = build_router(AppState::new(db.clone(), config));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
