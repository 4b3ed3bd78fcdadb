use std::sync::Arc;

use anyhow::Context;
use athlete_metrics_api::{
    app_with_cors,
    auth::TokenService,
    config::{self, Environment},
    cors_layer,
    database::{manager::redact_url, Database, PgMeasurementStore, PgUserStore},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting Athlete Metrics API in {:?} mode", config.environment);

    if config.uses_default_secret() {
        match config.environment {
            Environment::Production => {
                tracing::warn!("JWT_SECRET is not set; tokens are signed with the built-in default")
            }
            Environment::Development | Environment::Staging => {
                tracing::info!("Using default JWT secret")
            }
        }
    }

    let tokens = TokenService::from_config(&config.security);

    let (state, database) = if config.uses_memory_store() {
        tracing::info!("Using in-memory store; data is lost on exit");
        (AppState::in_memory(tokens), None)
    } else {
        tracing::info!("Connecting to database at: {}", redact_url(&config.database.url));
        let db = Database::connect(&config.database)
            .await
            .context("Failed to connect to database")?;
        db.ensure_schema()
            .await
            .context("Failed to prepare database schema")?;

        let state = AppState::new(
            Arc::new(PgUserStore::new(db.pool().clone())),
            Arc::new(PgMeasurementStore::new(db.pool().clone())),
            tokens,
        );
        (state, Some(db))
    };

    let app = app_with_cors(state, cors_layer(&config.security));

    let bind_addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Server is running on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received");
}
