//! Serve command - Starts the HTTP server.

use std::sync::Arc;

use apalis_sql::postgres::PostgresStorage;

use super::jobs::queue_pool;
use crate::api::{create_router, AppState};
use crate::cli::args::ServeArgs;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::{connect_store, Database};
use crate::jobs::{LogNotifier, OrderConfirmationJob, OrderNotifier, QueueNotifier};

/// Queue-backed notifier on PostgreSQL, log-only otherwise.
async fn order_notifier(config: &Config) -> AppResult<Arc<dyn OrderNotifier>> {
    if !config.database_url.starts_with("postgres") {
        tracing::warn!("Job queue needs PostgreSQL; order confirmations will only be logged");
        return Ok(Arc::new(LogNotifier));
    }

    let pool = queue_pool(config).await?;
    let storage: PostgresStorage<OrderConfirmationJob> = PostgresStorage::new(pool);
    Ok(Arc::new(QueueNotifier::new(storage)))
}

/// Execute the serve command
pub async fn execute(args: ServeArgs, config: Config) -> AppResult<()> {
    tracing::info!("Starting server...");

    let db = Database::connect(&config)
        .await
        .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;
    let db = Arc::new(db);

    let cache = connect_store(&config).await?;
    tracing::info!(driver = ?config.cache_driver, "Cache connected");

    let notifier = order_notifier(&config).await?;

    let app_state = AppState::from_config(db, cache, notifier, config);
    let app = create_router(app_state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Server running on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    Ok(())
}
