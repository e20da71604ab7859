//! Jobs command - Background job management.
//!
//! - `work`: run the email and order confirmation workers
//! - `list`: job counts per queue and status
//! - `clear`: remove failed jobs
//!
//! ## Usage
//!
//! ```bash
//! cargo run -- jobs work
//! cargo run -- jobs list
//! cargo run -- jobs clear
//! ```

use apalis::prelude::*;
use apalis_sql::postgres::PostgresStorage;
use apalis_sql::sqlx::postgres::{PgPool, PgPoolOptions};
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement};

use crate::cli::args::{JobsAction, JobsArgs};
use crate::config::{Config, JOB_NAME_EMAIL, JOB_NAME_ORDER_CONFIRMATION};
use crate::errors::{AppError, AppResult};
use crate::jobs::{email_job_handler, order_confirmation_handler, EmailJob, OrderConfirmationJob};

/// Execute the jobs command
pub async fn execute(args: JobsArgs, config: Config) -> AppResult<()> {
    match args.action {
        JobsAction::Work => run_worker(&config).await,
        JobsAction::List => list_jobs(&config).await,
        JobsAction::Clear => clear_failed_jobs(&config).await,
    }
}

/// Connect the queue pool and make sure the apalis tables exist.
pub(crate) async fn queue_pool(config: &Config) -> AppResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .map_err(|e| AppError::internal(format!("Failed to connect job queue: {}", e)))?;

    PostgresStorage::setup(&pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to setup job storage: {}", e)))?;

    Ok(pool)
}

/// Start the background job workers
async fn run_worker(config: &Config) -> AppResult<()> {
    tracing::info!("Connecting to database for job worker...");
    let pool = queue_pool(config).await?;

    let email_storage: PostgresStorage<EmailJob> = PostgresStorage::new(pool.clone());
    let confirmation_storage: PostgresStorage<OrderConfirmationJob> = PostgresStorage::new(pool);

    let email_worker = WorkerBuilder::new(JOB_NAME_EMAIL)
        .backend(email_storage)
        .build_fn(email_job_handler);
    let confirmation_worker = WorkerBuilder::new(JOB_NAME_ORDER_CONFIRMATION)
        .backend(confirmation_storage)
        .build_fn(order_confirmation_handler);

    let monitor = Monitor::new()
        .register(email_worker)
        .register(confirmation_worker);

    tracing::info!("Job workers started. Press Ctrl+C to stop.");

    tokio::select! {
        result = monitor.run() => {
            if let Err(e) = result {
                tracing::error!("Worker error: {}", e);
                return Err(AppError::internal(format!("Worker failed: {}", e)));
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping workers...");
        }
    }

    tracing::info!("Job workers stopped.");
    Ok(())
}

async fn connect(config: &Config) -> AppResult<DatabaseConnection> {
    tracing::info!("Connecting to database...");
    sea_orm::Database::connect(&config.database_url)
        .await
        .map_err(|e| AppError::internal(format!("Failed to connect to database: {}", e)))
}

async fn queue_initialized(db: &DatabaseConnection) -> AppResult<bool> {
    let row = db
        .query_one(Statement::from_string(
            DatabaseBackend::Postgres,
            "SELECT EXISTS(SELECT 1 FROM information_schema.schemata WHERE schema_name = 'apalis') as exists",
        ))
        .await?;

    Ok(row
        .and_then(|r| r.try_get::<bool>("", "exists").ok())
        .unwrap_or(false))
}

/// Job counts per queue and status
async fn list_jobs(config: &Config) -> AppResult<()> {
    let db = connect(config).await?;

    println!("\n=== Job Queue Status ===");
    if !queue_initialized(&db).await? {
        println!("Job queue not initialized.");
        println!("Run 'jobs work' first to create the queue tables.");
        println!("========================\n");
        return Ok(());
    }

    let rows = db
        .query_all(Statement::from_string(
            DatabaseBackend::Postgres,
            "SELECT job_type, status::text as status, COUNT(*)::bigint as count \
             FROM apalis.jobs GROUP BY job_type, status ORDER BY job_type, status",
        ))
        .await?;

    if rows.is_empty() {
        println!("No jobs.");
    }
    for row in rows {
        if let (Ok(job_type), Ok(status), Ok(count)) = (
            row.try_get::<String>("", "job_type"),
            row.try_get::<String>("", "status"),
            row.try_get::<i64>("", "count"),
        ) {
            println!("{:<40} {:<10} {}", job_type, status, count);
        }
    }
    println!("========================\n");

    Ok(())
}

/// Clear failed jobs from the queue
async fn clear_failed_jobs(config: &Config) -> AppResult<()> {
    let db = connect(config).await?;

    if !queue_initialized(&db).await? {
        println!("Job queue not initialized. Nothing to clear.");
        return Ok(());
    }

    let result = db
        .execute(Statement::from_string(
            DatabaseBackend::Postgres,
            "DELETE FROM apalis.jobs WHERE status = 'Failed'",
        ))
        .await?;

    println!(
        "Cleared {} failed job(s) from the queue.",
        result.rows_affected()
    );
    Ok(())
}
