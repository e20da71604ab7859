//! Application state - Dependency injection container.
//!
//! Provides centralized access to all application services and infrastructure.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::{CacheStore, Database};
use crate::jobs::OrderNotifier;
use crate::services::{ServiceContainer, Services};

/// Application state shared by every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<dyn ServiceContainer>,
    /// Cache store, also backing rate limiting and token revocation
    pub cache: Arc<dyn CacheStore>,
    pub database: Arc<Database>,
    /// Public base URL for pagination links, without trailing slash
    pub app_url: String,
}

impl AppState {
    /// Wire the production service container from its infrastructure.
    pub fn from_config(
        database: Arc<Database>,
        cache: Arc<dyn CacheStore>,
        notifier: Arc<dyn OrderNotifier>,
        config: Config,
    ) -> Self {
        let app_url = config.app_url.clone();
        let services = Services::from_connection(
            database.get_connection(),
            cache.clone(),
            notifier,
            config,
        );

        Self::new(Arc::new(services), cache, database, app_url)
    }

    /// Create application state with manually injected services.
    pub fn new(
        services: Arc<dyn ServiceContainer>,
        cache: Arc<dyn CacheStore>,
        database: Arc<Database>,
        app_url: impl Into<String>,
    ) -> Self {
        Self {
            services,
            cache,
            database,
            app_url: app_url.into(),
        }
    }
}

#[cfg(test)]
impl AppState {
    /// State around mocked services, an in-process cache and no database.
    pub(crate) fn mocked(services: crate::services::MockServiceContainer) -> Self {
        Self::new(
            Arc::new(services),
            Arc::new(crate::infra::MemoryStore::new()),
            Arc::new(Database::from_connection(Default::default())),
            "http://localhost:3000",
        )
    }
}
