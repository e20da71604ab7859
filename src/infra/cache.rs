//! Cache backends.
//!
//! [`CacheStore`] is the object-safe seam: string values with a TTL plus a
//! fixed-window rate limit counter. Redis backs it in production and an
//! in-process [`MemoryStore`] backs it in development and tests. Typed
//! JSON access and cache-aside reads live on `dyn CacheStore`.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};
use serde::{de::DeserializeOwned, Serialize};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

use crate::config::{CacheDriver, Config, CACHE_PREFIX_RATE_LIMIT, DEFAULT_CACHE_TTL_SECONDS};
use crate::errors::{AppError, AppResult};

/// Key/value store with expiry.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get_raw(&self, key: &str) -> AppResult<Option<String>>;

    async fn set_raw(&self, key: &str, value: String, ttl_seconds: u64) -> AppResult<()>;

    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Delete several keys in one round trip
    async fn delete_many(&self, keys: &[String]) -> AppResult<()>;

    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Count a hit against `identifier` in the current window.
    /// Returns `(count, allowed)`.
    async fn check_rate_limit(
        &self,
        identifier: &str,
        max_requests: u64,
        window_seconds: u64,
    ) -> AppResult<(u64, bool)>;
}

impl dyn CacheStore {
    /// Get a JSON value from cache.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        match self.get_raw(key).await? {
            Some(json) => {
                let parsed = serde_json::from_str(&json).map_err(|e| {
                    AppError::internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    /// Set a JSON value in cache with a TTL in seconds.
    pub async fn set<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: u64,
    ) -> AppResult<()> {
        let json = serde_json::to_string(value)
            .map_err(|e| AppError::internal(format!("Cache serialization error: {}", e)))?;
        self.set_raw(key, json, ttl_seconds).await
    }

    /// Cache-aside read.
    ///
    /// A cache failure never fails the request: read errors fall through to
    /// `fetch` and write errors are only logged.
    pub async fn remember<T, F, Fut>(&self, key: &str, ttl_seconds: u64, fetch: F) -> AppResult<T>
    where
        T: Serialize + DeserializeOwned + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        match self.get::<T>(key).await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(e) => tracing::warn!(key, error = %e, "Cache read failed, using database"),
        }

        let value = fetch().await?;
        if let Err(e) = self.set(key, &value, ttl_seconds).await {
            tracing::warn!(key, error = %e, "Cache write failed");
        }
        Ok(value)
    }
}

/// Connect the backend selected by `CACHE_DRIVER`.
pub async fn connect_store(config: &Config) -> AppResult<Arc<dyn CacheStore>> {
    match config.cache_driver {
        CacheDriver::Redis => {
            let cache = Cache::try_connect(config).await.map_err(cache_error)?;
            tracing::info!("Redis cache connected");
            Ok(Arc::new(cache))
        }
        CacheDriver::Memory => {
            tracing::info!("Using in-memory cache");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Redis cache wrapper with connection pooling.
#[derive(Clone)]
pub struct Cache {
    connection: ConnectionManager,
}

impl Cache {
    /// Try to connect to Redis, returning an error instead of panicking.
    pub async fn try_connect(config: &Config) -> Result<Self, RedisError> {
        let client = Client::open(config.redis_url.as_str())?;
        let connection = ConnectionManager::new(client).await?;

        Ok(Self { connection })
    }
}

#[async_trait]
impl CacheStore for Cache {
    async fn get_raw(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(key).await.map_err(cache_error)?;
        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: String, ttl_seconds: u64) -> AppResult<()> {
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds)
            .await
            .map_err(cache_error)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _: () = conn.del(key).await.map_err(cache_error)?;
        Ok(())
    }

    async fn delete_many(&self, keys: &[String]) -> AppResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection.clone();
        let _: i64 = conn.del(keys).await.map_err(cache_error)?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let mut conn = self.connection.clone();
        let exists: bool = conn.exists(key).await.map_err(cache_error)?;
        Ok(exists)
    }

    async fn check_rate_limit(
        &self,
        identifier: &str,
        max_requests: u64,
        window_seconds: u64,
    ) -> AppResult<(u64, bool)> {
        let key = format!("{}{}", CACHE_PREFIX_RATE_LIMIT, identifier);
        let mut conn = self.connection.clone();

        let count: i64 = conn.incr(&key, 1).await.map_err(cache_error)?;
        if count == 1 {
            // First hit opens the window
            let _: () = conn
                .expire(&key, window_seconds as i64)
                .await
                .map_err(cache_error)?;
        }

        let count = count as u64;
        Ok((count, count <= max_requests))
    }
}

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Writes between two sweeps of expired keys
const MEMORY_SWEEP_INTERVAL: u64 = 256;

/// In-process cache for single-node deployments and tests.
///
/// Expired values and elapsed rate limit windows are swept every
/// `MEMORY_SWEEP_INTERVAL` writes, so keys that are never read again do
/// not pile up.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
    counters: DashMap<String, (u64, Instant)>,
    writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Must not be called while holding a reference into either map.
    fn note_write(&self, now: Instant) {
        if self.writes.fetch_add(1, Ordering::Relaxed) % MEMORY_SWEEP_INTERVAL == 0 {
            self.purge_expired(now);
        }
    }

    fn purge_expired(&self, now: Instant) {
        self.entries.retain(|_, entry| entry.is_live(now));
        self.counters.retain(|_, (_, reset_at)| now < *reset_at);
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get_raw(&self, key: &str) -> AppResult<Option<String>> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.is_live(now) {
                return Ok(Some(entry.value.clone()));
            }
        }
        self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        Ok(None)
    }

    async fn set_raw(&self, key: &str, value: String, ttl_seconds: u64) -> AppResult<()> {
        let ttl = if ttl_seconds == 0 {
            DEFAULT_CACHE_TTL_SECONDS
        } else {
            ttl_seconds
        };
        let now = Instant::now();
        self.note_write(now);
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: now + Duration::from_secs(ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn delete_many(&self, keys: &[String]) -> AppResult<()> {
        for key in keys {
            self.entries.remove(key);
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.get_raw(key).await?.is_some())
    }

    async fn check_rate_limit(
        &self,
        identifier: &str,
        max_requests: u64,
        window_seconds: u64,
    ) -> AppResult<(u64, bool)> {
        let now = Instant::now();
        let window = Duration::from_secs(window_seconds);
        let key = format!("{}{}", CACHE_PREFIX_RATE_LIMIT, identifier);
        self.note_write(now);

        let mut counter = self.counters.entry(key).or_insert((0, now + window));
        if now >= counter.1 {
            *counter = (0, now + window);
        }
        counter.0 += 1;

        let count = counter.0;
        Ok((count, count <= max_requests))
    }
}

/// Convert Redis error to AppError.
fn cache_error(e: RedisError) -> AppError {
    tracing::error!("Redis error: {}", e);
    AppError::unavailable(format!("Cache error: {}", e))
}
