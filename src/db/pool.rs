//! Connection pool lifecycle.
//!
//! [`ConnectionManager`] owns the pooled connection resource for the process.
//! The pool is created lazily on first use and, under the default
//! [`PoolPolicy::Ephemeral`], torn down again after every dispatcher call.

use crate::config::{DatabaseConfig, PoolPolicy};
use crate::error::{DomainError, DomainResult};
use crate::models::Engine;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{PgPool, SqlitePool};
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

/// Engine-specific connection pool.
#[derive(Debug, Clone)]
pub enum DbPool {
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

impl DbPool {
    pub async fn close(&self) {
        match self {
            DbPool::Postgres(pool) => pool.close().await,
            DbPool::Sqlite(pool) => pool.close().await,
        }
    }

    pub fn engine(&self) -> Engine {
        match self {
            DbPool::Postgres(_) => Engine::Postgres,
            DbPool::Sqlite(_) => Engine::Sqlite,
        }
    }
}

/// Owns the connection target and the (possibly absent) live pool.
#[derive(Debug)]
pub struct ConnectionManager {
    url: String,
    engine: Engine,
    policy: PoolPolicy,
    max_connections: u32,
    acquire_timeout: Duration,
    pool: RwLock<Option<DbPool>>,
}

impl ConnectionManager {
    /// Build a manager from configuration. The target string is validated for
    /// shape only; no connection is attempted here.
    pub fn new(config: &DatabaseConfig) -> DomainResult<Self> {
        let engine = config.engine().ok_or_else(|| {
            DomainError::unknown(format!("unsupported database scheme '{}'", config.scheme))
        })?;
        let url = config.connection_url();
        Url::parse(&url)
            .map_err(|e| DomainError::unknown(format!("invalid connection target: {e}")))?;

        Ok(Self {
            url,
            engine,
            policy: config.pool_policy,
            // 0 would make every acquire time out; the floor is one.
            max_connections: config.max_connections.max(1),
            acquire_timeout: config.acquire_timeout,
            pool: RwLock::new(None),
        })
    }

    pub fn engine(&self) -> Engine {
        self.engine
    }

    pub fn policy(&self) -> PoolPolicy {
        self.policy
    }

    /// Hand out the live pool, establishing it first when absent.
    pub async fn acquire(&self) -> DomainResult<DbPool> {
        {
            let slot = self.pool.read().await;
            if let Some(pool) = slot.as_ref() {
                return Ok(pool.clone());
            }
        }

        let mut slot = self.pool.write().await;
        // Re-check: another task may have raced us to the write lock.
        if let Some(pool) = slot.as_ref() {
            return Ok(pool.clone());
        }

        let pool = self.create_pool()?;
        debug!(engine = %self.engine, "connection pool established");
        *slot = Some(pool.clone());
        Ok(pool)
    }

    /// Tear down the live pool. Safe to call with none; never fails.
    pub async fn dispose(&self) {
        let taken = { self.pool.write().await.take() };
        if let Some(pool) = taken {
            pool.close().await;
            debug!(engine = %self.engine, "connection pool disposed");
        }
    }

    /// End-of-call hook: disposes the pool under the ephemeral policy.
    pub async fn release(&self) {
        if self.policy == PoolPolicy::Ephemeral {
            self.dispose().await;
        }
    }

    fn create_pool(&self) -> DomainResult<DbPool> {
        match self.engine {
            Engine::Postgres => {
                let pool = PgPoolOptions::new()
                    .max_connections(self.max_connections)
                    .acquire_timeout(self.acquire_timeout)
                    .connect_lazy(&self.url)
                    .map_err(|e| {
                        DomainError::unknown(format!("invalid connection target: {e}"))
                    })?;
                Ok(DbPool::Postgres(pool))
            }
            Engine::Sqlite => {
                let options = SqliteConnectOptions::from_str(&self.url)
                    .map_err(|e| {
                        DomainError::unknown(format!("invalid connection target: {e}"))
                    })?
                    .create_if_missing(true)
                    .foreign_keys(true);

                // A single connection; concurrent writers would only contend
                // on the file lock.
                let pool = SqlitePoolOptions::new()
                    .max_connections(1)
                    .acquire_timeout(self.acquire_timeout)
                    .connect_lazy_with(options);
                Ok(DbPool::Sqlite(pool))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lazy_construction_without_server() {
        // No PostgreSQL server is running; construction must still succeed.
        let config = DatabaseConfig {
            scheme: "postgres".into(),
            username: "u".into(),
            password: "p".into(),
            host: "localhost".into(),
            port: 5432,
            db_name: "none".into(),
            pool_policy: PoolPolicy::Ephemeral,
            max_connections: 5,
            acquire_timeout: Duration::from_secs(1),
        };
        let manager = ConnectionManager::new(&config).unwrap();
        assert_eq!(manager.engine(), Engine::Postgres);
        assert!(manager.acquire().await.is_ok());
    }

    #[tokio::test]
    async fn test_dispose_is_idempotent() {
        let config = DatabaseConfig::sqlite(":memory:");
        let manager = ConnectionManager::new(&config).unwrap();
        manager.dispose().await;
        manager.acquire().await.unwrap();
        manager.dispose().await;
        manager.dispose().await;
    }

    #[tokio::test]
    async fn test_zero_max_connections_still_serves() {
        let mut config = DatabaseConfig::sqlite(":memory:");
        config.max_connections = 0;
        config.pool_policy = PoolPolicy::Persistent;

        let manager = ConnectionManager::new(&config).unwrap();
        let DbPool::Sqlite(pool) = manager.acquire().await.unwrap() else {
            panic!("expected a sqlite pool");
        };
        sqlx::query("SELECT 1").execute(&pool).await.unwrap();
    }

    #[test]
    fn test_unsupported_scheme_rejected() {
        let mut config = DatabaseConfig::sqlite("x.db");
        config.scheme = "mysql".into();
        assert!(ConnectionManager::new(&config).is_err());
    }
}
