//! MySQL connection pool management

use std::time::Duration;

use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use tracing::info;

use ts_core::errors::{DomainError, DomainResult};
use ts_shared::config::DatabaseConfig;

/// Wrapper around the SQLx MySQL pool, built from [`DatabaseConfig`]
#[derive(Clone)]
pub struct DatabasePool {
    pool: MySqlPool,
}

impl DatabasePool {
    /// Connect to the database and build the pool
    pub async fn connect(config: &DatabaseConfig) -> DomainResult<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout))
            .idle_timeout(Duration::from_secs(config.idle_timeout))
            .max_lifetime(Duration::from_secs(config.max_lifetime))
            .connect(&config.url)
            .await
            .map_err(|e| DomainError::Internal {
                message: format!("Failed to connect to database: {}", e),
            })?;

        info!(
            max_connections = config.max_connections,
            "database pool established"
        );

        Ok(Self { pool })
    }

    /// Connect using `DATABASE_URL` and related environment variables
    pub async fn connect_from_env() -> DomainResult<Self> {
        dotenvy::dotenv().ok();
        Self::connect(&DatabaseConfig::from_env()).await
    }

    /// The underlying SQLx pool
    pub fn inner(&self) -> &MySqlPool {
        &self.pool
    }

    /// Verify connectivity with a trivial query
    pub async fn ping(&self) -> DomainResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Internal {
                message: format!("Database ping failed: {}", e),
            })?;
        Ok(())
    }
}
