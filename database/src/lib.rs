// Persistence layer for the subscription service.
// Owns the Postgres pool, the embedded migrations and the subscription repository.

pub mod config;
pub mod error;
pub mod models;
pub mod repositories;

// Re-export commonly used items
pub use sqlx;
pub use uuid;
pub use chrono;
pub use config::DatabaseConfig;
pub use error::RepositoryError;
pub use models::{CostFilter, NewSubscription, Subscription, SubscriptionUpdate};
pub use repositories::{PgSubscriptionRepository, SubscriptionRepository};

use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::Span;

/// Database connection manager
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Open a connection pool from configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .connect(&config.url())
            .await
            .with_context(|| {
                format!(
                    "Failed to connect to database {} at {}:{}",
                    config.name, config.host, config.port
                )
            })?;

        Ok(Self { pool })
    }

    /// Wrap an already opened pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending forward-only migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run migrations")?;
        Ok(())
    }

    /// Subscription repository sharing this pool, logging under `logger`
    pub fn subscriptions(&self, logger: &Span) -> PgSubscriptionRepository {
        PgSubscriptionRepository::new(self.pool.clone(), logger)
    }
}
