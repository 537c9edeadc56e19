use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{ScriptStore, StoreError, StoreResult};
use crate::config::StoreConfig;

/// PostgreSQL-backed store using a single `script_collections` table.
///
/// `put` is a plain upsert on the primary key; there is no version column, so
/// concurrent writers on one video behave exactly like the other backends.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect using the store configuration, running migrations if enabled.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let connection_string = config.connection_string.as_deref().ok_or_else(|| {
            StoreError::backend("store.connection_string is required for the postgresql backend")
        })?;

        info!("Connecting to database...");
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_millis(config.acquire_timeout_ms))
            .connect(connection_string)
            .await?;
        info!("Database connection established");

        let store = Self { pool };
        if config.auto_migrate {
            store.migrate().await?;
        } else {
            warn!("Auto-migration is disabled. Run migrations manually with: sqlx migrate run");
        }
        store.health_check().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::backend_with_source("Failed to run migrations", e))?;
        info!("Database migrations completed successfully");
        Ok(())
    }
}

#[async_trait]
impl ScriptStore for PostgresStore {
    fn backend_name(&self) -> &'static str {
        "postgresql"
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        debug!("postgres get {}", key);
        let row = sqlx::query(
            r#"
            SELECT scripts
            FROM script_collections
            WHERE video_key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get::<String, _>("scripts")))
    }

    async fn put(&self, key: &str, value: String) -> StoreResult<()> {
        debug!("postgres put {} ({} bytes)", key, value.len());
        sqlx::query(
            r#"
            INSERT INTO script_collections (video_key, scripts, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (video_key)
            DO UPDATE SET scripts = EXCLUDED.scripts, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        debug!("postgres delete {}", key);
        sqlx::query("DELETE FROM script_collections WHERE video_key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
