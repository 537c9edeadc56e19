//! Key-value storage for serialized script collections.
//!
//! The registry only needs unconditional `get`/`put`/`delete` keyed by video.
//! None of the backends offer a conditional write, so two concurrent writers
//! on the same video race and the later `put` wins. A versioned
//! compare-and-swap would be added to [`ScriptStore`] if stricter ordering is
//! ever required.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::config::{StoreBackend, StoreConfig};

mod file;
mod memory;
mod postgres;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Errors raised by a storage backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage backend error: {message}")]
    Backend {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Stored collection for {key} is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize collection for {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
            source: None,
        }
    }

    pub fn backend_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Backend {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::backend_with_source(format!("I/O failure: {}", err), err)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::backend_with_source(format!("Database failure: {}", err), err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Unconditional key-value access to serialized collections.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScriptStore: Send + Sync {
    /// Short backend name used in logs and health output.
    fn backend_name(&self) -> &'static str;

    /// Fetch the serialized collection for `key`, if any.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store `value` under `key`, replacing what was there.
    async fn put(&self, key: &str, value: String) -> StoreResult<()>;

    /// Remove `key`. Removing a missing key succeeds.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Verify the backend is reachable.
    async fn health_check(&self) -> StoreResult<()>;
}

/// Open the backend selected by the configuration.
pub async fn open_store(config: &StoreConfig) -> anyhow::Result<Arc<dyn ScriptStore>> {
    let store: Arc<dyn ScriptStore> = match config.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::File => {
            let dir = config
                .data_dir
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("store.data_dir is required for the file backend"))?;
            Arc::new(FileStore::open(dir).await?)
        }
        StoreBackend::Postgresql => Arc::new(PostgresStore::connect(config).await?),
    };

    info!("Using {} script store", store.backend_name());
    Ok(store)
}
