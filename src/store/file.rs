use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{ScriptStore, StoreError, StoreResult};

/// Directory-backed store holding one JSON file per video.
///
/// File names are the SHA-256 of the video key, so arbitrary URLs map to safe
/// names. Each write goes to its own temporary file in the same directory and
/// is renamed into place, so concurrent writers of one key never share a file
/// and readers only ever see a complete value.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) the store directory.
    pub async fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        info!("File store rooted at {}", root.display());
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        self.root.join(format!("{:x}.json", hasher.finalize()))
    }
}

#[async_trait]
impl ScriptStore for FileStore {
    fn backend_name(&self) -> &'static str {
        "file"
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(key);
        debug!("file get {} -> {}", key, path.display());
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn put(&self, key: &str, value: String) -> StoreResult<()> {
        let path = self.path_for(key);
        let root = self.root.clone();
        debug!("file put {} -> {}", key, path.display());
        tokio::task::spawn_blocking(move || -> StoreResult<()> {
            let mut tmp = tempfile::NamedTempFile::new_in(&root)?;
            tmp.write_all(value.as_bytes())?;
            tmp.as_file().sync_all()?;
            tmp.persist(&path).map_err(|err| err.error)?;
            Ok(())
        })
        .await
        .map_err(|err| StoreError::backend_with_source("file write task failed", err))?
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key);
        debug!("file delete {} -> {}", key, path.display());
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn health_check(&self) -> StoreResult<()> {
        let meta = tokio::fs::metadata(&self.root).await?;
        if meta.is_dir() {
            Ok(())
        } else {
            Err(StoreError::backend(format!(
                "{} is not a directory",
                self.root.display()
            )))
        }
    }
}
