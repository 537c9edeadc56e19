//! Script registry service.
//!
//! Each operation validates its references, reads the video's collection once,
//! runs the invariant engine in memory and issues at most one write or delete.
//! Nothing is locked between the read and the write; see [`crate::store`] for
//! what that means for concurrent writers on the same video.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use crate::collection::{Collection, ScriptPatch, ScriptRecord};
use crate::engine::{self, Removal, Upserted};
use crate::error::{ReferenceKind, RegistryError, RegistryResult};
use crate::store::{ScriptStore, StoreError};
use crate::validation::{is_valid_script_reference, is_valid_support_url, is_valid_video_reference};

/// Outcome of a successful removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveOutcome {
    /// True when the video has no scripts left and its entry was deleted
    pub all_removed: bool,
}

#[derive(Clone)]
pub struct ScriptRegistry {
    store: Arc<dyn ScriptStore>,
}

impl ScriptRegistry {
    pub fn new(store: Arc<dyn ScriptStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ScriptStore> {
        &self.store
    }

    /// Return every script registered for `video`.
    pub async fn list(&self, video: &str) -> RegistryResult<Collection> {
        check_video(video)?;
        match self.load(video).await? {
            Some(collection) if !collection.is_empty() => Ok(collection),
            _ => Err(RegistryError::VideoNotFound),
        }
    }

    /// Create or update the script at `script` for `video` and return the
    /// stored record.
    pub async fn upsert(
        &self,
        video: &str,
        script: &str,
        patch: ScriptPatch,
    ) -> RegistryResult<ScriptRecord> {
        check_video(video)?;
        if !is_valid_script_reference(script) {
            return Err(RegistryError::invalid_reference(ReferenceKind::Script, script));
        }
        if let Some(support_url) = &patch.support_url
            && !is_valid_support_url(support_url)
        {
            return Err(RegistryError::invalid_reference(
                ReferenceKind::SupportUrl,
                support_url.as_str(),
            ));
        }

        let current = self.load(video).await?.unwrap_or_default();
        if !current.contains(script) && patch.name.is_none() {
            return Err(RegistryError::InvalidMetadata(
                "name is required when adding a script".to_string(),
            ));
        }

        let Upserted {
            collection: updated,
            record,
        } = engine::apply_upsert(current, script, patch, Utc::now());
        self.save(video, &updated).await?;

        info!(
            "Upserted script {} for video {} (default: {}, total: {})",
            script,
            video,
            record.is_default,
            updated.len()
        );
        Ok(record)
    }

    /// Remove `script` from `video`, deleting the video entry when it was the
    /// last one.
    pub async fn remove(&self, video: &str, script: &str) -> RegistryResult<RemoveOutcome> {
        check_video(video)?;
        let current = self
            .load(video)
            .await?
            .ok_or(RegistryError::VideoNotFound)?;
        if !current.contains(script) {
            return Err(RegistryError::ScriptNotFound);
        }

        match engine::apply_removal(current, script, Utc::now())? {
            Removal::Deleted => {
                self.store.delete(video).await?;
                info!("Removed last script {} for video {}", script, video);
                Ok(RemoveOutcome { all_removed: true })
            }
            Removal::Updated(collection) => {
                self.save(video, &collection).await?;
                info!(
                    "Removed script {} for video {} ({} remaining)",
                    script,
                    video,
                    collection.len()
                );
                Ok(RemoveOutcome { all_removed: false })
            }
        }
    }

    async fn load(&self, video: &str) -> RegistryResult<Option<Collection>> {
        let Some(raw) = self.store.get(video).await? else {
            debug!("No collection stored for {}", video);
            return Ok(None);
        };
        let collection = Collection::from_json(&raw).map_err(|source| StoreError::Corrupt {
            key: video.to_string(),
            source,
        })?;
        Ok(Some(collection))
    }

    async fn save(&self, video: &str, collection: &Collection) -> RegistryResult<()> {
        let raw = collection.to_json().map_err(|source| StoreError::Serialize {
            key: video.to_string(),
            source,
        })?;
        self.store.put(video, raw).await?;
        Ok(())
    }
}

fn check_video(video: &str) -> RegistryResult<()> {
    if is_valid_video_reference(video) {
        Ok(())
    } else {
        Err(RegistryError::invalid_reference(ReferenceKind::Video, video))
    }
}
