//! Default-script invariant engine.
//!
//! Every mutation of a [`Collection`] goes through [`apply_upsert`] or
//! [`apply_removal`]. Both are pure: the caller supplies the current
//! collection and the mutation time, and persists whatever comes back.
//!
//! After either call a non-empty collection has exactly one record with
//! `is_default` set. When no record asks to be the default, the
//! earliest-inserted record is promoted.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::warn;

use crate::collection::{Collection, ScriptPatch, ScriptRecord};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("Script {0} is not part of the collection")]
    MissingScript(String),
}

/// Result of an upsert: the collection to persist and the record as stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upserted {
    pub collection: Collection,
    pub record: ScriptRecord,
}

/// Result of removing a script from a collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    /// The last script was removed; the video entry must be deleted.
    Deleted,
    /// Scripts remain and the collection must be written back.
    Updated(Collection),
}

/// Merge `patch` into the record at `script` and restore the single-default
/// invariant.
///
/// A new record is appended at the end of the collection. Any record whose
/// default flag changes as a side effect gets `now` as its `last_updated`.
pub fn apply_upsert(
    mut collection: Collection,
    script: &str,
    patch: ScriptPatch,
    now: DateTime<Utc>,
) -> Upserted {
    let wants_default = {
        let record = collection
            .entries_mut()
            .entry(script.to_string())
            .or_insert_with(ScriptRecord::default);
        record.merge(patch);
        record.last_updated = Some(now);
        record.is_default
    };

    let entries = collection.entries_mut();
    if wants_default {
        // exclusive promotion: the upserted record wins
        for (key, other) in entries.iter_mut() {
            if key != script && other.is_default {
                other.is_default = false;
                other.last_updated = Some(now);
            }
        }
    } else if entries.len() == 1 {
        if let Some(record) = entries.get_mut(script) {
            record.is_default = true;
        }
    } else {
        ensure_single_default(&mut collection, now);
    }

    // the entry was inserted above, so indexing cannot miss
    let record = collection.entries_mut()[script].clone();
    Upserted { collection, record }
}

/// Remove `script` from the collection, promoting the earliest-inserted
/// remaining record if the removed one was the default.
pub fn apply_removal(
    mut collection: Collection,
    script: &str,
    now: DateTime<Utc>,
) -> Result<Removal, EngineError> {
    if collection
        .entries_mut()
        .shift_remove(script)
        .is_none()
    {
        return Err(EngineError::MissingScript(script.to_string()));
    }

    if collection.is_empty() {
        return Ok(Removal::Deleted);
    }

    ensure_single_default(&mut collection, now);
    Ok(Removal::Updated(collection))
}

/// Leave exactly one default in a non-empty collection.
///
/// With no default the first record is promoted. With several (only possible
/// when a concurrent write was lost in the store) the earliest one is kept.
fn ensure_single_default(collection: &mut Collection, now: DateTime<Utc>) {
    let mut seen_default = false;
    let mut repaired = 0usize;

    for record in collection.entries_mut().values_mut() {
        if record.is_default {
            if seen_default {
                record.is_default = false;
                record.last_updated = Some(now);
                repaired += 1;
            }
            seen_default = true;
        }
    }

    if repaired > 0 {
        warn!("Demoted {} duplicate default script(s)", repaired);
    }

    if !seen_default && let Some((_, first)) = collection.entries_mut().first_mut() {
        first.is_default = true;
        first.last_updated = Some(now);
    }
}
