//! Script records and the per-video collection they live in.
//!
//! A [`Collection`] is stored as one JSON object under a video key. Key order
//! in that object is the insertion order of the scripts, and it is preserved
//! across a load/save cycle because automatic default promotion depends on it.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Metadata describing one interactive script for a video
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScriptRecord {
    /// Display name of the script
    #[schema(example = "Script Name")]
    pub name: String,
    /// Author of the script
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "Creator Name")]
    pub creator: Option<String>,
    /// Page where the script author can be supported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "https://creator.com/support")]
    pub support_url: Option<String>,
    /// Whether this is the script players pick when none is chosen
    #[serde(default)]
    pub is_default: bool,
    /// Server-assigned time of the last write touching this record
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "timestamp"
    )]
    pub last_updated: Option<DateTime<Utc>>,
}

impl ScriptRecord {
    /// Overlay the fields present in `patch`. Absent fields keep their value.
    pub fn merge(&mut self, patch: ScriptPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(creator) = patch.creator {
            self.creator = Some(creator);
        }
        if let Some(support_url) = patch.support_url {
            self.support_url = Some(support_url);
        }
        if let Some(is_default) = patch.is_default {
            self.is_default = is_default;
        }
    }
}

/// Partial script record accepted by the upsert operation.
///
/// A `lastUpdated` sent by a client is ignored; the server always assigns it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScriptPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "Script Name")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

/// All scripts known for one video, keyed by script URL in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection {
    scripts: IndexMap<String, ScriptRecord>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the serialized form held by the store.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Serialize into the form held by the store.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    pub fn contains(&self, script: &str) -> bool {
        self.scripts.contains_key(script)
    }

    pub fn get(&self, script: &str) -> Option<&ScriptRecord> {
        self.scripts.get(script)
    }

    /// Iterate records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScriptRecord)> {
        self.scripts.iter().map(|(key, record)| (key.as_str(), record))
    }

    /// Script keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.scripts.keys().map(String::as_str)
    }

    /// Keys of every record flagged as default, in insertion order.
    pub fn default_keys(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, record)| record.is_default)
            .map(|(key, _)| key)
            .collect()
    }

    pub(crate) fn entries_mut(&mut self) -> &mut IndexMap<String, ScriptRecord> {
        &mut self.scripts
    }
}

impl FromIterator<(String, ScriptRecord)> for Collection {
    fn from_iter<I: IntoIterator<Item = (String, ScriptRecord)>>(iter: I) -> Self {
        Self {
            scripts: iter.into_iter().collect(),
        }
    }
}

/// ISO-8601 timestamps in UTC with millisecond precision, e.g.
/// `2026-10-15T09:30:00.000Z`.
mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| {
                DateTime::parse_from_rfc3339(&raw)
                    .map(|ts| ts.with_timezone(&Utc))
                    .map_err(D::Error::custom)
            })
            .transpose()
    }
}
