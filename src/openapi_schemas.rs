//! Request and response bodies of the HTTP API.
//!
//! These are shared by the handlers and the generated OpenAPI document.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::collection::{ScriptPatch, ScriptRecord};

// ============================================================================
// Error Schemas
// ============================================================================

/// Error body for every 4xx and 5xx response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    #[schema(example = "No scripts found for this video")]
    pub error: String,
    /// Underlying cause, only present on internal errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

// ============================================================================
// Script Schemas
// ============================================================================

/// Body of an upsert request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpsertRequest {
    /// Fields to set on the script; omitted fields keep their current value
    pub metadata: ScriptPatch,
}

/// Result of an upsert
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpsertResponse {
    pub success: bool,
    #[schema(example = "Script metadata updated")]
    pub message: String,
    /// The script record as stored
    pub data: ScriptRecord,
}

/// Result of a delete
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
    #[schema(example = "Script removed")]
    pub message: String,
}

// ============================================================================
// Health Check Schemas
// ============================================================================

/// Build and version metadata
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "cargo": "0.1.0",
    "git_commit": "abc123def456",
    "git_commit_timestamp": "2026-10-15T10:30:00+00:00",
    "build_timestamp": "2026-10-15T10:35:00+00:00"
}))]
pub struct BuildVersion {
    /// Cargo package version from Cargo.toml
    pub cargo: String,
    /// Git commit hash - empty if git unavailable
    pub git_commit: String,
    /// Git commit timestamp in ISO 8601 format - empty if git unavailable
    pub git_commit_timestamp: String,
    /// Build timestamp in ISO 8601 format - empty if unavailable
    pub build_timestamp: String,
}

impl BuildVersion {
    pub fn current() -> Self {
        Self {
            cargo: env!("CARGO_PKG_VERSION").to_string(),
            git_commit: option_env!("VERGEN_GIT_SHA").unwrap_or_default().to_string(),
            git_commit_timestamp: option_env!("VERGEN_GIT_COMMIT_TIMESTAMP")
                .unwrap_or_default()
                .to_string(),
            build_timestamp: option_env!("VERGEN_BUILD_TIMESTAMP")
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,
    /// Current timestamp
    pub timestamp: String,
    /// Build and version information
    pub version: BuildVersion,
    /// Name of the configured store backend
    pub store: String,
    /// `ok`, or the store error message
    pub store_status: String,
}
