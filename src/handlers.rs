//! Axum handlers for the `/scripts/v1` API.
//!
//! Path parameters are percent-decoded once by axum's router and reach the
//! registry as they are.

use axum::{
    Json,
    extract::{
        RawPathParams, State,
        rejection::{JsonRejection, RawPathParamsRejection},
    },
    http::StatusCode,
};
use tracing::warn;

use crate::AppState;
use crate::collection::{Collection, ScriptRecord};
use crate::error::{ReferenceKind, RegistryError, RegistryResult};
use crate::openapi_schemas::{
    BuildVersion, DeleteResponse, ErrorResponse, HealthResponse, UpsertRequest, UpsertResponse,
};

type PathParams = Result<RawPathParams, RawPathParamsRejection>;

fn path_reference(params: &PathParams, name: &str, kind: ReferenceKind) -> RegistryResult<String> {
    let params = params.as_ref().map_err(|rejection| rejected_segment(rejection, kind))?;
    params
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .ok_or_else(|| RegistryError::invalid_reference(kind, ""))
}

/// Map a segment that did not decode to UTF-8 onto the reference it belongs to.
/// axum names the offending parameter in its message.
fn rejected_segment(rejection: &RawPathParamsRejection, fallback: ReferenceKind) -> RegistryError {
    let text = rejection.body_text();
    warn!("Rejected path parameters: {}", text);
    let kind = if text.contains("`script`") {
        ReferenceKind::Script
    } else if text.contains("`video`") {
        ReferenceKind::Video
    } else {
        fallback
    };
    RegistryError::invalid_reference(kind, text)
}

/// List scripts for a video
#[utoipa::path(
    get,
    path = "/scripts/v1/{video}",
    tags = ["Scripts"],
    params(
        ("video" = String, Path, description = "Encoded video URL"),
    ),
    responses(
        (status = 200, description = "Returns scripts for a video, keyed by script URL", body = std::collections::HashMap<String, ScriptRecord>),
        (status = 400, description = "Invalid video URL", body = ErrorResponse),
        (status = 404, description = "No scripts found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    )
)]
pub async fn list_scripts(
    State(state): State<AppState>,
    params: PathParams,
) -> RegistryResult<Json<Collection>> {
    let video = path_reference(&params, "video", ReferenceKind::Video)?;
    let collection = state.registry.list(&video).await?;
    Ok(Json(collection))
}

/// Add or update a script for a video
#[utoipa::path(
    post,
    path = "/scripts/v1/{video}/{script}",
    tags = ["Scripts"],
    security(("ApiKey" = [])),
    params(
        ("video" = String, Path, description = "Encoded video URL"),
        ("script" = String, Path, description = "Encoded script URL ending in .funscript or .csv"),
    ),
    request_body = UpsertRequest,
    responses(
        (status = 200, description = "Script updated successfully", body = UpsertResponse),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    )
)]
pub async fn upsert_script(
    State(state): State<AppState>,
    params: PathParams,
    payload: Result<Json<UpsertRequest>, JsonRejection>,
) -> RegistryResult<Json<UpsertResponse>> {
    let video = path_reference(&params, "video", ReferenceKind::Video)?;
    let script = path_reference(&params, "script", ReferenceKind::Script)?;
    let Json(body) = payload.map_err(|rejection| {
        warn!("Rejected upsert body: {}", rejection.body_text());
        RegistryError::InvalidMetadata(rejection.body_text())
    })?;

    let record = state.registry.upsert(&video, &script, body.metadata).await?;
    Ok(Json(UpsertResponse {
        success: true,
        message: "Script metadata updated".to_string(),
        data: record,
    }))
}

/// Delete a script for a video
#[utoipa::path(
    delete,
    path = "/scripts/v1/{video}/{script}",
    tags = ["Scripts"],
    security(("ApiKey" = [])),
    params(
        ("video" = String, Path, description = "Encoded video URL"),
        ("script" = String, Path, description = "Encoded script URL"),
    ),
    responses(
        (status = 200, description = "Script deleted successfully", body = DeleteResponse),
        (status = 400, description = "Invalid video URL", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Script not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    )
)]
pub async fn delete_script(
    State(state): State<AppState>,
    params: PathParams,
) -> RegistryResult<Json<DeleteResponse>> {
    let video = path_reference(&params, "video", ReferenceKind::Video)?;
    let script = path_reference(&params, "script", ReferenceKind::Script)?;

    let outcome = state.registry.remove(&video, &script).await?;
    let message = if outcome.all_removed {
        "All scripts for video removed"
    } else {
        "Script removed"
    };
    Ok(Json(DeleteResponse {
        success: true,
        message: message.to_string(),
    }))
}

/// Service and store health
#[utoipa::path(
    get,
    path = "/health",
    tags = ["Health"],
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Store is unreachable", body = HealthResponse),
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let store = state.registry.store();
    let (status, store_status) = match store.health_check().await {
        Ok(()) => (StatusCode::OK, "ok".to_string()),
        Err(err) => {
            warn!("Health check failed: {}", err);
            (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
        }
    };

    let body = HealthResponse {
        status: if status.is_success() { "healthy" } else { "degraded" }.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: BuildVersion::current(),
        store: store.backend_name().to_string(),
        store_status,
    };
    (status, Json(body))
}
