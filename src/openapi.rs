//! Generated OpenAPI document and the docs page that renders it.

use axum::{Json, response::Html};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::collection::{ScriptPatch, ScriptRecord};
use crate::handlers;
use crate::openapi_schemas::{
    BuildVersion, DeleteResponse, ErrorResponse, HealthResponse, UpsertRequest, UpsertResponse,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Interactive Script Directory",
        description = "Maps videos to their interactive scripts and keeps exactly one default script per video."
    ),
    paths(
        handlers::list_scripts,
        handlers::upsert_script,
        handlers::delete_script,
        handlers::health,
    ),
    components(schemas(
        ScriptRecord,
        ScriptPatch,
        UpsertRequest,
        UpsertResponse,
        DeleteResponse,
        ErrorResponse,
        HealthResponse,
        BuildVersion,
    )),
    modifiers(&ApiKeyAddon),
    tags(
        (name = "Scripts", description = "Scripts registered for a video"),
        (name = "Health", description = "Service status"),
    )
)]
pub struct ApiDoc;

/// Registers the `X-API-Key` header scheme referenced by mutating operations
struct ApiKeyAddon;

impl Modify for ApiKeyAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "ApiKey",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-Key"))),
            );
        }
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

const DOCS_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Interactive Script Directory API</title>
</head>
<body>
    <redoc spec-url="/openapi.json"></redoc>
    <script src="https://cdn.redoc.ly/redoc/latest/bundles/redoc.standalone.js"></script>
</body>
</html>
"#;

pub async fn docs_page() -> Html<&'static str> {
    Html(DOCS_PAGE)
}
