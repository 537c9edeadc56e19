use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::engine::EngineError;
use crate::openapi_schemas::ErrorResponse;
use crate::store::StoreError;

/// Which reference in a request failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Video,
    Script,
    SupportUrl,
}

impl ReferenceKind {
    fn message(self) -> &'static str {
        match self {
            ReferenceKind::Video => "Invalid video URL format",
            ReferenceKind::Script => {
                "Invalid script URL format. Must end with .funscript or .csv"
            }
            ReferenceKind::SupportUrl => "Invalid support URL format",
        }
    }
}

/// Errors returned by the script registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{}", .kind.message())]
    InvalidReference { kind: ReferenceKind, reference: String },

    #[error("Invalid script metadata: {0}")]
    InvalidMetadata(String),

    #[error("No scripts found for this video")]
    VideoNotFound,

    #[error("Script not found")]
    ScriptNotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Internal server error")]
    Store(#[from] StoreError),
}

impl RegistryError {
    pub fn invalid_reference(kind: ReferenceKind, reference: impl Into<String>) -> Self {
        Self::InvalidReference {
            kind,
            reference: reference.into(),
        }
    }

    /// Convert to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            RegistryError::InvalidReference { .. } => StatusCode::BAD_REQUEST,
            RegistryError::InvalidMetadata(_) => StatusCode::BAD_REQUEST,
            RegistryError::VideoNotFound => StatusCode::NOT_FOUND,
            RegistryError::ScriptNotFound => StatusCode::NOT_FOUND,
            RegistryError::Unauthorized => StatusCode::UNAUTHORIZED,
            RegistryError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Body sent to the caller. Only store failures carry details.
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
            details: match self {
                RegistryError::Store(err) => Some(err.to_string()),
                _ => None,
            },
        }
    }
}

impl From<EngineError> for RegistryError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::MissingScript(_) => RegistryError::ScriptNotFound,
        }
    }
}

impl IntoResponse for RegistryError {
    fn into_response(self) -> Response {
        if let RegistryError::Store(err) = &self {
            error!("Store failure: {}", err);
        }
        (self.status_code(), Json(self.to_error_response())).into_response()
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;
