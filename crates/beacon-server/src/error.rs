//! HTTP error mapping for the shared error taxonomy.
//!
//! Every error body has the shape `{"error": message, "code": CODE}`.
//! Domain errors keep their taxonomy code and map to 4xx; storage faults
//! are reported as an opaque 500 without leaking database detail.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use beacon_core::BeaconError;
use beacon_registry::RegistryError;

/// An error ready to be served as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: String,
    message: String,
}

impl ApiError {
    /// Build from parts.
    #[must_use]
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// The mapped HTTP status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The machine-readable wire code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl From<BeaconError> for ApiError {
    fn from(err: BeaconError) -> Self {
        let status = match err {
            BeaconError::InvalidInput(_) | BeaconError::SelfLinkRejected => {
                StatusCode::BAD_REQUEST
            }
            BeaconError::OwnerNotFound(_)
            | BeaconError::TargetNotFound(_)
            | BeaconError::StaleIdentity(_) => StatusCode::NOT_FOUND,
            BeaconError::AccessDenied => StatusCode::FORBIDDEN,
            BeaconError::Channel(_) => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, err.code(), err.to_string())
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Domain(domain) => domain.into(),
            RegistryError::Store(store) => {
                error!(error = %store, "registry storage fault");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "internal server error",
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.message, "code": self.code });
        (self.status, Json(body)).into_response()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
