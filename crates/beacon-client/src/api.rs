//! Control-plane HTTP client.
//!
//! Thin reqwest wrapper over the registry surface. Error bodies carry
//! `{error, code}`; the code is mapped back onto the shared taxonomy so
//! callers match on `BeaconError`, not on status codes.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use beacon_core::{BeaconError, Identity, PeerId};

/// Header carrying the credential on every control-plane request.
const API_KEY_HEADER: &str = "x-api-key";

/// Client-side control-plane failures.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level HTTP failure.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    /// The server rejected the request with a taxonomy error.
    #[error(transparent)]
    Domain(#[from] BeaconError),
    /// A response outside the protocol.
    #[error("unexpected control-plane response: {0}")]
    Unexpected(String),
}

/// Outcome of an identity check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckResult {
    /// The id is registered.
    Exists(Identity),
    /// The control plane does not know the id.
    NotFound,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    code: String,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    status: String,
    user: Option<Identity>,
}

#[derive(Debug, Deserialize)]
struct FriendsBody {
    friends: Vec<PeerId>,
}

/// Handle to the registry HTTP surface.
#[derive(Debug, Clone)]
pub struct ControlPlane {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ControlPlane {
    /// Create a client for `base_url` (no trailing slash) with a credential.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Register `id` with the control plane. Idempotent.
    pub async fn register(&self, id: &PeerId) -> Result<(), ApiError> {
        let resp = self
            .http
            .post(format!("{}/api/auth", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&json!({ "id": id, "action": "register" }))
            .send()
            .await?;
        let body: AuthResponse = deserialize(resp).await?;
        if body.status == "success" {
            Ok(())
        } else {
            Err(ApiError::Unexpected(format!(
                "register returned status {:?}",
                body.status
            )))
        }
    }

    /// Ask whether `id` is registered.
    pub async fn check(&self, id: &str) -> Result<CheckResult, ApiError> {
        let resp = self
            .http
            .post(format!("{}/api/auth", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&json!({ "id": id, "action": "check" }))
            .send()
            .await?;
        let body: AuthResponse = deserialize(resp).await?;
        match (body.status.as_str(), body.user) {
            ("exist", Some(user)) => Ok(CheckResult::Exists(user)),
            ("not_found", _) => Ok(CheckResult::NotFound),
            (other, _) => Err(ApiError::Unexpected(format!(
                "check returned status {other:?}"
            ))),
        }
    }

    /// Record a directed contact link from `owner` to `target`.
    pub async fn add_contact(&self, owner: &PeerId, target: &str) -> Result<(), ApiError> {
        let resp = self
            .http
            .post(format!("{}/api/add-friend", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&json!({ "myId": owner, "friendId": target }))
            .send()
            .await?;
        let _: serde_json::Value = deserialize(resp).await?;
        Ok(())
    }

    /// Fetch `owner`'s contact list, self-healed server-side.
    pub async fn contacts(&self, owner: &PeerId) -> Result<Vec<PeerId>, ApiError> {
        let resp = self
            .http
            .get(format!("{}/api/friends/{owner}", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        let body: FriendsBody = deserialize(resp).await?;
        Ok(body.friends)
    }
}

/// Parse a success body, or map an error body onto the shared taxonomy.
async fn deserialize<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }

    let body: ErrorBody = resp.json().await.unwrap_or_else(|_| ErrorBody {
        error: String::new(),
        code: String::new(),
    });
    match BeaconError::from_code(&body.code, &body.error) {
        Some(err) => Err(ApiError::Domain(err)),
        None => Err(ApiError::Unexpected(status_line(status, &body))),
    }
}

fn status_line(status: StatusCode, body: &ErrorBody) -> String {
    if body.error.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {}", body.error)
    }
}
