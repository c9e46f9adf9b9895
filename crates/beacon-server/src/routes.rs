//! Control-plane JSON handlers.
//!
//! Wire shapes match the registry protocol: `POST /api/auth` for
//! register/check, `POST /api/add-friend` for consent links, and
//! `GET /api/friends/{id}` for the self-healed contact list.

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use beacon_core::{BeaconError, Identity, PeerId};

use crate::error::ApiError;
use crate::server::AppState;

/// Request body for `POST /api/auth`.
#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    /// The peer id to register or check.
    #[serde(default)]
    pub id: String,
    /// `"register"` or `"check"`.
    #[serde(default)]
    pub action: String,
}

/// Request body for `POST /api/add-friend`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFriendRequest {
    /// The owner of the contact list.
    #[serde(default)]
    pub my_id: String,
    /// The peer being remembered.
    #[serde(default)]
    pub friend_id: String,
}

/// Response body for `GET /api/friends/{id}`.
#[derive(Debug, Serialize)]
pub struct FriendsResponse {
    /// The owner's contact list, insertion-ordered and self-healed.
    pub friends: Vec<PeerId>,
}

/// `POST /api/auth` — register a new identity or check an existing one.
///
/// Register is idempotent: re-registering an existing id is a no-op success.
pub async fn auth(
    State(state): State<AppState>,
    Json(body): Json<AuthRequest>,
) -> Result<Json<Value>, ApiError> {
    if body.id.is_empty() {
        return Err(BeaconError::InvalidInput("id".into()).into());
    }

    match body.action.as_str() {
        "register" => {
            let _: Identity = state
                .registry
                .register_identity(&PeerId::from_string(body.id))?;
            Ok(Json(json!({ "status": "success" })))
        }
        "check" => match state.registry.identity(&body.id)? {
            Some(user) => Ok(Json(json!({ "status": "exist", "user": user }))),
            None => Ok(Json(json!({ "status": "not_found" }))),
        },
        _ => Err(BeaconError::InvalidInput("action".into()).into()),
    }
}

/// `POST /api/add-friend` — record a directed contact link.
pub async fn add_friend(
    State(state): State<AppState>,
    Json(body): Json<AddFriendRequest>,
) -> Result<Json<Value>, ApiError> {
    state.registry.add_contact(&body.my_id, &body.friend_id)?;
    Ok(Json(json!({ "success": true, "message": "contact saved" })))
}

/// `GET /api/friends/{id}` — serve the owner's contact list.
///
/// The read is self-healing: targets whose identity no longer exists are
/// removed from storage before the list is returned. An unregistered owner
/// gets an empty list.
pub async fn friends(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FriendsResponse>, ApiError> {
    let friends = state.registry.contacts(&id)?;
    Ok(Json(FriendsResponse { friends }))
}
