//! Control-plane domain types.
//!
//! Wire field names are camelCase to match the JSON bodies the HTTP surface
//! serves (`registeredAt`, not `registered_at`).

use serde::{Deserialize, Serialize};

use crate::ids::PeerId;

/// A registered endpoint. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// The endpoint's short code.
    pub id: PeerId,
    /// RFC 3339 timestamp of registration.
    pub registered_at: String,
}

/// An API credential granting blanket access to the control plane.
///
/// Consulted read-only by the access gate. Flipping `active` to `false`
/// blocks further access immediately without deleting history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// The opaque key presented in the `x-api-key` header.
    pub key: String,
    /// Who the key was issued to.
    pub owner: String,
    /// Whether the key currently grants access.
    pub active: bool,
    /// RFC 3339 timestamp of issuance.
    pub created_at: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
