//! Local identity persistence.
//!
//! The endpoint's peer id lives in `identity.json` with secure file
//! permissions (0o600). The file is advisory: if the control plane no longer
//! recognizes the stored id, the reset is fail-forward — delete the file,
//! generate a fresh id, register it, persist it. An unreadable or
//! wrong-version file is treated the same as a missing one.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use beacon_core::{BeaconError, PeerId};

use crate::api::{ApiError, CheckResult, ControlPlane};

/// Default identity file name.
const IDENTITY_FILE_NAME: &str = "identity.json";

/// Current identity file schema version.
const IDENTITY_VERSION: u32 = 1;

/// Identity persistence failures.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity file i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("identity file encoding: {0}")]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredIdentity {
    version: u32,
    id: PeerId,
    saved_at: String,
}

/// Get the identity file path under the given data directory.
pub fn identity_file_path(data_dir: &Path) -> PathBuf {
    data_dir.join(IDENTITY_FILE_NAME)
}

/// File-backed store for the local peer id.
#[derive(Debug, Clone)]
pub struct IdentityStore {
    path: PathBuf,
}

impl IdentityStore {
    /// Create a store backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the persisted id.
    ///
    /// Returns `None` if the file doesn't exist or is invalid.
    #[must_use]
    pub fn load(&self) -> Option<PeerId> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("failed to read identity file: {e}");
                return None;
            }
        };

        match serde_json::from_str::<StoredIdentity>(&data) {
            Ok(stored) if stored.version == IDENTITY_VERSION => Some(stored.id),
            Ok(stored) => {
                warn!("unsupported identity file version: {}", stored.version);
                None
            }
            Err(e) => {
                warn!("failed to parse identity file: {e}");
                None
            }
        }
    }

    /// Persist `id`.
    ///
    /// Creates parent directories if needed. Sets file permissions to 0o600.
    pub fn save(&self, id: &PeerId) -> Result<(), IdentityError> {
        let stored = StoredIdentity {
            version: IDENTITY_VERSION,
            id: id.clone(),
            saved_at: chrono::Utc::now().to_rfc3339(),
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&stored)?;
        std::fs::write(&self.path, &json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&self.path, perms);
        }

        Ok(())
    }

    /// Delete the identity file. Missing file is not an error.
    pub fn clear(&self) -> Result<(), IdentityError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(IdentityError::Io(e)),
        }
    }
}

/// Verify that the control plane still knows `id`.
///
/// # Errors
///
/// `BeaconError::StaleIdentity` when the id is not registered.
pub async fn verify_identity(api: &ControlPlane, id: &PeerId) -> Result<(), IdentityError> {
    match api.check(id).await? {
        CheckResult::Exists(_) => Ok(()),
        CheckResult::NotFound => Err(ApiError::Domain(BeaconError::StaleIdentity(
            id.to_string(),
        ))
        .into()),
    }
}

/// Produce a usable local identity.
///
/// Loads the persisted id and verifies it against the control plane. A stale
/// id is discarded and replaced: fresh generation, registration, persistence.
/// No persisted id means the same fresh path.
pub async fn ensure_identity(
    api: &ControlPlane,
    store: &IdentityStore,
) -> Result<PeerId, IdentityError> {
    if let Some(id) = store.load() {
        match verify_identity(api, &id).await {
            Ok(()) => return Ok(id),
            Err(IdentityError::Api(ApiError::Domain(BeaconError::StaleIdentity(_)))) => {
                warn!(%id, "persisted identity is stale, resetting");
                store.clear()?;
            }
            Err(e) => return Err(e),
        }
    }

    let id = PeerId::generate();
    api.register(&id).await?;
    store.save(&id)?;
    info!(%id, "registered fresh identity");
    Ok(id)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
