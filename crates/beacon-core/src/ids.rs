//! Peer id newtype and generation.
//!
//! A [`PeerId`] is the short code an endpoint shares out of band ("add me,
//! I'm `AB23CD`"). Ids are generated client-side from a fixed alphabet that
//! excludes visually confusable characters (`I`, `O`, `0`, `1`), so a code
//! read over the phone survives transcription.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::BeaconError;

/// Characters a peer id may contain. No `I`, `O`, `0`, or `1`.
pub const PEER_ID_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Fixed length of every generated peer id.
pub const PEER_ID_LEN: usize = 6;

/// A registered endpoint's short code.
///
/// Newtype over `String` so a peer id can't be confused with other string
/// identifiers. Serializes transparently as a plain JSON string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    /// Generate a fresh random peer id.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let code: String = (0..PEER_ID_LEN)
            .map(|_| {
                let idx = rng.random_range(0..PEER_ID_ALPHABET.len());
                PEER_ID_ALPHABET[idx] as char
            })
            .collect();
        Self(code)
    }

    /// Parse a canonical peer id, validating length and alphabet.
    ///
    /// # Errors
    ///
    /// Returns [`BeaconError::InvalidInput`] if the code is not exactly
    /// [`PEER_ID_LEN`] characters from [`PEER_ID_ALPHABET`].
    pub fn parse(s: &str) -> Result<Self, BeaconError> {
        if s.len() != PEER_ID_LEN || !s.bytes().all(|b| PEER_ID_ALPHABET.contains(&b)) {
            return Err(BeaconError::InvalidInput("peer id".into()));
        }
        Ok(Self(s.to_owned()))
    }

    /// Wrap an existing string without validation.
    ///
    /// The control plane accepts any non-empty id string (existence checks
    /// gate writes, not shape); only the client insists on canonical codes.
    #[must_use]
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    /// Return the inner string as a slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume self and return the inner `String`.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::ops::Deref for PeerId {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PeerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PeerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<PeerId> for String {
    fn from(id: PeerId) -> Self {
        id.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
