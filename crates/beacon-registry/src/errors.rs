//! Error types for the registry subsystem.
//!
//! Domain failures ([`beacon_core::BeaconError`]) and storage faults
//! ([`StoreError`]) are kept apart: the former are part of the API contract
//! (they map to 4xx responses), the latter are infrastructure trouble the
//! HTTP layer reports as 500.

use thiserror::Error;

use beacon_core::BeaconError;

/// Storage-level faults: the database itself misbehaving.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `SQLite` database error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Schema migration failed.
    #[error("migration error: {message}")]
    Migration {
        /// Describes which migration failed and why.
        message: String,
    },
}

/// Any failure a registry operation can return.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Domain-level failure (invalid input, self-link, unknown peer, ...).
    #[error(transparent)]
    Domain(#[from] BeaconError),

    /// Storage-level fault.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<rusqlite::Error> for RegistryError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Store(StoreError::Sqlite(e))
    }
}

impl From<r2d2::Error> for RegistryError {
    fn from(e: r2d2::Error) -> Self {
        Self::Store(StoreError::Pool(e))
    }
}

/// Convenience type alias for registry results.
pub type Result<T> = std::result::Result<T, RegistryError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
