//! The registry facade: identities, contact links, credentials.
//!
//! All methods take `&self` and run on a pooled connection; mutations run
//! inside a transaction. Contact reads are self-healing: orphaned targets
//! are deleted from storage before the list is served, so an identity
//! removed by an external administrative action leaks at most one stale
//! read per owning list.

use rusqlite::{OptionalExtension, params};
use tracing::{debug, info};
use uuid::Uuid;

use beacon_core::{BeaconError, Credential, Identity, PeerId};

use crate::connection::{ConnectionConfig, ConnectionPool, PooledConnection, new_file, new_in_memory};
use crate::errors::Result;
use crate::migrations;

/// Durable control-plane state.
///
/// Cheap to clone; clones share the underlying pool.
#[derive(Clone)]
pub struct Registry {
    pool: ConnectionPool,
}

impl Registry {
    /// Open (or create) a file-backed registry and run migrations.
    pub fn open(path: &str, config: &ConnectionConfig) -> Result<Self> {
        let pool = new_file(path, config)?;
        let registry = Self { pool };
        let conn = registry.conn()?;
        let _ = migrations::run_migrations(&conn)?;
        Ok(registry)
    }

    /// Open an in-memory registry (for testing).
    pub fn in_memory() -> Result<Self> {
        let pool = new_in_memory(&ConnectionConfig::default())?;
        let registry = Self { pool };
        let conn = registry.conn()?;
        let _ = migrations::run_migrations(&conn)?;
        Ok(registry)
    }

    /// Wrap an existing pool. Migrations must already have run.
    #[must_use]
    pub fn from_pool(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    // ── Identities ───────────────────────────────────────────────────────────

    /// Register an identity. Idempotent: re-registering an existing id is a
    /// no-op success that returns the stored row.
    pub fn register_identity(&self, id: &PeerId) -> Result<Identity> {
        if id.as_str().is_empty() {
            return Err(BeaconError::InvalidInput("id".into()).into());
        }
        let conn = self.conn()?;
        let now = chrono::Utc::now().to_rfc3339();

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO identities (id, registered_at) VALUES (?1, ?2)",
            params![id.as_str(), now],
        )?;
        if inserted > 0 {
            info!(peer = %id, "identity registered");
        }

        let registered_at: String = conn.query_row(
            "SELECT registered_at FROM identities WHERE id = ?1",
            params![id.as_str()],
            |row| row.get(0),
        )?;
        Ok(Identity {
            id: id.clone(),
            registered_at,
        })
    }

    /// Pure existence lookup.
    pub fn identity_exists(&self, id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let row: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM identities WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(row.is_some())
    }

    /// Fetch an identity row, if registered.
    pub fn identity(&self, id: &str) -> Result<Option<Identity>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT id, registered_at FROM identities WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Identity {
                        id: PeerId::from_string(row.get(0)?),
                        registered_at: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Number of registered identities (health reporting).
    pub fn identity_count(&self) -> Result<u64> {
        let conn = self.conn()?;
        let count: u64 = conn.query_row("SELECT COUNT(*) FROM identities", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Remove an identity row.
    ///
    /// This is the "external administrative action" the contact model must
    /// tolerate: links pointing at the removed id stay in storage and are
    /// repaired lazily by [`Registry::contacts`].
    pub fn remove_identity(&self, id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM identities WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    // ── Contact links ────────────────────────────────────────────────────────

    /// Record that `owner` wants to remember `target`.
    ///
    /// Failure ladder (checked in order): empty input, self-link, target not
    /// registered, owner not registered. The insert itself is idempotent —
    /// re-adding an existing contact leaves the stored list unchanged.
    pub fn add_contact(&self, owner: &str, target: &str) -> Result<()> {
        if owner.is_empty() {
            return Err(BeaconError::InvalidInput("myId".into()).into());
        }
        if target.is_empty() {
            return Err(BeaconError::InvalidInput("friendId".into()).into());
        }
        if owner == target {
            return Err(BeaconError::SelfLinkRejected.into());
        }

        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        if !exists_in_tx(&tx, target)? {
            return Err(BeaconError::TargetNotFound(target.to_owned()).into());
        }
        if !exists_in_tx(&tx, owner)? {
            return Err(BeaconError::OwnerNotFound(owner.to_owned()).into());
        }

        let now = chrono::Utc::now().to_rfc3339();
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO contacts (owner, target, added_at) VALUES (?1, ?2, ?3)",
            params![owner, target, now],
        )?;
        tx.commit()?;

        if inserted > 0 {
            info!(owner, target, "contact added");
        } else {
            debug!(owner, target, "contact already present");
        }
        Ok(())
    }

    /// Serve `owner`'s contact list in insertion order, repairing storage
    /// first: any stored target that no longer resolves to an identity is
    /// deleted before the list is read. A second call returns the identical,
    /// already-clean list.
    ///
    /// An owner that is not itself registered gets an empty list, not an
    /// error.
    pub fn contacts(&self, owner: &str) -> Result<Vec<PeerId>> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        if !exists_in_tx(&tx, owner)? {
            return Ok(Vec::new());
        }

        let healed = tx.execute(
            "DELETE FROM contacts
             WHERE owner = ?1
               AND target NOT IN (SELECT id FROM identities)",
            params![owner],
        )?;
        if healed > 0 {
            info!(owner, removed = healed, "healed stale contact links");
        }

        let mut stmt = tx.prepare(
            "SELECT target FROM contacts WHERE owner = ?1 ORDER BY rowid",
        )?;
        let list = stmt
            .query_map(params![owner], |row| {
                Ok(PeerId::from_string(row.get(0)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        drop(stmt);
        tx.commit()?;

        Ok(list)
    }

    /// Raw stored link count for an owner, orphans included. Test and
    /// diagnostics hook for verifying the lazy repair actually wrote back.
    pub fn stored_link_count(&self, owner: &str) -> Result<u64> {
        let conn = self.conn()?;
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM contacts WHERE owner = ?1",
            params![owner],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ── Credentials ──────────────────────────────────────────────────────────

    /// Exact-match credential check: the key must exist and be active.
    pub fn credential_active(&self, key: &str) -> Result<bool> {
        let conn = self.conn()?;
        let active: Option<bool> = conn
            .query_row(
                "SELECT active FROM credentials WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(active.unwrap_or(false))
    }

    /// Insert a credential if absent (bootstrap seeding at startup).
    pub fn seed_credential(&self, key: &str, owner: &str) -> Result<()> {
        let conn = self.conn()?;
        let now = chrono::Utc::now().to_rfc3339();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO credentials (key, owner, active, created_at)
             VALUES (?1, ?2, 1, ?3)",
            params![key, owner, now],
        )?;
        if inserted > 0 {
            info!(owner, "bootstrap credential seeded");
        }
        Ok(())
    }

    /// Mint a fresh active credential for `owner`.
    pub fn mint_credential(&self, owner: &str) -> Result<Credential> {
        let conn = self.conn()?;
        let key = format!("bk_{}", Uuid::new_v4().simple());
        let now = chrono::Utc::now().to_rfc3339();
        let _ = conn.execute(
            "INSERT INTO credentials (key, owner, active, created_at) VALUES (?1, ?2, 1, ?3)",
            params![key, owner, now],
        )?;
        info!(owner, "credential minted");
        Ok(Credential {
            key,
            owner: owner.to_owned(),
            active: true,
            created_at: now,
        })
    }

    /// Flip a credential's `active` flag. Deactivation blocks further access
    /// immediately without deleting the row. Returns whether the key existed.
    pub fn set_credential_active(&self, key: &str, active: bool) -> Result<bool> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE credentials SET active = ?2 WHERE key = ?1",
            params![key, active],
        )?;
        if updated > 0 {
            info!(active, "credential flag updated");
        }
        Ok(updated > 0)
    }
}

fn exists_in_tx(tx: &rusqlite::Transaction<'_>, id: &str) -> rusqlite::Result<bool> {
    let row: Option<i64> = tx
        .query_row(
            "SELECT 1 FROM identities WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(row.is_some())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
