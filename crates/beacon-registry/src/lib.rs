//! # beacon-registry
//!
//! Durable control-plane state for Beacon: identities, directed contact
//! links, and API credentials, stored in three SQLite tables.
//!
//! Every operation is a row-level transaction, so concurrent mutations of
//! the same owner's contact list serialize on the database instead of on a
//! process-wide lock.
//!
//! Contact links are lazily consistent: a link whose target identity has
//! been removed (an external administrative action) survives in storage
//! until the next read of the owning list, which repairs the stored rows
//! before serving them. See [`Registry::contacts`].

#![deny(unsafe_code)]

pub mod connection;
pub mod errors;
pub mod migrations;
pub mod registry;

pub use connection::{ConnectionConfig, ConnectionPool, new_file, new_in_memory};
pub use errors::{RegistryError, Result, StoreError};
pub use registry::Registry;
