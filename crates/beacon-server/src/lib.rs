//! # beacon-server
//!
//! Axum control-plane server for Beacon:
//!
//! - HTTP endpoints: identity auth, contact links, health check
//! - Access gate: `x-api-key` credential middleware with signaling and
//!   static-fetch exemptions
//! - Typed HTTP error mapping for the shared error taxonomy
//! - Graceful shutdown via `tokio::signal` + `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod gate;
pub mod health;
pub mod routes;
pub mod server;
pub mod shutdown;

pub use config::ServerConfig;
pub use error::ApiError;
pub use server::{AppState, BeaconServer};
pub use shutdown::ShutdownCoordinator;
