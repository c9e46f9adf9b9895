//! # beacon-core
//!
//! Shared foundation for the Beacon peer messaging system:
//!
//! - [`PeerId`]: the short human-shareable endpoint code, with client-side
//!   generation from a confusable-free alphabet
//! - [`Identity`] / [`Credential`]: the control-plane domain types
//! - [`BeaconError`]: the error taxonomy shared by server and client, with
//!   machine-readable wire codes

#![deny(unsafe_code)]

pub mod errors;
pub mod ids;
pub mod types;

pub use errors::{BeaconError, Result};
pub use ids::PeerId;
pub use types::{Credential, Identity};
