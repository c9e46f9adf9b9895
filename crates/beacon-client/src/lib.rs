//! # beacon-client
//!
//! Client-side endpoint for Beacon:
//!
//! - `Transport`/`Channel` traits over the peer-to-peer data path, with an
//!   in-process `MemoryTransport` for tests and demos
//! - `SessionManager`: one active conversation, on-demand channels, bounded
//!   connect, out-of-band notifications for non-selected senders
//! - `Transcript`: the append-only conversation view
//! - Local identity persistence with fail-forward reset when the control
//!   plane no longer knows the stored id
//! - `ControlPlane`: reqwest client for the registry HTTP surface

#![deny(unsafe_code)]

pub mod api;
pub mod identity;
pub mod memory;
pub mod session;
pub mod transcript;
pub mod transport;

pub use api::{ApiError, CheckResult, ControlPlane};
pub use identity::{IdentityError, IdentityStore, ensure_identity, verify_identity};
pub use memory::MemoryHub;
pub use session::{LinkStatus, Notification, SessionConfig, SessionError, SessionManager};
pub use transcript::{Sender, Transcript, TranscriptEntry};
pub use transport::{Channel, ChannelError, Inbound, Transport};
