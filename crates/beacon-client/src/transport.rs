//! Data-path abstraction.
//!
//! The peer-to-peer layer is reduced to its contract: an ordered, reliable,
//! bidirectional text channel between two named endpoints. WebRTC, its
//! signaling relay, and NAT traversal all live behind these traits.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use beacon_core::PeerId;

/// Data-path failures, per connect or per send attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The remote endpoint is not reachable through the transport.
    #[error("peer {0} is unreachable")]
    Unreachable(PeerId),
    /// The connect attempt exceeded its deadline.
    #[error("connect timed out")]
    Timeout,
    /// The channel or the local endpoint registration is gone.
    #[error("channel closed")]
    Closed,
}

/// A message delivered to the local endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    /// The sending endpoint.
    pub from: PeerId,
    /// Message text, verbatim.
    pub text: String,
}

/// An open outbound channel to one remote endpoint.
#[async_trait]
pub trait Channel: Send {
    /// Transmit `text` verbatim to the remote endpoint.
    async fn send(&mut self, text: &str) -> Result<(), ChannelError>;
}

/// A transport endpoint bound to one local peer id.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Announce the local endpoint so remote peers can connect to it.
    async fn register(&self, local: &PeerId) -> Result<(), ChannelError>;

    /// Open a fresh outbound channel to `remote`.
    async fn connect(&self, remote: &PeerId) -> Result<Box<dyn Channel>, ChannelError>;

    /// Take the inbound message stream for the registered endpoint.
    ///
    /// Yields `ChannelError::Closed` before `register` or on a second take.
    fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<Inbound>, ChannelError>;
}
