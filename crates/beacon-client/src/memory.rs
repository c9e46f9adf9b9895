//! In-process transport for tests and demos.
//!
//! A `MemoryHub` plays the role of the network: every registered endpoint is
//! a mailbox in a shared map, and connecting to a peer that never registered
//! fails the same way an unreachable peer does on the wire.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use beacon_core::PeerId;

use crate::transport::{Channel, ChannelError, Inbound, Transport};

/// Shared in-process "network" connecting `MemoryTransport` endpoints.
#[derive(Debug, Clone, Default)]
pub struct MemoryHub {
    peers: Arc<Mutex<HashMap<PeerId, mpsc::UnboundedSender<Inbound>>>>,
}

impl MemoryHub {
    /// Create an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport endpoint attached to this hub.
    #[must_use]
    pub fn endpoint(&self) -> MemoryTransport {
        MemoryTransport {
            hub: self.clone(),
            local: Mutex::new(None),
            inbox: Mutex::new(None),
        }
    }

    /// Drop an endpoint's mailbox, making it unreachable.
    pub fn disconnect(&self, id: &PeerId) {
        let _ = self.peers.lock().remove(id);
    }

    fn sender_for(&self, id: &PeerId) -> Option<mpsc::UnboundedSender<Inbound>> {
        self.peers.lock().get(id).cloned()
    }
}

/// One endpoint on a `MemoryHub`.
pub struct MemoryTransport {
    hub: MemoryHub,
    local: Mutex<Option<PeerId>>,
    inbox: Mutex<Option<mpsc::UnboundedReceiver<Inbound>>>,
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn register(&self, local: &PeerId) -> Result<(), ChannelError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = self.hub.peers.lock().insert(local.clone(), tx);
        *self.local.lock() = Some(local.clone());
        *self.inbox.lock() = Some(rx);
        Ok(())
    }

    async fn connect(&self, remote: &PeerId) -> Result<Box<dyn Channel>, ChannelError> {
        let from = self
            .local
            .lock()
            .clone()
            .ok_or(ChannelError::Closed)?;
        let tx = self
            .hub
            .sender_for(remote)
            .ok_or_else(|| ChannelError::Unreachable(remote.clone()))?;
        Ok(Box::new(MemoryChannel { from, tx }))
    }

    fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<Inbound>, ChannelError> {
        self.inbox.lock().take().ok_or(ChannelError::Closed)
    }
}

struct MemoryChannel {
    from: PeerId,
    tx: mpsc::UnboundedSender<Inbound>,
}

#[async_trait]
impl Channel for MemoryChannel {
    async fn send(&mut self, text: &str) -> Result<(), ChannelError> {
        self.tx
            .send(Inbound {
                from: self.from.clone(),
                text: text.to_string(),
            })
            .map_err(|_| ChannelError::Closed)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
