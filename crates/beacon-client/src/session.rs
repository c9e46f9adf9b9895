//! Conversation state machine.
//!
//! A `SessionManager` owns one endpoint's view of the world: the local id,
//! the transport, the single active conversation, its transcript, and the
//! out-of-band notification queue. Channels are opened on demand, one fresh
//! outbound channel per send, bounded by the connect timeout. There is no
//! retry and no outbound queue; a failed send is reported once and dropped.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use beacon_core::PeerId;

use crate::transcript::{Sender, Transcript, TranscriptEntry};
use crate::transport::{ChannelError, Inbound, Transport};

/// Delivery state of the active conversation's link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// No channel has been attempted since selection.
    Disconnected,
    /// An outbound connect is in flight.
    Connecting,
    /// The last send reached the peer.
    Online,
    /// The last send failed. Terminal until the next send attempt.
    Failed,
}

/// Session tunables.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Deadline for opening an outbound channel.
    pub connect_timeout: Duration,
    /// Drop inbound traffic from peers not in the cached contact list.
    pub require_known_peer: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            require_known_peer: false,
        }
    }
}

/// Failures surfaced to the caller of `send`.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No conversation is selected.
    #[error("no conversation selected")]
    NoSelection,
    /// Empty message text.
    #[error("message text is empty")]
    EmptyMessage,
    /// The data path failed.
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// A message from a peer other than the current selection, surfaced
/// out-of-band. The message itself is not buffered into any transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// The non-selected sender.
    pub from: PeerId,
    /// Message text, verbatim.
    pub text: String,
}

struct Inner {
    selected: Option<PeerId>,
    transcript: Transcript,
    status: LinkStatus,
    notifications: VecDeque<Notification>,
    known_peers: HashSet<PeerId>,
}

/// One endpoint's conversation state. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct SessionManager {
    local: PeerId,
    transport: Arc<dyn Transport>,
    config: SessionConfig,
    inner: Arc<Mutex<Inner>>,
}

impl SessionManager {
    /// Create a manager for a local endpoint over the given transport.
    pub fn new(local: PeerId, transport: Arc<dyn Transport>, config: SessionConfig) -> Self {
        Self {
            local,
            transport,
            config,
            inner: Arc::new(Mutex::new(Inner {
                selected: None,
                transcript: Transcript::new(),
                status: LinkStatus::Disconnected,
                notifications: VecDeque::new(),
                known_peers: HashSet::new(),
            })),
        }
    }

    /// The local peer id.
    #[must_use]
    pub fn local(&self) -> &PeerId {
        &self.local
    }

    /// Announce the local endpoint on the transport.
    pub async fn register(&self) -> Result<(), ChannelError> {
        self.transport.register(&self.local).await
    }

    /// Switch the active conversation. Clears the transcript and resets the
    /// link status; no channel is opened until the first send.
    pub fn select_contact(&self, id: PeerId) {
        let mut inner = self.inner.lock();
        inner.selected = Some(id);
        inner.transcript.clear();
        inner.status = LinkStatus::Disconnected;
    }

    /// The currently selected contact, if any.
    #[must_use]
    pub fn selected(&self) -> Option<PeerId> {
        self.inner.lock().selected.clone()
    }

    /// Current link status.
    #[must_use]
    pub fn status(&self) -> LinkStatus {
        self.inner.lock().status
    }

    /// Snapshot of the active transcript.
    #[must_use]
    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.inner.lock().transcript.entries().to_vec()
    }

    /// Drain queued out-of-band notifications.
    #[must_use]
    pub fn take_notifications(&self) -> Vec<Notification> {
        self.inner.lock().notifications.drain(..).collect()
    }

    /// Replace the cached contact list used by `require_known_peer`.
    pub fn set_known_peers(&self, peers: impl IntoIterator<Item = PeerId>) {
        self.inner.lock().known_peers = peers.into_iter().collect();
    }

    /// Send `text` to the selected contact over a fresh channel.
    ///
    /// The completion is bound to the contact captured here: if the selection
    /// changes while the send is in flight, neither the transcript nor the
    /// link status of the new conversation is touched.
    pub async fn send(&self, text: &str) -> Result<(), SessionError> {
        if text.is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        let target = {
            let mut inner = self.inner.lock();
            let Some(target) = inner.selected.clone() else {
                return Err(SessionError::NoSelection);
            };
            inner.status = LinkStatus::Connecting;
            target
        };

        let result = self.open_and_send(&target, text).await;

        let mut inner = self.inner.lock();
        if inner.selected.as_ref() != Some(&target) {
            debug!(%target, "selection changed mid-send, dropping completion");
            return result.map_err(SessionError::Channel);
        }

        match result {
            Ok(()) => {
                inner.transcript.push(Sender::Me, text);
                inner.status = LinkStatus::Online;
                Ok(())
            }
            Err(e) => {
                inner.status = LinkStatus::Failed;
                warn!(%target, error = %e, "send failed");
                Err(SessionError::Channel(e))
            }
        }
    }

    async fn open_and_send(&self, target: &PeerId, text: &str) -> Result<(), ChannelError> {
        let mut channel =
            tokio::time::timeout(self.config.connect_timeout, self.transport.connect(target))
                .await
                .map_err(|_| ChannelError::Timeout)??;
        channel.send(text).await
    }

    /// Route one inbound message.
    ///
    /// From the selected contact: appended to the transcript in arrival
    /// order. From anyone else (or while idle): surfaced as a notification
    /// and otherwise discarded.
    pub fn handle_inbound(&self, msg: Inbound) {
        let mut inner = self.inner.lock();

        if self.config.require_known_peer && !inner.known_peers.contains(&msg.from) {
            warn!(from = %msg.from, "dropping inbound from unknown peer");
            return;
        }

        if inner.selected.as_ref() == Some(&msg.from) {
            inner.transcript.push(Sender::Peer, msg.text);
        } else {
            inner.notifications.push_back(Notification {
                from: msg.from,
                text: msg.text,
            });
        }
    }

    /// Pump a transport subscription into `handle_inbound` until the stream
    /// ends or the token is cancelled.
    pub async fn run_inbound(
        &self,
        mut receiver: mpsc::UnboundedReceiver<Inbound>,
        token: CancellationToken,
    ) {
        loop {
            tokio::select! {
                () = token.cancelled() => break,
                msg = receiver.recv() => match msg {
                    Some(msg) => self.handle_inbound(msg),
                    None => break,
                },
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryHub;
    use crate::transport::Channel;
    use assert_matches::assert_matches;
    use async_trait::async_trait;

    fn id(s: &str) -> PeerId {
        PeerId::parse(s).unwrap()
    }

    async fn manager(hub: &MemoryHub, local: &str) -> SessionManager {
        let mgr = SessionManager::new(
            id(local),
            Arc::new(hub.endpoint()),
            SessionConfig::default(),
        );
        mgr.register().await.unwrap();
        mgr
    }

    #[tokio::test]
    async fn send_without_selection_is_rejected() {
        let hub = MemoryHub::new();
        let mgr = manager(&hub, "AAAAAA").await;
        assert_matches!(mgr.send("hi").await, Err(SessionError::NoSelection));
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let hub = MemoryHub::new();
        let mgr = manager(&hub, "AAAAAA").await;
        mgr.select_contact(id("BBBBBB"));
        assert_matches!(mgr.send("").await, Err(SessionError::EmptyMessage));
    }

    #[tokio::test]
    async fn select_clears_transcript_and_resets_status() {
        let hub = MemoryHub::new();
        let mgr = manager(&hub, "AAAAAA").await;
        let _bob = manager(&hub, "BBBBBB").await;

        mgr.select_contact(id("BBBBBB"));
        mgr.send("hello").await.unwrap();
        assert_eq!(mgr.transcript().len(), 1);
        assert_eq!(mgr.status(), LinkStatus::Online);

        mgr.select_contact(id("CCCCCC"));
        assert!(mgr.transcript().is_empty());
        assert_eq!(mgr.status(), LinkStatus::Disconnected);
    }

    #[tokio::test]
    async fn successful_send_appends_me_and_goes_online() {
        let hub = MemoryHub::new();
        let mgr = manager(&hub, "AAAAAA").await;
        let bob = manager(&hub, "BBBBBB").await;

        mgr.select_contact(id("BBBBBB"));
        mgr.send("hello bob").await.unwrap();

        let entries = mgr.transcript();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].sender, Sender::Me);
        assert_eq!(entries[0].text, "hello bob");
        assert_eq!(mgr.status(), LinkStatus::Online);
        drop(bob);
    }

    #[tokio::test]
    async fn failed_send_is_terminal_failed_with_no_transcript_entry() {
        let hub = MemoryHub::new();
        let mgr = manager(&hub, "AAAAAA").await;

        mgr.select_contact(id("ZZZZZZ"));
        let err = mgr.send("hello?").await.err().unwrap();
        assert_matches!(
            err,
            SessionError::Channel(ChannelError::Unreachable(_))
        );
        assert_eq!(mgr.status(), LinkStatus::Failed);
        assert!(mgr.transcript().is_empty());
    }

    #[tokio::test]
    async fn failed_send_is_not_retried_but_next_send_may_succeed() {
        let hub = MemoryHub::new();
        let mgr = manager(&hub, "AAAAAA").await;

        mgr.select_contact(id("BBBBBB"));
        assert!(mgr.send("first").await.is_err());
        assert_eq!(mgr.status(), LinkStatus::Failed);

        let _bob = manager(&hub, "BBBBBB").await;
        mgr.send("second").await.unwrap();
        assert_eq!(mgr.status(), LinkStatus::Online);
        assert_eq!(mgr.transcript().len(), 1);
    }

    #[tokio::test]
    async fn inbound_from_selected_peer_appends_in_arrival_order() {
        let hub = MemoryHub::new();
        let mgr = manager(&hub, "AAAAAA").await;
        mgr.select_contact(id("BBBBBB"));

        mgr.handle_inbound(Inbound { from: id("BBBBBB"), text: "one".into() });
        mgr.handle_inbound(Inbound { from: id("BBBBBB"), text: "two".into() });

        let texts: Vec<String> = mgr.transcript().iter().map(|e| e.text.clone()).collect();
        assert_eq!(texts, vec!["one", "two"]);
        assert!(mgr.transcript().iter().all(|e| e.sender == Sender::Peer));
    }

    #[tokio::test]
    async fn inbound_from_other_peer_becomes_notification() {
        let hub = MemoryHub::new();
        let mgr = manager(&hub, "AAAAAA").await;
        mgr.select_contact(id("BBBBBB"));

        mgr.handle_inbound(Inbound { from: id("CCCCCC"), text: "psst".into() });

        assert!(mgr.transcript().is_empty());
        let notes = mgr.take_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].from, id("CCCCCC"));

        // Drained, not buffered.
        assert!(mgr.take_notifications().is_empty());
    }

    #[tokio::test]
    async fn inbound_while_idle_becomes_notification() {
        let hub = MemoryHub::new();
        let mgr = manager(&hub, "AAAAAA").await;

        mgr.handle_inbound(Inbound { from: id("BBBBBB"), text: "hey".into() });

        assert!(mgr.transcript().is_empty());
        assert_eq!(mgr.take_notifications().len(), 1);
    }

    #[tokio::test]
    async fn unknown_peer_dropped_when_policy_enabled() {
        let hub = MemoryHub::new();
        let mgr = SessionManager::new(
            id("AAAAAA"),
            Arc::new(hub.endpoint()),
            SessionConfig {
                require_known_peer: true,
                ..SessionConfig::default()
            },
        );
        mgr.set_known_peers([id("BBBBBB")]);

        mgr.handle_inbound(Inbound { from: id("CCCCCC"), text: "spam".into() });
        mgr.handle_inbound(Inbound { from: id("BBBBBB"), text: "hi".into() });

        let notes = mgr.take_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].from, id("BBBBBB"));
    }

    #[tokio::test]
    async fn inbound_pump_routes_transport_messages() {
        let hub = MemoryHub::new();
        let alice_endpoint = Arc::new(hub.endpoint());
        let mgr = SessionManager::new(
            id("AAAAAA"),
            alice_endpoint.clone(),
            SessionConfig::default(),
        );
        mgr.register().await.unwrap();
        mgr.select_contact(id("BBBBBB"));

        let rx = alice_endpoint.subscribe().unwrap();
        let token = CancellationToken::new();
        let pump = {
            let mgr = mgr.clone();
            let token = token.clone();
            tokio::spawn(async move { mgr.run_inbound(rx, token).await })
        };

        let bob = manager(&hub, "BBBBBB").await;
        bob.select_contact(id("AAAAAA"));
        bob.send("ping").await.unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        let texts: Vec<String> = mgr.transcript().iter().map(|e| e.text.clone()).collect();
        assert_eq!(texts, vec!["ping"]);

        token.cancel();
        pump.await.unwrap();
    }

    // Transport whose connect never resolves, for deadline tests.
    struct StalledTransport;

    #[async_trait]
    impl Transport for StalledTransport {
        async fn register(&self, _local: &PeerId) -> Result<(), ChannelError> {
            Ok(())
        }

        async fn connect(&self, _remote: &PeerId) -> Result<Box<dyn Channel>, ChannelError> {
            std::future::pending().await
        }

        fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<Inbound>, ChannelError> {
            Err(ChannelError::Closed)
        }
    }

    #[tokio::test]
    async fn stalled_connect_times_out_into_failed() {
        let mgr = SessionManager::new(
            id("AAAAAA"),
            Arc::new(StalledTransport),
            SessionConfig {
                connect_timeout: Duration::from_millis(20),
                ..SessionConfig::default()
            },
        );
        mgr.select_contact(id("BBBBBB"));

        let err = mgr.send("hello").await.err().unwrap();
        assert_matches!(err, SessionError::Channel(ChannelError::Timeout));
        assert_eq!(mgr.status(), LinkStatus::Failed);
    }

    // Transport whose connect waits for an external release, so a test can
    // switch selection while a send is in flight.
    struct GatedTransport {
        inner: crate::memory::MemoryTransport,
        gate: Mutex<Option<tokio::sync::oneshot::Receiver<()>>>,
    }

    impl GatedTransport {
        fn new(hub: &MemoryHub) -> (Self, tokio::sync::oneshot::Sender<()>) {
            let (tx, rx) = tokio::sync::oneshot::channel();
            (
                Self {
                    inner: hub.endpoint(),
                    gate: Mutex::new(Some(rx)),
                },
                tx,
            )
        }
    }

    #[async_trait]
    impl Transport for GatedTransport {
        async fn register(&self, local: &PeerId) -> Result<(), ChannelError> {
            self.inner.register(local).await
        }

        async fn connect(&self, remote: &PeerId) -> Result<Box<dyn Channel>, ChannelError> {
            // Take the receiver out before awaiting; the guard must not
            // live across an await point.
            let gate = self.gate.lock().take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            self.inner.connect(remote).await
        }

        fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<Inbound>, ChannelError> {
            self.inner.subscribe()
        }
    }

    #[tokio::test]
    async fn completion_after_selection_switch_is_dropped() {
        let hub = MemoryHub::new();
        let _bob = manager(&hub, "BBBBBB").await;
        let (transport, release) = GatedTransport::new(&hub);
        let mgr = SessionManager::new(id("AAAAAA"), Arc::new(transport), SessionConfig::default());
        mgr.register().await.unwrap();

        mgr.select_contact(id("BBBBBB"));
        let send = {
            let mgr = mgr.clone();
            tokio::spawn(async move { mgr.send("for bob").await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        mgr.select_contact(id("CCCCCC"));
        release.send(()).unwrap();

        send.await.unwrap().unwrap();

        // The completed send belongs to the old conversation; the new one
        // stays untouched.
        assert!(mgr.transcript().is_empty());
        assert_eq!(mgr.status(), LinkStatus::Disconnected);
    }
}
