//! Append-only conversation view.
//!
//! One transcript per active conversation; switching conversations clears it.
//! Order is local send-completion order interleaved with remote arrival order
//! as observed by the session manager.

use chrono::{DateTime, Utc};

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    /// The local endpoint.
    Me,
    /// The selected remote peer.
    Peer,
}

/// One rendered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    /// Which side of the conversation produced the message.
    pub sender: Sender,
    /// Message text, verbatim.
    pub text: String,
    /// When the entry was appended locally.
    pub at: DateTime<Utc>,
}

/// The conversation transcript for the currently selected contact.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    /// Create an empty transcript.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Entries are never reordered or removed.
    pub fn push(&mut self, sender: Sender, text: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            sender,
            text: text.into(),
            at: Utc::now(),
        });
    }

    /// Drop all entries. Called on conversation switch.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// All entries in append order.
    #[must_use]
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
