//! Head announcements and the pub/sub transport boundary
//!
//! A writer announces a new log head on its per-identity outbox topic; a
//! follower reacts by replicating from the announced pointer. The payload is
//! JSON: `{"type":"update","content":{"block":...,"timestamp":...}}`,
//! optionally wrapped in an [`Envelope`] that authenticates the announcement
//! itself, independently of the block-level signatures.

use crate::block::{ContentId, Identity};
use crate::error::{LogError, Result};
use crate::signature::{Keypair, Verifier};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Outbox topic for one identity
pub fn outbox_topic(identity: &Identity) -> String {
    format!("outbox/{identity}")
}

/// Head announcement published on an identity's outbox topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum Announcement {
    /// The log has a new head block
    Update {
        /// Content identifier of the new head
        block: ContentId,
        /// Head block timestamp, milliseconds since the Unix epoch
        timestamp: i64,
    },
}

impl Announcement {
    /// Announce `block` as the new head
    pub fn update(block: ContentId, timestamp: i64) -> Self {
        Self::Update { block, timestamp }
    }

    /// The announced head identifier
    pub fn block(&self) -> &ContentId {
        match self {
            Self::Update { block, .. } => block,
        }
    }

    /// Encode to the JSON wire form
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(LogError::serialization)
    }

    /// Decode from the JSON wire form
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(LogError::serialization)
    }
}

/// Optionally-authenticated wrapper around a published message
///
/// `signature` and `publisher` are present when the announcer chose to
/// authenticate the announcement; an unsigned envelope still carries a valid
/// message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// JSON-encoded announcement
    pub message: String,
    /// Hex recoverable signature over `message`, when authenticated
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub signature: Option<String>,
    /// Identity that produced `signature`
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub publisher: Option<Identity>,
}

impl Envelope {
    /// Wrap an announcement without authentication
    pub fn plain(announcement: &Announcement) -> Result<Self> {
        Ok(Self {
            message: announcement.to_json()?,
            signature: None,
            publisher: None,
        })
    }

    /// Wrap and sign an announcement with `key`
    pub fn signed(announcement: &Announcement, key: &Keypair) -> Result<Self> {
        let message = announcement.to_json()?;
        let sig = key.sign(message.as_bytes())?;
        Ok(Self {
            message,
            signature: Some(hex::encode(&sig)),
            publisher: Some(key.identity()),
        })
    }

    /// Decode the carried announcement
    pub fn announcement(&self) -> Result<Announcement> {
        Announcement::from_json(&self.message)
    }

    /// True iff the envelope is signed and the signature checks out under
    /// its publisher; unsigned envelopes are never authenticated
    pub fn is_authenticated<V: Verifier>(&self, verifier: &V) -> bool {
        match (&self.signature, &self.publisher) {
            (Some(sig), Some(publisher)) => match hex::decode(sig) {
                Ok(raw) => verifier.verify(self.message.as_bytes(), &raw, publisher),
                Err(_) => false,
            },
            _ => false,
        }
    }

    /// Encode to JSON bytes for publishing
    pub fn to_bytes(&self) -> Result<Bytes> {
        serde_json::to_vec(self)
            .map(Bytes::from)
            .map_err(LogError::serialization)
    }

    /// Decode from published JSON bytes
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        serde_json::from_slice(raw).map_err(LogError::serialization)
    }
}

/// Async publish/subscribe transport
///
/// Topics are per-identity outboxes; payloads are opaque bytes. `Clone` is
/// required so writers and listeners can share a handle.
#[trait_variant::make(Send)]
pub trait Transport: Clone {
    /// Stream of payloads for one subscribed topic
    type Subscription: Subscription + Send;

    /// Publish a payload on a topic
    async fn publish(&self, topic: &str, payload: Bytes) -> Result<()>;

    /// Subscribe to a topic's future payloads
    async fn subscribe(&self, topic: &str) -> Result<Self::Subscription>;
}

/// Receiving side of one topic subscription
#[trait_variant::make(Send)]
pub trait Subscription {
    /// Next payload, `None` once the topic is closed
    async fn next(&mut self) -> Option<Bytes>;
}

/// In-process fanout transport over broadcast channels
///
/// Useful for tests and single-process demos; every subscriber of a topic
/// sees every payload published after it subscribed.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    topics: Arc<Mutex<HashMap<String, broadcast::Sender<Bytes>>>>,
}

impl MemoryTransport {
    /// Create a transport with no topics yet
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, topic: &str) -> broadcast::Sender<Bytes> {
        let mut topics = self.topics.lock().unwrap();
        topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(64).0)
            .clone()
    }
}

impl Transport for MemoryTransport {
    type Subscription = MemorySubscription;

    async fn publish(&self, topic: &str, payload: Bytes) -> Result<()> {
        // A send error only means nobody is subscribed yet
        let _ = self.sender(topic).send(payload);
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<MemorySubscription> {
        Ok(MemorySubscription {
            inner: self.sender(topic).subscribe(),
        })
    }
}

/// Subscription handle for [`MemoryTransport`]
#[derive(Debug)]
pub struct MemorySubscription {
    inner: broadcast::Receiver<Bytes>,
}

impl Subscription for MemorySubscription {
    async fn next(&mut self) -> Option<Bytes> {
        loop {
            match self.inner.recv().await {
                Ok(payload) => return Some(payload),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
