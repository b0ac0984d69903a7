//! The block model: the immutable unit of the log
//!
//! A [`Block`] carries one typed operation, its author, a causal pointer to
//! the author's previous block, and a signature over the canonical unsigned
//! form. Blocks are created once by their author and never mutated; the
//! signature field itself is never part of the signed payload.

use crate::error::{LogError, Result};
use crate::signature::Keypair;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

/// Opaque public-key-derived operator handle
///
/// Hex-encoded (0x-prefixed address form in the default signature scheme).
/// Equality on the wire is case-insensitive; construction normalizes to
/// lowercase so the derived `Eq`/`Hash` agree with that rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(SmolStr);

impl Identity {
    /// Normalize a handle into an identity
    pub fn new(handle: impl AsRef<str>) -> Self {
        Self(SmolStr::new(handle.as_ref().to_ascii_lowercase()))
    }

    /// The normalized handle
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against an unnormalized handle
    pub fn matches(&self, handle: &str) -> bool {
        self.0.eq_ignore_ascii_case(handle)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(handle: &str) -> Self {
        Self::new(handle)
    }
}

impl Serialize for Identity {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = SmolStr::deserialize(deserializer)?;
        Ok(Self::new(raw))
    }
}

/// Opaque content identifier minted by the blob store
///
/// Globally unique for distinct byte content; used as the log store's key and
/// as the causal pointer value. Absence (`Option::None`) is the root sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(SmolStr);

impl ContentId {
    /// Wrap a stringified identifier
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(SmolStr::new(id.as_ref()))
    }

    /// The identifier's string form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Which projection a block's operation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    /// Profile operations: username, bio, avatar, follow list
    #[serde(rename = "PROFILE")]
    Profile,
    /// Timeline operations: the note list
    #[serde(rename = "TIMELINE")]
    Timeline,
}

/// Typed payload of a block, polymorphic over [`BlockKind`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Operation {
    /// Replace the profile username
    SetUsername {
        /// New username
        username: SmolStr,
    },
    /// Replace the profile bio
    SetBio {
        /// New bio text
        bio: SmolStr,
    },
    /// Replace the avatar reference
    SetAvatar {
        /// Blob-store reference to the avatar bytes
        avatar: ContentId,
    },
    /// Append an identity to the follow list (no-op when already present)
    AddFollowing {
        /// Identity to follow
        following_id: Identity,
    },
    /// Remove an identity from the follow list (no-op when absent)
    RemoveFollowing {
        /// Identity to unfollow
        following_id: Identity,
    },
    /// Append a note reference to the timeline (no-op when already present)
    AddNote {
        /// Blob-store reference to the note bytes
        note_ref: ContentId,
    },
    /// Remove a note reference from the timeline (no-op when absent)
    RemoveNote {
        /// Reference to remove
        note_ref: ContentId,
    },
}

impl Operation {
    /// The projection this operation belongs to
    pub fn kind(&self) -> BlockKind {
        match self {
            Operation::SetUsername { .. }
            | Operation::SetBio { .. }
            | Operation::SetAvatar { .. }
            | Operation::AddFollowing { .. }
            | Operation::RemoveFollowing { .. } => BlockKind::Profile,
            Operation::AddNote { .. } | Operation::RemoveNote { .. } => BlockKind::Timeline,
        }
    }
}

/// One signed entry of an identity's log
///
/// Wire form is DAG-CBOR with fields in declaration order; `previous` is
/// omitted for a root block. The signature authenticates the canonical
/// unsigned form (see [`Block::canonical_bytes`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Causal pointer to the author's previous block; `None` for a root block
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub previous: Option<ContentId>,

    /// Author-asserted creation time, milliseconds since the Unix epoch
    pub timestamp: i64,

    /// The identity that authored and signed this block
    pub operator: Identity,

    /// Projection the payload belongs to
    #[serde(rename = "type")]
    pub kind: BlockKind,

    /// The typed operation this block applies
    pub data: Operation,

    /// Recoverable signature over the canonical unsigned form
    #[serde(with = "serde_bytes_helper")]
    pub sig: Bytes,
}

/// Canonical unsigned form: the fixed-field tuple that gets signed.
/// `previous` is rendered as its string form, empty when absent.
#[derive(Serialize)]
struct CanonicalBlock<'a> {
    previous: &'a str,
    timestamp: i64,
    operator: &'a str,
    #[serde(rename = "type")]
    kind: BlockKind,
    data: &'a Operation,
}

impl Block {
    /// Create an unsigned block; the kind is derived from the operation
    pub fn new(
        previous: Option<ContentId>,
        timestamp: i64,
        operator: Identity,
        data: Operation,
    ) -> Self {
        let kind = data.kind();
        Self {
            previous,
            timestamp,
            operator,
            kind,
            data,
            sig: Bytes::new(),
        }
    }

    /// Whether this block is the origin of its log
    pub fn is_root(&self) -> bool {
        self.previous.is_none()
    }

    /// Serialize the canonical unsigned form (for signing/verification)
    ///
    /// The signature field is never part of this payload.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        let canonical = CanonicalBlock {
            previous: self
                .previous
                .as_ref()
                .map(ContentId::as_str)
                .unwrap_or(""),
            timestamp: self.timestamp,
            operator: self.operator.as_str(),
            kind: self.kind,
            data: &self.data,
        };
        serde_ipld_dagcbor::to_vec(&canonical).map_err(LogError::serialization)
    }

    /// Sign this block's canonical form with `key`
    pub fn sign(mut self, key: &Keypair) -> Result<Self> {
        let canonical = self.canonical_bytes()?;
        self.sig = key.sign(&canonical)?;
        Ok(self)
    }

    /// Serialize the full block (signature included) to DAG-CBOR
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        serde_ipld_dagcbor::to_vec(self).map_err(LogError::serialization)
    }

    /// Deserialize a full block from DAG-CBOR
    pub fn from_cbor(data: &[u8]) -> Result<Self> {
        serde_ipld_dagcbor::from_slice(data).map_err(LogError::serialization)
    }
}

mod serde_bytes_helper {
    //! Serialize `bytes::Bytes` as a CBOR byte string

    use bytes::Bytes;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serde_bytes::serialize(bytes.as_ref(), serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Bytes, D::Error>
    where
        D: Deserializer<'de>,
    {
        let vec: Vec<u8> = serde_bytes::deserialize(deserializer)?;
        Ok(Bytes::from(vec))
    }
}
