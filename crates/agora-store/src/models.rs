//! Domain model structs held in the in-memory stores.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to the HTTP layer as a JSON response body.

use agora_shared::{CallId, GroupId, MessageId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Friend requests
// ---------------------------------------------------------------------------

/// Status of a friend relationship, mirrored on both endpoints.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FriendRequestStatus {
    Pending,
    Accepted,
    Declined,
}

/// Which side of the pair sent the request.  Mirrored entries carry opposite
/// directions; only the `Incoming` holder may respond.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestDirection {
    Incoming,
    Outgoing,
}

/// One side's view of a friend-request pair, keyed by the counterpart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FriendRequestEntry {
    pub status: FriendRequestStatus,
    pub direction: RequestDirection,
    pub created_at: DateTime<Utc>,
}

/// A pending incoming request as returned to the target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingRequest {
    pub from: UserId,
    pub received_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Direct messages
// ---------------------------------------------------------------------------

/// A single direct message.  `read` is the only mutable field, flipped by
/// the recipient's mark-conversation-read action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectMessage {
    pub id: MessageId,
    pub sender: UserId,
    pub recipient: UserId,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    pub read: bool,
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

/// A message group.  The creator is permanently privileged and always a
/// member; the member list never becomes empty while the group exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub creator: UserId,
    pub members: Vec<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Group {
    pub fn is_member(&self, user: &UserId) -> bool {
        self.members.contains(user)
    }
}

/// A message posted to a group.  Immutable once created; no read tracking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupMessage {
    pub id: MessageId,
    pub group_id: GroupId,
    pub sender: UserId,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Call signaling
// ---------------------------------------------------------------------------

/// The SDP offer that opens a call session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallOffer {
    pub caller: UserId,
    pub callee: UserId,
    pub sdp: String,
    pub created_at: DateTime<Utc>,
}

/// The callee's SDP answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallAnswer {
    pub responder: UserId,
    pub sdp: String,
    pub created_at: DateTime<Utc>,
}

/// A connectivity candidate, opaque beyond its contributor tag.  The tag is
/// what lets each side poll for only the counterpart's contributions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceCandidate {
    pub contributor: UserId,
    pub candidate: String,
}

/// Ephemeral rendezvous record for one peer-to-peer call.  Removed entirely
/// by end-call; there is no automatic expiry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallSession {
    pub id: CallId,
    pub offer: CallOffer,
    pub answer: Option<CallAnswer>,
    pub candidates: Vec<IceCandidate>,
}

impl CallSession {
    /// Only the two identities named in the offer may read or write the
    /// session.
    pub fn is_participant(&self, user: &UserId) -> bool {
        &self.offer.caller == user || &self.offer.callee == user
    }
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

/// Display profile for an identity.  The core only reads these to resolve
/// names for call targets and message threads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub user: UserId,
    pub display_name: String,
    /// Optional reference to an avatar blob held by external blob storage.
    pub avatar_ref: Option<String>,
    pub updated_at: DateTime<Utc>,
}
