//! Social graph: the friend-request state machine and the follow graph.
//!
//! Friend status is stored twice, once under each endpoint, and the two
//! entries are written in the same locked section so the mirror invariant
//! (`status(A→B) == status(B→A)`) holds after every completed operation.
//! The follow graph keeps the dual `followers`/`following` sets in lock-step
//! the same way.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use agora_shared::UserId;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::{Result, StoreError};
use crate::models::{FriendRequestEntry, FriendRequestStatus, PendingRequest, RequestDirection};

#[derive(Default)]
struct SocialState {
    /// Per-identity map of counterpart → request entry.  Entries come in
    /// mirrored pairs with opposite directions.
    requests: HashMap<UserId, HashMap<UserId, FriendRequestEntry>>,
    /// Who follows me.
    followers: HashMap<UserId, HashSet<UserId>>,
    /// Who I follow.
    following: HashMap<UserId, HashSet<UserId>>,
}

/// Cloneable handle to the social graph store.
#[derive(Clone, Default)]
pub struct SocialGraph {
    inner: Arc<Mutex<SocialState>>,
}

impl SocialGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Friend requests
    // ------------------------------------------------------------------

    /// Record a pending request on both endpoints.
    ///
    /// Re-sending while a Pending or Accepted record exists is a conflict.
    /// A previously Declined pair may be re-requested, which resets both
    /// sides to Pending.
    pub async fn send_friend_request(&self, caller: &UserId, target: &UserId) -> Result<()> {
        if caller == target {
            return Err(StoreError::SelfReference);
        }

        let mut state = self.inner.lock().await;

        match state.requests.get(caller).and_then(|m| m.get(target)) {
            Some(entry) if entry.status == FriendRequestStatus::Pending => {
                return Err(StoreError::Conflict("friend request already pending"))
            }
            Some(entry) if entry.status == FriendRequestStatus::Accepted => {
                return Err(StoreError::Conflict("already friends"))
            }
            _ => {}
        }

        let now = Utc::now();
        state.requests.entry(caller.clone()).or_default().insert(
            target.clone(),
            FriendRequestEntry {
                status: FriendRequestStatus::Pending,
                direction: RequestDirection::Outgoing,
                created_at: now,
            },
        );
        state.requests.entry(target.clone()).or_default().insert(
            caller.clone(),
            FriendRequestEntry {
                status: FriendRequestStatus::Pending,
                direction: RequestDirection::Incoming,
                created_at: now,
            },
        );

        info!(from = %caller.short(), to = %target.short(), "friend request sent");
        Ok(())
    }

    /// Resolve a pending incoming request to Accepted or Declined, writing
    /// both endpoints in the same locked section.
    ///
    /// Responding to a request that does not exist, was sent by the caller
    /// themselves, or is already resolved is a fatal error.
    pub async fn respond_to_friend_request(
        &self,
        caller: &UserId,
        from: &UserId,
        accept: bool,
    ) -> Result<FriendRequestStatus> {
        let mut state = self.inner.lock().await;

        let entry = state
            .requests
            .get(caller)
            .and_then(|m| m.get(from))
            .ok_or(StoreError::NotFound("friend request"))?;

        if entry.direction != RequestDirection::Incoming {
            return Err(StoreError::Unauthorized(
                "only the request's target may respond",
            ));
        }
        if entry.status != FriendRequestStatus::Pending {
            return Err(StoreError::InvalidState("friend request already processed"));
        }

        let status = if accept {
            FriendRequestStatus::Accepted
        } else {
            FriendRequestStatus::Declined
        };

        // Both sides exist by construction; write them back to back under
        // the same lock so the mirror invariant holds.
        if let Some(entry) = state
            .requests
            .get_mut(caller)
            .and_then(|m| m.get_mut(from))
        {
            entry.status = status;
        }
        if let Some(entry) = state
            .requests
            .get_mut(from)
            .and_then(|m| m.get_mut(caller))
        {
            entry.status = status;
        }

        info!(
            user = %caller.short(),
            from = %from.short(),
            accepted = accept,
            "friend request resolved"
        );
        Ok(status)
    }

    /// All counterparts with mirrored status Accepted, sorted for stable
    /// output.
    pub async fn friends_of(&self, user: &UserId) -> Vec<UserId> {
        let state = self.inner.lock().await;
        let mut friends: Vec<UserId> = state
            .requests
            .get(user)
            .map(|m| {
                m.iter()
                    .filter(|(_, e)| e.status == FriendRequestStatus::Accepted)
                    .map(|(other, _)| other.clone())
                    .collect()
            })
            .unwrap_or_default();
        friends.sort();
        friends
    }

    /// Pending requests directed at the caller, oldest first.
    pub async fn pending_requests(&self, caller: &UserId) -> Vec<PendingRequest> {
        let state = self.inner.lock().await;
        let mut pending: Vec<PendingRequest> = state
            .requests
            .get(caller)
            .map(|m| {
                m.iter()
                    .filter(|(_, e)| {
                        e.status == FriendRequestStatus::Pending
                            && e.direction == RequestDirection::Incoming
                    })
                    .map(|(from, e)| PendingRequest {
                        from: from.clone(),
                        received_at: e.created_at,
                    })
                    .collect()
            })
            .unwrap_or_default();
        pending.sort_by(|a, b| a.received_at.cmp(&b.received_at).then(a.from.cmp(&b.from)));
        pending
    }

    /// Single-pair status lookup; `None` when no record exists.
    pub async fn request_status(
        &self,
        caller: &UserId,
        other: &UserId,
    ) -> Option<FriendRequestStatus> {
        let state = self.inner.lock().await;
        state
            .requests
            .get(caller)
            .and_then(|m| m.get(other))
            .map(|e| e.status)
    }

    // ------------------------------------------------------------------
    // Follow graph
    // ------------------------------------------------------------------

    /// Add the caller to `target`'s followers and `target` to the caller's
    /// following set, as one locked unit.  Already-following is a no-op.
    pub async fn follow(&self, caller: &UserId, target: &UserId) -> Result<()> {
        if caller == target {
            return Err(StoreError::SelfReference);
        }

        let mut state = self.inner.lock().await;
        state
            .following
            .entry(caller.clone())
            .or_default()
            .insert(target.clone());
        state
            .followers
            .entry(target.clone())
            .or_default()
            .insert(caller.clone());

        info!(follower = %caller.short(), target = %target.short(), "follow edge added");
        Ok(())
    }

    /// Remove the follow edge from both sets.  Unfollowing someone the
    /// caller never followed is a silent no-op.
    pub async fn unfollow(&self, caller: &UserId, target: &UserId) {
        let mut state = self.inner.lock().await;
        if let Some(set) = state.following.get_mut(caller) {
            set.remove(target);
        }
        if let Some(set) = state.followers.get_mut(target) {
            set.remove(caller);
        }
    }

    pub async fn followers_of(&self, user: &UserId) -> Vec<UserId> {
        let state = self.inner.lock().await;
        let mut out: Vec<UserId> = state
            .followers
            .get(user)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default();
        out.sort();
        out
    }

    pub async fn following_of(&self, user: &UserId) -> Vec<UserId> {
        let state = self.inner.lock().await;
        let mut out: Vec<UserId> = state
            .following
            .get(user)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default();
        out.sort();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(s: &str) -> UserId {
        UserId::from(s)
    }

    #[tokio::test]
    async fn request_is_mirrored_on_both_sides() {
        let graph = SocialGraph::new();
        let (a, b) = (user("alice"), user("bob"));

        graph.send_friend_request(&a, &b).await.unwrap();

        assert_eq!(
            graph.request_status(&a, &b).await,
            Some(FriendRequestStatus::Pending)
        );
        assert_eq!(
            graph.request_status(&b, &a).await,
            Some(FriendRequestStatus::Pending)
        );
    }

    #[tokio::test]
    async fn accept_flow_makes_both_sides_friends() {
        let graph = SocialGraph::new();
        let (a, b) = (user("alice"), user("bob"));

        graph.send_friend_request(&a, &b).await.unwrap();
        let status = graph.respond_to_friend_request(&b, &a, true).await.unwrap();
        assert_eq!(status, FriendRequestStatus::Accepted);

        assert_eq!(graph.friends_of(&a).await, vec![b.clone()]);
        assert_eq!(graph.friends_of(&b).await, vec![a.clone()]);
        assert_eq!(
            graph.request_status(&a, &b).await,
            graph.request_status(&b, &a).await
        );
    }

    #[tokio::test]
    async fn decline_is_mirrored_and_not_a_friendship() {
        let graph = SocialGraph::new();
        let (a, b) = (user("alice"), user("bob"));

        graph.send_friend_request(&a, &b).await.unwrap();
        graph
            .respond_to_friend_request(&b, &a, false)
            .await
            .unwrap();

        assert_eq!(
            graph.request_status(&a, &b).await,
            Some(FriendRequestStatus::Declined)
        );
        assert_eq!(
            graph.request_status(&b, &a).await,
            Some(FriendRequestStatus::Declined)
        );
        assert!(graph.friends_of(&a).await.is_empty());
    }

    #[tokio::test]
    async fn self_request_is_fatal() {
        let graph = SocialGraph::new();
        let a = user("alice");
        assert_eq!(
            graph.send_friend_request(&a, &a).await,
            Err(StoreError::SelfReference)
        );
    }

    #[tokio::test]
    async fn resend_while_pending_or_accepted_is_a_conflict() {
        let graph = SocialGraph::new();
        let (a, b) = (user("alice"), user("bob"));

        graph.send_friend_request(&a, &b).await.unwrap();
        assert!(matches!(
            graph.send_friend_request(&a, &b).await,
            Err(StoreError::Conflict(_))
        ));
        // The target re-sending the other way is the same pair.
        assert!(matches!(
            graph.send_friend_request(&b, &a).await,
            Err(StoreError::Conflict(_))
        ));

        graph.respond_to_friend_request(&b, &a, true).await.unwrap();
        assert!(matches!(
            graph.send_friend_request(&a, &b).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn declined_pair_may_be_rerequested() {
        let graph = SocialGraph::new();
        let (a, b) = (user("alice"), user("bob"));

        graph.send_friend_request(&a, &b).await.unwrap();
        graph
            .respond_to_friend_request(&b, &a, false)
            .await
            .unwrap();

        graph.send_friend_request(&b, &a).await.unwrap();
        assert_eq!(
            graph.request_status(&a, &b).await,
            Some(FriendRequestStatus::Pending)
        );
        let pending = graph.pending_requests(&a).await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].from, b);
    }

    #[tokio::test]
    async fn respond_requires_a_pending_incoming_request() {
        let graph = SocialGraph::new();
        let (a, b, c) = (user("alice"), user("bob"), user("carol"));

        // No request at all.
        assert_eq!(
            graph.respond_to_friend_request(&b, &a, true).await,
            Err(StoreError::NotFound("friend request"))
        );

        // The sender cannot respond to their own outgoing request.
        graph.send_friend_request(&a, &b).await.unwrap();
        assert!(matches!(
            graph.respond_to_friend_request(&a, &b, true).await,
            Err(StoreError::Unauthorized(_))
        ));

        // Already resolved.
        graph.respond_to_friend_request(&b, &a, true).await.unwrap();
        assert!(matches!(
            graph.respond_to_friend_request(&b, &a, false).await,
            Err(StoreError::InvalidState(_))
        ));

        // A third party never had a request.
        assert!(graph.respond_to_friend_request(&c, &a, true).await.is_err());
    }

    #[tokio::test]
    async fn pending_list_only_contains_incoming_requests() {
        let graph = SocialGraph::new();
        let (a, b, c) = (user("alice"), user("bob"), user("carol"));

        graph.send_friend_request(&a, &b).await.unwrap();
        graph.send_friend_request(&c, &b).await.unwrap();

        // The sender's own pending list is empty.
        assert!(graph.pending_requests(&a).await.is_empty());

        let pending = graph.pending_requests(&b).await;
        let froms: Vec<&UserId> = pending.iter().map(|p| &p.from).collect();
        assert_eq!(froms.len(), 2);
        assert!(froms.contains(&&a) && froms.contains(&&c));
    }

    #[tokio::test]
    async fn follow_edges_are_symmetric() {
        let graph = SocialGraph::new();
        let (a, b) = (user("alice"), user("bob"));

        graph.follow(&a, &b).await.unwrap();

        assert_eq!(graph.following_of(&a).await, vec![b.clone()]);
        assert_eq!(graph.followers_of(&b).await, vec![a.clone()]);
        assert!(graph.followers_of(&a).await.is_empty());

        // Duplicate follow is a set-level no-op.
        graph.follow(&a, &b).await.unwrap();
        assert_eq!(graph.following_of(&a).await.len(), 1);

        graph.unfollow(&a, &b).await;
        assert!(graph.following_of(&a).await.is_empty());
        assert!(graph.followers_of(&b).await.is_empty());
    }

    #[tokio::test]
    async fn unfollow_without_an_edge_is_a_noop() {
        let graph = SocialGraph::new();
        let (a, b) = (user("alice"), user("bob"));
        graph.unfollow(&a, &b).await;
        assert!(graph.followers_of(&b).await.is_empty());
    }

    #[tokio::test]
    async fn self_follow_is_fatal() {
        let graph = SocialGraph::new();
        let a = user("alice");
        assert_eq!(graph.follow(&a, &a).await, Err(StoreError::SelfReference));
    }

    #[tokio::test]
    async fn following_and_friendship_are_orthogonal() {
        let graph = SocialGraph::new();
        let (a, b) = (user("alice"), user("bob"));

        graph.follow(&a, &b).await.unwrap();
        assert_eq!(graph.request_status(&a, &b).await, None);

        graph.send_friend_request(&a, &b).await.unwrap();
        graph.respond_to_friend_request(&b, &a, true).await.unwrap();
        // Friendship does not create follow edges.
        assert!(graph.followers_of(&a).await.is_empty());
    }
}
