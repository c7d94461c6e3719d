//! Group membership and group messaging.
//!
//! Membership rules: add is creator-only; remove is creator-or-self; the
//! member list never becomes empty while the group exists, and the creator
//! can only leave by deleting the group.  Reads by non-members fail with an
//! authorization error so callers can tell "not yours" from "not found".

use std::collections::HashMap;
use std::sync::Arc;

use agora_shared::{GroupId, MessageId, UserId};
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::{Result, StoreError};
use crate::models::{Group, GroupMessage};

#[derive(Default)]
struct GroupsState {
    groups: HashMap<GroupId, Group>,
    messages: HashMap<GroupId, Vec<GroupMessage>>,
    next_message_id: u64,
}

/// Cloneable handle to the group store.
#[derive(Clone, Default)]
pub struct Groups {
    inner: Arc<Mutex<GroupsState>>,
}

impl Groups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a group with the caller as creator and sole member.
    pub async fn create(&self, caller: &UserId, name: String) -> GroupId {
        let mut state = self.inner.lock().await;
        let id = GroupId::new();
        state.groups.insert(
            id,
            Group {
                id,
                name: name.clone(),
                creator: caller.clone(),
                members: vec![caller.clone()],
                created_at: Utc::now(),
            },
        );

        info!(group = %id, creator = %caller.short(), name = %name, "group created");
        id
    }

    /// Delete a group and its messages.  Creator-only; the administrative
    /// override path is [`Groups::force_delete`].
    pub async fn delete(&self, caller: &UserId, id: GroupId) -> Result<()> {
        let mut state = self.inner.lock().await;
        let group = state.groups.get(&id).ok_or(StoreError::NotFound("group"))?;
        if &group.creator != caller {
            return Err(StoreError::Unauthorized("only the creator may delete a group"));
        }

        state.groups.remove(&id);
        state.messages.remove(&id);
        info!(group = %id, by = %caller.short(), "group deleted");
        Ok(())
    }

    /// Administrative delete, bypassing the creator check.  Still fatal on
    /// an absent group.
    pub async fn force_delete(&self, id: GroupId) -> Result<()> {
        let mut state = self.inner.lock().await;
        state
            .groups
            .remove(&id)
            .ok_or(StoreError::NotFound("group"))?;
        state.messages.remove(&id);
        info!(group = %id, "group deleted by administrative override");
        Ok(())
    }

    /// Add a member.  Creator-only; adding an existing member is fatal.
    pub async fn add_member(&self, caller: &UserId, id: GroupId, member: &UserId) -> Result<()> {
        let mut state = self.inner.lock().await;
        let group = state
            .groups
            .get_mut(&id)
            .ok_or(StoreError::NotFound("group"))?;
        if &group.creator != caller {
            return Err(StoreError::Unauthorized("only the creator may add members"));
        }
        if group.is_member(member) {
            return Err(StoreError::Conflict("already a group member"));
        }

        group.members.push(member.clone());
        info!(group = %id, member = %member.short(), "group member added");
        Ok(())
    }

    /// Remove a member.  The creator may remove anyone else; any member may
    /// remove themselves.  Removing a non-member, the last remaining member,
    /// or the creator is fatal — deletion is the only path to zero members.
    pub async fn remove_member(&self, caller: &UserId, id: GroupId, member: &UserId) -> Result<()> {
        let mut state = self.inner.lock().await;
        let group = state
            .groups
            .get_mut(&id)
            .ok_or(StoreError::NotFound("group"))?;
        if &group.creator != caller && caller != member {
            return Err(StoreError::Unauthorized(
                "only the creator or the member themselves may remove a member",
            ));
        }
        if !group.is_member(member) {
            return Err(StoreError::InvalidState("not a group member"));
        }
        if &group.creator == member {
            return Err(StoreError::InvalidState(
                "the creator cannot be removed; delete the group instead",
            ));
        }
        if group.members.len() == 1 {
            return Err(StoreError::InvalidState("a group must keep at least one member"));
        }

        group.members.retain(|m| m != member);
        info!(group = %id, member = %member.short(), by = %caller.short(), "group member removed");
        Ok(())
    }

    /// Groups the caller is currently a member of, newest first.
    pub async fn groups_of(&self, caller: &UserId) -> Vec<Group> {
        let state = self.inner.lock().await;
        let mut out: Vec<Group> = state
            .groups
            .values()
            .filter(|g| g.is_member(caller))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.0.cmp(&b.id.0)));
        out
    }

    /// Fetch a group.  Member-only: a non-member gets an authorization
    /// error, not an empty result.
    pub async fn get(&self, caller: &UserId, id: GroupId) -> Result<Group> {
        let state = self.inner.lock().await;
        let group = state.groups.get(&id).ok_or(StoreError::NotFound("group"))?;
        if !group.is_member(caller) {
            return Err(StoreError::Unauthorized("not a group member"));
        }
        Ok(group.clone())
    }

    /// Append a message.  The sender must be a current member.
    pub async fn send_message(
        &self,
        caller: &UserId,
        id: GroupId,
        content: String,
    ) -> Result<MessageId> {
        let mut state = self.inner.lock().await;
        let group = state.groups.get(&id).ok_or(StoreError::NotFound("group"))?;
        if !group.is_member(caller) {
            return Err(StoreError::Unauthorized("not a group member"));
        }

        state.next_message_id += 1;
        let message_id = MessageId(state.next_message_id);
        state.messages.entry(id).or_default().push(GroupMessage {
            id: message_id,
            group_id: id,
            sender: caller.clone(),
            content,
            sent_at: Utc::now(),
        });

        info!(group = %id, id = %message_id, from = %caller.short(), "group message stored");
        Ok(message_id)
    }

    /// All messages of a group, oldest first.  Member-only.
    pub async fn messages(&self, caller: &UserId, id: GroupId) -> Result<Vec<GroupMessage>> {
        let state = self.inner.lock().await;
        let group = state.groups.get(&id).ok_or(StoreError::NotFound("group"))?;
        if !group.is_member(caller) {
            return Err(StoreError::Unauthorized("not a group member"));
        }

        let mut out = state.messages.get(&id).cloned().unwrap_or_default();
        out.sort_by(|a, b| a.sent_at.cmp(&b.sent_at).then(a.id.cmp(&b.id)));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(s: &str) -> UserId {
        UserId::from(s)
    }

    #[tokio::test]
    async fn creator_is_the_sole_initial_member() {
        let groups = Groups::new();
        let a = user("alice");

        let id = groups.create(&a, "reading club".into()).await;
        let group = groups.get(&a, id).await.unwrap();
        assert_eq!(group.creator, a);
        assert_eq!(group.members, vec![a.clone()]);
        assert_eq!(groups.groups_of(&a).await.len(), 1);
    }

    #[tokio::test]
    async fn only_the_creator_adds_members() {
        let groups = Groups::new();
        let (a, b, c) = (user("alice"), user("bob"), user("carol"));

        let id = groups.create(&a, "club".into()).await;
        groups.add_member(&a, id, &b).await.unwrap();

        assert!(matches!(
            groups.add_member(&b, id, &c).await,
            Err(StoreError::Unauthorized(_))
        ));
        assert!(matches!(
            groups.add_member(&a, id, &b).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn member_removal_rules() {
        let groups = Groups::new();
        let (a, b, c) = (user("alice"), user("bob"), user("carol"));

        let id = groups.create(&a, "club".into()).await;
        groups.add_member(&a, id, &b).await.unwrap();
        groups.add_member(&a, id, &c).await.unwrap();

        // A plain member cannot remove someone else.
        assert!(matches!(
            groups.remove_member(&b, id, &c).await,
            Err(StoreError::Unauthorized(_))
        ));
        // Self-removal is allowed for any member.
        groups.remove_member(&c, id, &c).await.unwrap();
        // The creator may remove anyone else.
        groups.remove_member(&a, id, &b).await.unwrap();

        // Removing a non-member is fatal.
        assert!(matches!(
            groups.remove_member(&a, id, &b).await,
            Err(StoreError::InvalidState(_))
        ));
        // The creator cannot be removed, which also keeps the group
        // from ever reaching zero members.
        assert!(matches!(
            groups.remove_member(&a, id, &a).await,
            Err(StoreError::InvalidState(_))
        ));
        assert_eq!(groups.get(&a, id).await.unwrap().members, vec![a]);
    }

    #[tokio::test]
    async fn non_members_get_authorization_errors_not_empty_results() {
        let groups = Groups::new();
        let (a, b) = (user("alice"), user("bob"));

        let id = groups.create(&a, "club".into()).await;
        assert!(matches!(
            groups.get(&b, id).await,
            Err(StoreError::Unauthorized(_))
        ));
        assert!(matches!(
            groups.messages(&b, id).await,
            Err(StoreError::Unauthorized(_))
        ));
        assert!(matches!(
            groups.send_message(&b, id, "hi".into()).await,
            Err(StoreError::Unauthorized(_))
        ));
        // An absent group is distinguishable from an unauthorized one.
        assert_eq!(
            groups.get(&b, GroupId::new()).await,
            Err(StoreError::NotFound("group"))
        );
    }

    #[tokio::test]
    async fn group_messages_are_ordered_and_member_scoped() {
        let groups = Groups::new();
        let (a, b) = (user("alice"), user("bob"));

        let id = groups.create(&a, "club".into()).await;
        groups.add_member(&a, id, &b).await.unwrap();

        let first = groups.send_message(&a, id, "welcome".into()).await.unwrap();
        let second = groups.send_message(&b, id, "thanks".into()).await.unwrap();
        assert!(second > first);

        let messages = groups.messages(&b, id).await.unwrap();
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["welcome", "thanks"]);
    }

    #[tokio::test]
    async fn delete_is_creator_only_and_cascades_messages() {
        let groups = Groups::new();
        let (a, b) = (user("alice"), user("bob"));

        let id = groups.create(&a, "club".into()).await;
        groups.add_member(&a, id, &b).await.unwrap();
        groups.send_message(&a, id, "soon gone".into()).await.unwrap();

        assert!(matches!(
            groups.delete(&b, id).await,
            Err(StoreError::Unauthorized(_))
        ));

        groups.delete(&a, id).await.unwrap();
        assert_eq!(groups.get(&a, id).await, Err(StoreError::NotFound("group")));
        assert!(groups.groups_of(&a).await.is_empty());

        // Re-creating under a fresh id starts with an empty message log.
        let id2 = groups.create(&a, "club".into()).await;
        assert!(groups.messages(&a, id2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn force_delete_bypasses_the_creator_check() {
        let groups = Groups::new();
        let a = user("alice");

        let id = groups.create(&a, "club".into()).await;
        groups.force_delete(id).await.unwrap();
        assert_eq!(groups.force_delete(id).await, Err(StoreError::NotFound("group")));
    }
}
