//! Direct messaging: append-only message log with per-message read flags.
//!
//! Messages are held in insertion order; a conversation is the filtered
//! projection over the unordered pair of endpoints, sorted ascending by
//! timestamp (message id breaks ties) before it is handed out.

use std::sync::Arc;

use agora_shared::{MessageId, UserId};
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::Result;
use crate::models::DirectMessage;

#[derive(Default)]
struct MessagingState {
    messages: Vec<DirectMessage>,
    next_id: u64,
}

/// Cloneable handle to the direct-message store.
#[derive(Clone, Default)]
pub struct Messaging {
    inner: Arc<Mutex<MessagingState>>,
}

impl Messaging {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an immutable message with a fresh monotonic id.
    ///
    /// The recipient is not validated against any profile; messages may
    /// target any identity.
    pub async fn send(
        &self,
        caller: &UserId,
        recipient: &UserId,
        content: String,
    ) -> Result<MessageId> {
        let mut state = self.inner.lock().await;
        state.next_id += 1;
        let id = MessageId(state.next_id);
        state.messages.push(DirectMessage {
            id,
            sender: caller.clone(),
            recipient: recipient.clone(),
            content,
            sent_at: Utc::now(),
            read: false,
        });

        info!(id = %id, from = %caller.short(), to = %recipient.short(), "direct message stored");
        Ok(id)
    }

    /// All messages between the caller and `other`, oldest first.
    pub async fn conversation(&self, caller: &UserId, other: &UserId) -> Vec<DirectMessage> {
        let state = self.inner.lock().await;
        let mut out: Vec<DirectMessage> = state
            .messages
            .iter()
            .filter(|m| {
                (&m.sender == caller && &m.recipient == other)
                    || (&m.sender == other && &m.recipient == caller)
            })
            .cloned()
            .collect();
        out.sort_by(|a, b| a.sent_at.cmp(&b.sent_at).then(a.id.cmp(&b.id)));
        out
    }

    /// Distinct counterparts the caller has exchanged messages with,
    /// ordered by most recent message first.
    pub async fn conversation_partners(&self, caller: &UserId) -> Vec<UserId> {
        let state = self.inner.lock().await;
        let mut latest: Vec<(UserId, chrono::DateTime<Utc>, MessageId)> = Vec::new();
        for m in &state.messages {
            let other = if &m.sender == caller {
                &m.recipient
            } else if &m.recipient == caller {
                &m.sender
            } else {
                continue;
            };
            match latest.iter_mut().find(|(u, _, _)| u == other) {
                Some(slot) if (m.sent_at, m.id) > (slot.1, slot.2) => {
                    slot.1 = m.sent_at;
                    slot.2 = m.id;
                }
                Some(_) => {}
                None => latest.push((other.clone(), m.sent_at, m.id)),
            }
        }
        latest.sort_by(|a, b| (b.1, b.2).cmp(&(a.1, a.2)));
        latest.into_iter().map(|(u, _, _)| u).collect()
    }

    /// Flip `read` on every unread message from `other` to the caller.
    /// Idempotent; repeated calls are harmless.
    pub async fn mark_conversation_read(&self, caller: &UserId, other: &UserId) {
        let mut state = self.inner.lock().await;
        let mut flipped = 0usize;
        for m in state
            .messages
            .iter_mut()
            .filter(|m| !m.read && &m.sender == other && &m.recipient == caller)
        {
            m.read = true;
            flipped += 1;
        }
        if flipped > 0 {
            debug!(user = %caller.short(), other = %other.short(), flipped, "conversation marked read");
        }
    }

    /// Count of unread messages addressed to the caller, across all
    /// conversations.
    pub async fn unread_count(&self, caller: &UserId) -> usize {
        let state = self.inner.lock().await;
        state
            .messages
            .iter()
            .filter(|m| !m.read && &m.recipient == caller)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(s: &str) -> UserId {
        UserId::from(s)
    }

    #[tokio::test]
    async fn conversation_is_complete_and_ordered() {
        let store = Messaging::new();
        let (a, b, c) = (user("alice"), user("bob"), user("carol"));

        store.send(&a, &b, "hi".into()).await.unwrap();
        store.send(&b, &a, "yo".into()).await.unwrap();
        store.send(&a, &c, "unrelated".into()).await.unwrap();

        let from_a = store.conversation(&a, &b).await;
        let from_b = store.conversation(&b, &a).await;
        assert_eq!(from_a, from_b);

        let contents: Vec<&str> = from_a.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["hi", "yo"]);
        // The third-party message stays out of this projection.
        assert!(from_a.iter().all(|m| m.recipient != c && m.sender != c));
    }

    #[tokio::test]
    async fn every_message_appears_exactly_once() {
        let store = Messaging::new();
        let (a, b) = (user("alice"), user("bob"));

        let id = store.send(&a, &b, "hello".into()).await.unwrap();
        let conv = store.conversation(&b, &a).await;
        assert_eq!(conv.iter().filter(|m| m.id == id).count(), 1);
    }

    #[tokio::test]
    async fn ids_are_monotonic() {
        let store = Messaging::new();
        let (a, b) = (user("alice"), user("bob"));

        let first = store.send(&a, &b, "one".into()).await.unwrap();
        let second = store.send(&a, &b, "two".into()).await.unwrap();
        assert!(second > first);

        // Equal timestamps cannot reorder the projection: ids break ties.
        let conv = store.conversation(&a, &b).await;
        assert_eq!(conv[0].id, first);
        assert_eq!(conv[1].id, second);
    }

    #[tokio::test]
    async fn unread_count_and_mark_read_are_caller_scoped() {
        let store = Messaging::new();
        let (a, b) = (user("alice"), user("bob"));

        store.send(&a, &b, "hi".into()).await.unwrap();
        assert_eq!(store.unread_count(&b).await, 1);
        // The sender has nothing unread.
        assert_eq!(store.unread_count(&a).await, 0);

        store.mark_conversation_read(&b, &a).await;
        assert_eq!(store.unread_count(&b).await, 0);
        assert!(store.conversation(&a, &b).await[0].read);
    }

    #[tokio::test]
    async fn mark_read_is_idempotent() {
        let store = Messaging::new();
        let (a, b) = (user("alice"), user("bob"));

        store.send(&a, &b, "hi".into()).await.unwrap();
        store.mark_conversation_read(&b, &a).await;
        let once = store.conversation(&b, &a).await;
        store.mark_conversation_read(&b, &a).await;
        let twice = store.conversation(&b, &a).await;
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn mark_read_does_not_touch_outgoing_messages() {
        let store = Messaging::new();
        let (a, b) = (user("alice"), user("bob"));

        store.send(&a, &b, "hi".into()).await.unwrap();
        store.send(&b, &a, "yo".into()).await.unwrap();

        // Alice marking her side read leaves Bob's unread state alone.
        store.mark_conversation_read(&a, &b).await;
        assert_eq!(store.unread_count(&b).await, 1);
    }

    #[tokio::test]
    async fn partners_are_ordered_by_recency() {
        let store = Messaging::new();
        let (a, b, c) = (user("alice"), user("bob"), user("carol"));

        store.send(&a, &b, "first".into()).await.unwrap();
        store.send(&c, &a, "second".into()).await.unwrap();
        assert_eq!(
            store.conversation_partners(&a).await,
            vec![c.clone(), b.clone()]
        );

        // Newer traffic with bob moves him back to the front.
        store.send(&a, &b, "third".into()).await.unwrap();
        assert_eq!(store.conversation_partners(&a).await, vec![b, c]);
    }
}
