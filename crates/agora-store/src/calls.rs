//! Call-signaling rendezvous for peer-to-peer call establishment.
//!
//! A session moves offer → answer while candidates accumulate from both
//! sides; both participants poll until the counterpart's data appears.
//! Only the two identities named in the offer may touch a session, and
//! ending the call removes the record outright.

use std::collections::HashMap;
use std::sync::Arc;

use agora_shared::{CallId, UserId};
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::models::{CallAnswer, CallOffer, CallSession, IceCandidate};

/// Cloneable handle to the call-session table.
#[derive(Clone, Default)]
pub struct CallBoard {
    inner: Arc<Mutex<HashMap<CallId, CallSession>>>,
}

impl CallBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the caller's offer, creating the session or replacing an
    /// existing one wholesale.  Re-offering is the renegotiation path: it
    /// resets the answer and the candidate list, never merges.  Replacing
    /// an existing session is itself a write to that session, so only its
    /// current participants may do it.
    pub async fn store_offer(
        &self,
        caller: &UserId,
        call_id: &CallId,
        callee: &UserId,
        sdp: String,
    ) -> Result<()> {
        if caller == callee {
            return Err(StoreError::SelfReference);
        }

        let mut sessions = self.inner.lock().await;
        if let Some(existing) = sessions.get(call_id) {
            Self::require_participant(existing, caller)?;
        }
        sessions.insert(
            call_id.clone(),
            CallSession {
                id: call_id.clone(),
                offer: CallOffer {
                    caller: caller.clone(),
                    callee: callee.clone(),
                    sdp,
                    created_at: Utc::now(),
                },
                answer: None,
                candidates: Vec::new(),
            },
        );

        info!(call = %call_id, caller = %caller.short(), callee = %callee.short(), "call offer stored");
        Ok(())
    }

    /// The session's offer, or `None` while no session exists.  Absence is
    /// the normal polling case, not an error; an existing session is still
    /// participant-restricted.
    pub async fn offer(&self, caller: &UserId, call_id: &CallId) -> Result<Option<CallOffer>> {
        let sessions = self.inner.lock().await;
        match sessions.get(call_id) {
            None => Ok(None),
            Some(session) => {
                Self::require_participant(session, caller)?;
                Ok(Some(session.offer.clone()))
            }
        }
    }

    /// Store the callee's answer.  Only the offer's callee may answer, and
    /// only once; renegotiation goes through a fresh offer.
    pub async fn store_answer(&self, caller: &UserId, call_id: &CallId, sdp: String) -> Result<()> {
        let mut sessions = self.inner.lock().await;
        let session = sessions
            .get_mut(call_id)
            .ok_or(StoreError::NotFound("call session"))?;
        if &session.offer.callee != caller {
            return Err(StoreError::Unauthorized("only the callee may answer"));
        }
        if session.answer.is_some() {
            return Err(StoreError::InvalidState("call already answered"));
        }

        session.answer = Some(CallAnswer {
            responder: caller.clone(),
            sdp,
            created_at: Utc::now(),
        });
        info!(call = %call_id, callee = %caller.short(), "call answer stored");
        Ok(())
    }

    /// The session's answer, or `None` while the callee has not answered.
    pub async fn answer(&self, caller: &UserId, call_id: &CallId) -> Result<Option<CallAnswer>> {
        let sessions = self.inner.lock().await;
        match sessions.get(call_id) {
            None => Ok(None),
            Some(session) => {
                Self::require_participant(session, caller)?;
                Ok(session.answer.clone())
            }
        }
    }

    /// Append a candidate tagged with the contributing participant.
    pub async fn add_candidate(
        &self,
        caller: &UserId,
        call_id: &CallId,
        candidate: String,
    ) -> Result<()> {
        let mut sessions = self.inner.lock().await;
        let session = sessions
            .get_mut(call_id)
            .ok_or(StoreError::NotFound("call session"))?;
        Self::require_participant(session, caller)?;

        session.candidates.push(IceCandidate {
            contributor: caller.clone(),
            candidate,
        });
        debug!(call = %call_id, from = %caller.short(), "ICE candidate appended");
        Ok(())
    }

    /// Candidates contributed by `contributor`, in arrival order.  Each side
    /// polls with the counterpart's identity to skip its own contributions.
    /// An absent session yields an empty list, matching the polling reads.
    pub async fn candidates_from(
        &self,
        caller: &UserId,
        call_id: &CallId,
        contributor: &UserId,
    ) -> Result<Vec<String>> {
        let sessions = self.inner.lock().await;
        match sessions.get(call_id) {
            None => Ok(Vec::new()),
            Some(session) => {
                Self::require_participant(session, caller)?;
                Ok(session
                    .candidates
                    .iter()
                    .filter(|c| &c.contributor == contributor)
                    .map(|c| c.candidate.clone())
                    .collect())
            }
        }
    }

    /// Remove the session.  Either participant may end the call at any
    /// stage; ending an absent session is fatal.
    pub async fn end(&self, caller: &UserId, call_id: &CallId) -> Result<()> {
        let mut sessions = self.inner.lock().await;
        let session = sessions
            .get(call_id)
            .ok_or(StoreError::NotFound("call session"))?;
        Self::require_participant(session, caller)?;

        sessions.remove(call_id);
        info!(call = %call_id, by = %caller.short(), "call ended");
        Ok(())
    }

    fn require_participant(session: &CallSession, user: &UserId) -> Result<()> {
        if session.is_participant(user) {
            Ok(())
        } else {
            Err(StoreError::Unauthorized("not a call participant"))
        }
    }
}
