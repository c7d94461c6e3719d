//! Direct-messaging handlers.
//!
//! Clients poll the conversation and unread-count queries on fixed
//! intervals; the intervals are client policy, not part of this contract.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use agora_shared::{MessageId, UserId};
use agora_store::DirectMessage;

use crate::api::AppState;
use crate::auth::Principal;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct SendMessageBody {
    pub to: UserId,
    pub content: String,
}

#[derive(Serialize)]
pub struct SendMessageResponse {
    pub id: MessageId,
}

#[derive(Serialize)]
pub struct UnreadCountResponse {
    pub count: usize,
}

pub async fn send_message(
    State(state): State<AppState>,
    Principal(caller): Principal,
    Json(body): Json<SendMessageBody>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    let id = state.messaging.send(&caller, &body.to, body.content).await?;
    Ok(Json(SendMessageResponse { id }))
}

pub async fn conversation(
    State(state): State<AppState>,
    Principal(caller): Principal,
    Path(other): Path<UserId>,
) -> Json<Vec<DirectMessage>> {
    Json(state.messaging.conversation(&caller, &other).await)
}

pub async fn conversations(
    State(state): State<AppState>,
    Principal(caller): Principal,
) -> Json<Vec<UserId>> {
    Json(state.messaging.conversation_partners(&caller).await)
}

pub async fn mark_read(
    State(state): State<AppState>,
    Principal(caller): Principal,
    Path(other): Path<UserId>,
) -> Json<serde_json::Value> {
    state.messaging.mark_conversation_read(&caller, &other).await;
    Json(serde_json::json!({ "read": true }))
}

pub async fn unread_count(
    State(state): State<AppState>,
    Principal(caller): Principal,
) -> Json<UnreadCountResponse> {
    Json(UnreadCountResponse {
        count: state.messaging.unread_count(&caller).await,
    })
}
