//! Group membership and group-messaging handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use agora_shared::{GroupId, MessageId, UserId};
use agora_store::{Group, GroupMessage};

use crate::api::AppState;
use crate::auth::Principal;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreateGroupBody {
    pub name: String,
}

#[derive(Serialize)]
pub struct CreateGroupResponse {
    pub id: GroupId,
}

#[derive(Deserialize)]
pub struct AddMemberBody {
    pub member: UserId,
}

#[derive(Deserialize)]
pub struct SendGroupMessageBody {
    pub content: String,
}

#[derive(Serialize)]
pub struct SendGroupMessageResponse {
    pub id: MessageId,
}

pub async fn create_group(
    State(state): State<AppState>,
    Principal(caller): Principal,
    Json(body): Json<CreateGroupBody>,
) -> Json<CreateGroupResponse> {
    let id = state.groups.create(&caller, body.name).await;
    Json(CreateGroupResponse { id })
}

pub async fn my_groups(
    State(state): State<AppState>,
    Principal(caller): Principal,
) -> Json<Vec<Group>> {
    Json(state.groups.groups_of(&caller).await)
}

pub async fn get_group(
    State(state): State<AppState>,
    Principal(caller): Principal,
    Path(id): Path<GroupId>,
) -> Result<Json<Group>, ApiError> {
    Ok(Json(state.groups.get(&caller, id).await?))
}

pub async fn delete_group(
    State(state): State<AppState>,
    Principal(caller): Principal,
    Path(id): Path<GroupId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.groups.delete(&caller, id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

pub async fn add_member(
    State(state): State<AppState>,
    Principal(caller): Principal,
    Path(id): Path<GroupId>,
    Json(body): Json<AddMemberBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.groups.add_member(&caller, id, &body.member).await?;
    Ok(Json(serde_json::json!({ "added": true })))
}

pub async fn remove_member(
    State(state): State<AppState>,
    Principal(caller): Principal,
    Path((id, member)): Path<(GroupId, UserId)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.groups.remove_member(&caller, id, &member).await?;
    Ok(Json(serde_json::json!({ "removed": true })))
}

pub async fn send_group_message(
    State(state): State<AppState>,
    Principal(caller): Principal,
    Path(id): Path<GroupId>,
    Json(body): Json<SendGroupMessageBody>,
) -> Result<Json<SendGroupMessageResponse>, ApiError> {
    let message_id = state.groups.send_message(&caller, id, body.content).await?;
    Ok(Json(SendGroupMessageResponse { id: message_id }))
}

pub async fn group_messages(
    State(state): State<AppState>,
    Principal(caller): Principal,
    Path(id): Path<GroupId>,
) -> Result<Json<Vec<GroupMessage>>, ApiError> {
    Ok(Json(state.groups.messages(&caller, id).await?))
}
