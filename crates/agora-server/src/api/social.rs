//! Friend-request and follow-graph handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use agora_shared::UserId;
use agora_store::{FriendRequestStatus, PendingRequest};

use crate::api::AppState;
use crate::auth::Principal;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct SendFriendRequestBody {
    pub to: UserId,
}

#[derive(Deserialize)]
pub struct RespondBody {
    pub from: UserId,
    pub accept: bool,
}

#[derive(Serialize)]
pub struct RespondResponse {
    pub status: FriendRequestStatus,
}

#[derive(Deserialize)]
pub struct FollowBody {
    pub user: UserId,
}

pub async fn send_friend_request(
    State(state): State<AppState>,
    Principal(caller): Principal,
    Json(body): Json<SendFriendRequestBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.social.send_friend_request(&caller, &body.to).await?;
    Ok(Json(serde_json::json!({ "sent": true })))
}

pub async fn respond_to_request(
    State(state): State<AppState>,
    Principal(caller): Principal,
    Json(body): Json<RespondBody>,
) -> Result<Json<RespondResponse>, ApiError> {
    let status = state
        .social
        .respond_to_friend_request(&caller, &body.from, body.accept)
        .await?;
    Ok(Json(RespondResponse { status }))
}

pub async fn pending_requests(
    State(state): State<AppState>,
    Principal(caller): Principal,
) -> Json<Vec<PendingRequest>> {
    Json(state.social.pending_requests(&caller).await)
}

pub async fn friends_of(
    State(state): State<AppState>,
    Principal(_caller): Principal,
    Path(user): Path<UserId>,
) -> Json<Vec<UserId>> {
    Json(state.social.friends_of(&user).await)
}

pub async fn request_status(
    State(state): State<AppState>,
    Principal(caller): Principal,
    Path(user): Path<UserId>,
) -> Json<Option<FriendRequestStatus>> {
    Json(state.social.request_status(&caller, &user).await)
}

pub async fn follow(
    State(state): State<AppState>,
    Principal(caller): Principal,
    Json(body): Json<FollowBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.social.follow(&caller, &body.user).await?;
    Ok(Json(serde_json::json!({ "following": true })))
}

pub async fn unfollow(
    State(state): State<AppState>,
    Principal(caller): Principal,
    Path(user): Path<UserId>,
) -> Json<serde_json::Value> {
    state.social.unfollow(&caller, &user).await;
    Json(serde_json::json!({ "following": false }))
}

pub async fn followers_of(
    State(state): State<AppState>,
    Principal(_caller): Principal,
    Path(user): Path<UserId>,
) -> Json<Vec<UserId>> {
    Json(state.social.followers_of(&user).await)
}

pub async fn following_of(
    State(state): State<AppState>,
    Principal(_caller): Principal,
    Path(user): Path<UserId>,
) -> Json<Vec<UserId>> {
    Json(state.social.following_of(&user).await)
}
