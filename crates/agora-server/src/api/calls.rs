//! Call-signaling handlers.
//!
//! The offer and answer reads return `null` while the counterpart has not
//! written yet; both sides poll them until the call is established, then
//! tear the session down with the DELETE route.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use agora_shared::{CallId, UserId};
use agora_store::{CallAnswer, CallOffer};

use crate::api::AppState;
use crate::auth::Principal;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct StoreOfferBody {
    pub callee: UserId,
    pub sdp: String,
}

#[derive(Deserialize)]
pub struct StoreAnswerBody {
    pub sdp: String,
}

#[derive(Deserialize)]
pub struct AddCandidateBody {
    pub candidate: String,
}

pub async fn store_offer(
    State(state): State<AppState>,
    Principal(caller): Principal,
    Path(call_id): Path<CallId>,
    Json(body): Json<StoreOfferBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .calls
        .store_offer(&caller, &call_id, &body.callee, body.sdp)
        .await?;
    Ok(Json(serde_json::json!({ "stored": true })))
}

pub async fn get_offer(
    State(state): State<AppState>,
    Principal(caller): Principal,
    Path(call_id): Path<CallId>,
) -> Result<Json<Option<CallOffer>>, ApiError> {
    Ok(Json(state.calls.offer(&caller, &call_id).await?))
}

pub async fn store_answer(
    State(state): State<AppState>,
    Principal(caller): Principal,
    Path(call_id): Path<CallId>,
    Json(body): Json<StoreAnswerBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.calls.store_answer(&caller, &call_id, body.sdp).await?;
    Ok(Json(serde_json::json!({ "stored": true })))
}

pub async fn get_answer(
    State(state): State<AppState>,
    Principal(caller): Principal,
    Path(call_id): Path<CallId>,
) -> Result<Json<Option<CallAnswer>>, ApiError> {
    Ok(Json(state.calls.answer(&caller, &call_id).await?))
}

pub async fn add_candidate(
    State(state): State<AppState>,
    Principal(caller): Principal,
    Path(call_id): Path<CallId>,
    Json(body): Json<AddCandidateBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .calls
        .add_candidate(&caller, &call_id, body.candidate)
        .await?;
    Ok(Json(serde_json::json!({ "added": true })))
}

pub async fn candidates_from(
    State(state): State<AppState>,
    Principal(caller): Principal,
    Path((call_id, contributor)): Path<(CallId, UserId)>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(
        state
            .calls
            .candidates_from(&caller, &call_id, &contributor)
            .await?,
    ))
}

pub async fn end_call(
    State(state): State<AppState>,
    Principal(caller): Principal,
    Path(call_id): Path<CallId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.calls.end(&caller, &call_id).await?;
    Ok(Json(serde_json::json!({ "ended": true })))
}
