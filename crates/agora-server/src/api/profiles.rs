//! Profile-directory handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use agora_shared::UserId;
use agora_store::Profile;

use crate::api::AppState;
use crate::auth::Principal;

#[derive(Deserialize)]
pub struct UpsertProfileBody {
    pub display_name: String,
    pub avatar_ref: Option<String>,
}

pub async fn upsert_profile(
    State(state): State<AppState>,
    Principal(caller): Principal,
    Json(body): Json<UpsertProfileBody>,
) -> Json<serde_json::Value> {
    state
        .directory
        .upsert(&caller, body.display_name, body.avatar_ref)
        .await;
    Json(serde_json::json!({ "updated": true }))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Principal(_caller): Principal,
    Path(user): Path<UserId>,
) -> Json<Option<Profile>> {
    Json(state.directory.get(&user).await)
}
