//! Admin endpoints, gated by a bearer token.
//!
//! The group-delete route is the administrative override for moderation:
//! it bypasses the creator-only rule the public route enforces.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use tracing::info;

use agora_shared::GroupId;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct AdminStatusResponse {
    pub name: String,
    pub version: &'static str,
    pub identity_header: String,
}

fn verify_admin_token(headers: &HeaderMap, config: &ServerConfig) -> Result<(), ApiError> {
    let Some(ref expected) = config.admin_token else {
        return Err(ApiError::Forbidden(
            "Admin API is disabled (no ADMIN_TOKEN configured)".into(),
        ));
    };

    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or(auth);

    // Constant-time comparison to prevent timing attacks on admin token.
    use subtle::ConstantTimeEq;
    let token_bytes = token.as_bytes();
    let expected_bytes = expected.as_bytes();
    if token_bytes.len() != expected_bytes.len()
        || token_bytes.ct_eq(expected_bytes).unwrap_u8() != 1
    {
        return Err(ApiError::Forbidden("Invalid admin token".into()));
    }

    Ok(())
}

pub async fn status(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<AdminStatusResponse>, ApiError> {
    verify_admin_token(&headers, &state.config)?;

    Ok(Json(AdminStatusResponse {
        name: state.config.instance_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        identity_header: state.config.identity_header.clone(),
    }))
}

pub async fn delete_group(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path(id): Path<GroupId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    verify_admin_token(&headers, &state.config)?;

    state.groups.force_delete(id).await?;

    info!(group = %id, "Admin deleted group");
    Ok(Json(serde_json::json!({ "deleted": true })))
}
