//! Caller identity extraction.
//!
//! Authentication itself is out of scope: a trusted fronting proxy verifies
//! the caller and injects their principal into the configured identity
//! header.  This extractor turns that header into a [`UserId`] and rejects
//! requests that arrive without one.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use agora_shared::UserId;

use crate::api::AppState;
use crate::error::ApiError;

/// The authenticated caller, available to any handler as an extractor.
pub struct Principal(pub UserId);

#[async_trait]
impl FromRequestParts<AppState> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(state.config.identity_header.as_str())
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        match value {
            Some(principal) => Ok(Principal(UserId::new(principal))),
            None => Err(ApiError::MissingIdentity),
        }
    }
}
