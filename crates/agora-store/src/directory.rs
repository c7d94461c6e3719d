//! Profile directory shim.
//!
//! In the full system profiles live with an external collaborator; the core
//! only needs identity → display profile so message threads and call
//! targets can be rendered with names.  Absence is a normal case, never an
//! error.

use std::collections::HashMap;
use std::sync::Arc;

use agora_shared::UserId;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::models::Profile;

/// Cloneable handle to the profile directory.
#[derive(Clone, Default)]
pub struct ProfileDirectory {
    inner: Arc<Mutex<HashMap<UserId, Profile>>>,
}

impl ProfileDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace the caller's profile.
    pub async fn upsert(&self, caller: &UserId, display_name: String, avatar_ref: Option<String>) {
        let mut profiles = self.inner.lock().await;
        profiles.insert(
            caller.clone(),
            Profile {
                user: caller.clone(),
                display_name,
                avatar_ref,
                updated_at: Utc::now(),
            },
        );
        debug!(user = %caller.short(), "profile upserted");
    }

    pub async fn get(&self, user: &UserId) -> Option<Profile> {
        let profiles = self.inner.lock().await;
        profiles.get(user).cloned()
    }
}
