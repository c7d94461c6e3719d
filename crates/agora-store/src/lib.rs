//! # agora-store
//!
//! In-memory keyed-map stores and all business rules for the agora backend:
//! the friend-request state machine with its mirrored dual-map invariant,
//! the follow graph, direct and group messaging, the call-signaling
//! rendezvous, and a small profile directory.
//!
//! Every store is a cheaply cloneable handle around mutex-guarded state.
//! A public operation acquires the lock exactly once and performs all of its
//! writes before releasing it, so no caller can ever observe a partial
//! dual-write.  That single discipline is what upholds the mirrored-status
//! and follower/following symmetry invariants without cross-store
//! transactions.

pub mod calls;
pub mod directory;
pub mod groups;
pub mod messaging;
pub mod models;
pub mod social;

mod error;

pub use calls::CallBoard;
pub use directory::ProfileDirectory;
pub use error::{Result, StoreError};
pub use groups::Groups;
pub use messaging::Messaging;
pub use models::*;
pub use social::SocialGraph;
