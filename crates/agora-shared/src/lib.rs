//! # agora-shared
//!
//! Identity and id newtypes shared by every agora crate.  The backend treats
//! caller identity as an opaque principal issued by an external identity
//! provider; nothing in here owns an identity lifecycle.

pub mod types;

pub use types::{CallId, GroupId, MessageId, UserId};
