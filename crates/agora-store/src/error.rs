use thiserror::Error;

/// Errors produced by the store layer.
///
/// Every failure is immediate and synchronous; a failed operation leaves
/// state untouched.  Retry and user-facing messaging are the caller's
/// problem.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// The caller targeted themselves where that is meaningless
    /// (self-friend, self-follow, self-call).
    #[error("operation may not target the calling identity")]
    SelfReference,

    /// A required entity is absent.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The caller is not a participant, member, or creator of the entity.
    #[error("not authorized: {0}")]
    Unauthorized(&'static str),

    /// The operation is not valid in the entity's current state.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// The operation would clobber an existing record.
    #[error("conflict: {0}")]
    Conflict(&'static str),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
