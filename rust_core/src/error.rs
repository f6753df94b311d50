//! Typed failure taxonomy for the resolution engine and stores.
//!
//! Caller errors (`InvalidPair`, `NotFound`, `Duplicate`) are raised before
//! any partial write; `Constraint` and `Storage` come from the storage layer
//! and are always surfaced, never swallowed.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatchError {
    /// The same item id was supplied on both sides of a resolution.
    #[error("cannot match item '{0}' against itself")]
    InvalidPair(String),

    /// One or both requested ids are absent from the registry,
    /// or a requested ledger row does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Registration collided with an already-registered item id.
    #[error("item '{0}' is already registered")]
    Duplicate(String),

    /// A storage-level uniqueness constraint fired (e.g. duplicate title).
    /// Title uniqueness is enforced by the schema, not pre-checked.
    #[error("storage constraint violated: {0}")]
    Constraint(String),

    /// Connectivity or transaction failure talking to the store.
    #[error("storage unavailable: {0}")]
    Storage(#[from] sqlx::Error),
}

impl MatchError {
    /// True for errors the caller caused (bad input), as opposed to
    /// infrastructure failures. Boundaries map these to 4xx-style outcomes.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            MatchError::InvalidPair(_)
                | MatchError::NotFound(_)
                | MatchError::Duplicate(_)
                | MatchError::Constraint(_)
        )
    }
}
