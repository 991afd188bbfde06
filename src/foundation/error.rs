/// Convenience result type used across the engine.
pub type KitResult<T> = Result<T, KitError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum KitError {
    /// The request cannot start: no composition, nothing selected.
    #[error("{0}")]
    Precondition(String),

    /// The request would produce overlapping or duplicate animation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A host object the engine relies on is missing or a host call failed.
    #[error("host error: {0}")]
    Host(String),

    /// Malformed caller parameters or settings.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KitError {
    /// Build a [`KitError::Precondition`] value.
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Build a [`KitError::Conflict`] value.
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Build a [`KitError::Host`] value.
    pub fn host(msg: impl Into<String>) -> Self {
        Self::Host(msg.into())
    }

    /// Build a [`KitError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// True for errors that were detected before any mutation of this call.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
