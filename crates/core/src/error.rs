//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Deterministic failures only. Storage problems belong to the store's own error
/// type, which converts from this one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Stale version / optimistic concurrency.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

/// Identifier construction failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("Input string cannot be null or empty")]
    EmptySeed,

    #[error("identifier cannot be empty")]
    Empty,
}
