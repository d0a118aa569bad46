//! Errors raised by domain rules.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Rule violations detectable without touching storage.
///
/// Uniqueness and existence are decided by the store and reported there.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Input that breaks a rule (bad email, too many tags, wrong day, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A path or token identifier that does not parse.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The caller acts on something owned by another user.
    #[error("forbidden")]
    Forbidden,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
