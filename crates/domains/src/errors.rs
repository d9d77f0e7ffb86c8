//! # DomainError
//!
//! Centralized error taxonomy for the board.
//! Transport adapters map each variant to a status code.

use thiserror::Error;

/// The primary error type for all board operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Missing or malformed input (e.g. empty seed, content too long)
    #[error("validation error: {0}")]
    Validation(String),

    /// Same rate-limit key seen again within the minimum interval
    #[error("too many requests: {0}")]
    RateLimited(String),

    /// Caller's role ranks below the command's required role
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// No post matched a delete target
    #[error("not found: {0}")]
    NotFound(String),

    /// Message began with the command marker but named no known command
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Infrastructure failure (e.g. database unreachable)
    #[error("storage failure: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}

/// A specialized Result type for board logic.
pub type Result<T> = std::result::Result<T, DomainError>;
