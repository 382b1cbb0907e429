//! # AppError
//!
//! Centralized error handling for the crownvote crates.
//! Ballot outcomes that a voter is expected to see (already voted, voting
//! closed) are variants here rather than generic failures.

use thiserror::Error;

/// The primary error type for all cv-core ports and services.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Resource not found (e.g., Candidate, Admin)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., missing kingId, password too short)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Security/Auth failure (e.g., bad token, invalid admin credentials)
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Resource state forbids the operation (e.g., deleting a candidate that has ballots)
    #[error("conflict: {0}")]
    Conflict(String),

    /// A ballot already exists under one of the voter's identity keys.
    #[error("already voted")]
    AlreadyVoted,

    /// The voting gate was closed when the ballot reached commit.
    #[error("voting is closed")]
    VotingClosed,

    /// The referenced candidate is missing or sits in the wrong category.
    #[error("invalid candidate: {0}")]
    InvalidCandidate(String),

    /// Results were requested publicly before being announced.
    #[error("results have not been announced")]
    ResultsHidden,

    /// Infrastructure failure (e.g., DB down, disk full). Retryable.
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the caller may retry the whole operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Internal(_))
    }
}

/// A specialized Result type for crownvote logic.
pub type Result<T> = std::result::Result<T, AppError>;
