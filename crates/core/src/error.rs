//! Errors raised by hospital and clinical rules.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Rule failures that do not depend on storage or transport.
///
/// Messages are written for the API client; they never carry store details.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed or missing field (email, name, date...).
    #[error("{0}")]
    Validation(String),

    /// Illegal state change, e.g. approving a rejected hospital or
    /// reopening a cancelled appointment.
    #[error("{0}")]
    InvariantViolation(String),

    #[error("invalid id: {0}")]
    InvalidId(String),

    #[error("not found")]
    NotFound,

    /// Uniqueness clash: duplicate email or license, double-booked doctor.
    #[error("{0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
