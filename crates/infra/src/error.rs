use thiserror::Error;

use apexhms_auth::{AuthError, PasswordError, PrincipalError};
use apexhms_core::DomainError;

use crate::store::StoreError;

/// Outcome of an account or clinic service call.
///
/// `Internal` carries a message for the server log only; the HTTP layer
/// replaces it with a generic body.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AccountError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(msg) => AccountError::Conflict(msg),
            other => AccountError::Internal(other.to_string()),
        }
    }
}

impl From<DomainError> for AccountError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => AccountError::Validation(msg),
            DomainError::InvariantViolation(msg) | DomainError::Conflict(msg) => AccountError::Conflict(msg),
            DomainError::NotFound => AccountError::Auth(AuthError::ResourceNotFound),
        }
    }
}

impl From<PasswordError> for AccountError {
    fn from(e: PasswordError) -> Self {
        match e {
            PasswordError::TooShort | PasswordError::TooLong => AccountError::Validation(e.to_string()),
            PasswordError::InvalidCost(_) | PasswordError::Hashing(_) => AccountError::Internal(e.to_string()),
        }
    }
}

impl From<PrincipalError> for AccountError {
    fn from(e: PrincipalError) -> Self {
        AccountError::Internal(e.to_string())
    }
}

pub type AccountResult<T> = Result<T, AccountError>;
