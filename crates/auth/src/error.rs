use thiserror::Error;

/// Client-facing authentication/authorization outcomes.
///
/// Each variant has a stable `code()` and a short reason that is safe to
/// return to any caller. Internal causes (expired vs forged token, store
/// failures) are logged where they happen and never carried in here.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("authentication required")]
    AuthenticationRequired,

    #[error("invalid or expired token")]
    AuthenticationFailed,

    #[error("you do not have access to this resource")]
    PermissionDenied,

    /// Also returned for records that belong to another hospital.
    #[error("resource not found")]
    ResourceNotFound,

    /// Wrong password or unknown account; never says which.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("please verify your email before logging in")]
    AccountNotVerified,

    #[error("this account has been suspended")]
    AccountSuspended,

    #[error("your hospital registration is pending approval")]
    TenantPending,

    #[error("your hospital account has been suspended")]
    TenantSuspended,

    #[error("your hospital registration was rejected")]
    TenantRejected,

    #[error("verification link is invalid or has already been used")]
    TokenAlreadyUsedOrInvalid,
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::AuthenticationRequired => "authentication_required",
            AuthError::AuthenticationFailed => "authentication_failed",
            AuthError::PermissionDenied => "permission_denied",
            AuthError::ResourceNotFound => "not_found",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::AccountNotVerified => "account_not_verified",
            AuthError::AccountSuspended => "account_suspended",
            AuthError::TenantPending => "tenant_pending",
            AuthError::TenantSuspended => "tenant_suspended",
            AuthError::TenantRejected => "tenant_rejected",
            AuthError::TokenAlreadyUsedOrInvalid => "token_invalid",
        }
    }
}
