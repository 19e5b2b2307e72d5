use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use apexhms_auth::AuthError;
use apexhms_core::DomainError;
use apexhms_infra::AccountError;

/// Every failure a handler can return, already reduced to what the client
/// may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    Auth(AuthError),
    Validation(String),
    Conflict(String),
    /// Details were logged where the error was converted.
    Internal,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError::Auth(e)
    }
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::Auth(e) => ApiError::Auth(e),
            AccountError::Validation(msg) => ApiError::Validation(msg),
            AccountError::Conflict(msg) => ApiError::Conflict(msg),
            AccountError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                ApiError::Internal
            }
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        AccountError::from(e).into()
    }
}

fn auth_status(e: AuthError) -> StatusCode {
    match e {
        AuthError::AuthenticationRequired | AuthError::AuthenticationFailed | AuthError::InvalidCredentials => {
            StatusCode::UNAUTHORIZED
        }
        AuthError::PermissionDenied
        | AuthError::AccountNotVerified
        | AuthError::AccountSuspended
        | AuthError::TenantPending
        | AuthError::TenantSuspended
        | AuthError::TenantRejected => StatusCode::FORBIDDEN,
        AuthError::ResourceNotFound => StatusCode::NOT_FOUND,
        AuthError::TokenAlreadyUsedOrInvalid => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Auth(e) => json_error(auth_status(e), e.code(), e.to_string()),
            ApiError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
            ApiError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
            ApiError::Internal => json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "something went wrong, please try again",
            ),
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Parse an id taken from the path.
pub fn parse_id<T>(raw: &str) -> ApiResult<T>
where
    T: std::str::FromStr<Err = DomainError>,
{
    raw.parse::<T>().map_err(ApiError::from)
}
