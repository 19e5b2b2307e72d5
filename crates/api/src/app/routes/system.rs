use axum::http::{StatusCode, Uri};
use axum::response::Response;

use crate::app::errors::json_error;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Fallback for paths no router matched.
pub async fn not_found(uri: Uri) -> Response {
    json_error(StatusCode::NOT_FOUND, "not_found", format!("route {} not found", uri.path()))
}
