//! HTTP application wiring (axum router + service wiring).
//!
//! - `services.rs`: store, mailer and service construction
//! - `routes/`: HTTP routes + handlers, one file per area
//! - `dto.rs`: request DTOs and JSON helpers
//! - `errors.rs`: error to response mapping
//! - `extract.rs`: body and query extractors with JSON rejections

use std::sync::Arc;

use axum::http::{HeaderValue, Method, header};
use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use apexhms_auth::JwtValidator;

use crate::middleware;

use self::services::AppServices;

pub mod dto;
pub mod errors;
pub mod extract;
pub mod routes;
pub mod services;

/// Build the full HTTP router (used by `main.rs` and the black-box tests).
pub fn build_app(services: Arc<AppServices>, jwt: Arc<dyn JwtValidator>) -> Router {
    let auth_state = middleware::AuthState { jwt };

    // Everything under here needs a verified bearer token.
    let protected = routes::protected().route_layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    let cors = cors_for(&services.public_url);

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::public())
        .merge(protected)
        .fallback(routes::system::not_found)
        .layer(Extension(services))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
}

/// Only the frontend origin may call the API from a browser.
fn cors_for(public_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    match HeaderValue::from_str(public_url.trim_end_matches('/')) {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            tracing::warn!(public_url, error = %e, "public url is not a valid origin; cross-origin calls are refused");
            layer
        }
    }
}
