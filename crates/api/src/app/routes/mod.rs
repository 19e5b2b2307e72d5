use axum::{
    Router,
    routing::{get, post},
};

pub mod admin;
pub mod appointments;
pub mod auth;
pub mod hospitals;
pub mod me;
pub mod patients;
pub mod prescriptions;
pub mod records;
pub mod system;

/// Registration, verification and login. No token required.
pub fn public() -> Router {
    Router::new()
        .route("/auth/register", post(auth::register_patient))
        .route("/auth/hospital/register", post(auth::register_hospital))
        .route("/auth/verify-email", get(auth::verify_email))
        .route("/auth/login", post(auth::login))
}

/// Router for every endpoint behind the auth middleware.
pub fn protected() -> Router {
    Router::new()
        .route("/auth/me", get(auth::me))
        .nest("/admin", admin::router())
        .nest("/hospitals", hospitals::router())
        .nest("/patients", patients::router())
        .nest("/medical-records", records::router())
        .nest("/prescriptions", prescriptions::router())
        .nest("/appointments", appointments::router())
        .nest("/me", me::router())
}
