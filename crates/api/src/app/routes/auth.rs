use std::sync::Arc;

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
};
use serde_json::{Value, json};

use apexhms_auth::PrincipalView;
use apexhms_infra::accounts::{HospitalRegistration, LoginOutcome, PatientRegistration};

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::extract::{ApiJson, ApiQuery};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub async fn register_patient(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<PatientRegistration>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let registered = services.accounts.register_patient(body).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "registration received; check your email to verify the account",
            "account": registered.account,
            "patient": registered.patient,
        })),
    ))
}

pub async fn register_hospital(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<HospitalRegistration>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let registered = services.accounts.register_hospital(body).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "hospital registered; verify the administrator email and await platform approval",
            "account": registered.account,
            "hospital": registered.hospital,
        })),
    ))
}

pub async fn verify_email(
    Extension(services): Extension<Arc<AppServices>>,
    ApiQuery(query): ApiQuery<dto::VerifyQuery>,
) -> ApiResult<Json<Value>> {
    let account = services.accounts.verify_email(&query.token).await?;
    Ok(Json(json!({
        "message": "email verified",
        "account": account,
    })))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<dto::LoginRequest>,
) -> ApiResult<Json<LoginOutcome>> {
    let outcome = services.accounts.login(&body.email, &body.password).await?;
    Ok(Json(outcome))
}

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
) -> ApiResult<Json<Value>> {
    let account = services.accounts.account(ctx.principal_id()).await?;
    Ok(Json(json!({
        "principal": PrincipalView::from(ctx.principal()),
        "account": account,
    })))
}
