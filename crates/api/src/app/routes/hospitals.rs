//! Hospital profile and staff management, for members of that hospital.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, put},
};
use serde_json::Value;

use apexhms_auth::{AccountStatus, AccountView};
use apexhms_core::{HospitalProfileUpdate, PrincipalId, TenantId};
use apexhms_infra::accounts::StaffProvisioning;

use crate::app::dto;
use crate::app::errors::{self, ApiResult};
use crate::app::extract::ApiJson;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/:hospital_id", get(get_hospital).put(update_hospital))
        .route("/:hospital_id/staff", get(list_staff).post(provision_staff))
        .route("/:hospital_id/staff/:id/suspend", put(suspend_staff))
        .route("/:hospital_id/staff/:id/activate", put(activate_staff))
}

pub async fn get_hospital(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(hospital_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let hospital_id: TenantId = errors::parse_id(&hospital_id)?;
    authz::require(&ctx, &authz::HOSPITAL_MEMBER, Some(hospital_id))?;

    let hospital = services.accounts.hospital(hospital_id).await?;
    let patients = services.clinic.patient_count(hospital_id).await?;
    let staff = services.accounts.list_staff(hospital_id).await?.len();
    Ok(Json(dto::hospital_to_json(&hospital, patients, staff)))
}

pub async fn update_hospital(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(hospital_id): Path<String>,
    ApiJson(body): ApiJson<HospitalProfileUpdate>,
) -> ApiResult<Json<Value>> {
    let hospital_id: TenantId = errors::parse_id(&hospital_id)?;
    authz::require(&ctx, &authz::HOSPITAL_ADMIN, Some(hospital_id))?;

    let hospital = services.accounts.update_hospital_profile(hospital_id, &body).await?;
    let patients = services.clinic.patient_count(hospital_id).await?;
    let staff = services.accounts.list_staff(hospital_id).await?.len();
    Ok(Json(dto::hospital_to_json(&hospital, patients, staff)))
}

pub async fn list_staff(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(hospital_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let hospital_id: TenantId = errors::parse_id(&hospital_id)?;
    authz::require(&ctx, &authz::HOSPITAL_ADMIN, Some(hospital_id))?;

    let staff = services.accounts.list_staff(hospital_id).await?;
    Ok(Json(dto::items(staff)))
}

pub async fn provision_staff(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(hospital_id): Path<String>,
    ApiJson(body): ApiJson<StaffProvisioning>,
) -> ApiResult<(StatusCode, Json<AccountView>)> {
    let hospital_id: TenantId = errors::parse_id(&hospital_id)?;
    authz::require(&ctx, &authz::HOSPITAL_ADMIN, Some(hospital_id))?;

    let account = services.accounts.provision_staff(hospital_id, body).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn suspend_staff(
    services: Extension<Arc<AppServices>>,
    ctx: Extension<PrincipalContext>,
    Path((hospital_id, id)): Path<(String, String)>,
) -> ApiResult<Json<AccountView>> {
    change_staff_status(services, ctx, &hospital_id, &id, AccountStatus::Suspended).await
}

pub async fn activate_staff(
    services: Extension<Arc<AppServices>>,
    ctx: Extension<PrincipalContext>,
    Path((hospital_id, id)): Path<(String, String)>,
) -> ApiResult<Json<AccountView>> {
    change_staff_status(services, ctx, &hospital_id, &id, AccountStatus::Active).await
}

async fn change_staff_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    hospital_id: &str,
    id: &str,
    target: AccountStatus,
) -> ApiResult<Json<AccountView>> {
    let hospital_id: TenantId = errors::parse_id(hospital_id)?;
    authz::require(&ctx, &authz::HOSPITAL_ADMIN, Some(hospital_id))?;

    // The account lookup is filtered by the caller's tenant, not the path.
    let tenant = authz::tenant_filter(&ctx)?;
    let id: PrincipalId = errors::parse_id(id)?;
    let account = services.accounts.set_account_status(tenant, id, target).await?;
    Ok(Json(account))
}
