//! Platform administration: hospital approval and platform statistics.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    routing::{get, put},
};
use serde_json::{Value, json};

use apexhms_core::{Hospital, HospitalStatus, TenantId};

use crate::app::errors::{self, ApiResult};
use crate::app::extract::ApiQuery;
use crate::app::services::AppServices;
use crate::app::dto;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/hospitals", get(list_hospitals))
        .route("/hospitals/:id/approve", put(approve_hospital))
        .route("/hospitals/:id/reject", put(reject_hospital))
        .route("/hospitals/:id/suspend", put(suspend_hospital))
        .route("/hospitals/:id/reactivate", put(reactivate_hospital))
        .route("/stats", get(stats))
}

pub async fn list_hospitals(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    ApiQuery(query): ApiQuery<dto::HospitalListQuery>,
) -> ApiResult<Json<Value>> {
    authz::require(&ctx, &authz::SUPER_ADMIN, None)?;

    let status = query.status.as_deref().map(HospitalStatus::parse).transpose()?;
    let hospitals = services.accounts.list_hospitals(status).await?;

    let mut listed = Vec::with_capacity(hospitals.len());
    for hospital in &hospitals {
        let patients = services.clinic.patient_count(hospital.id).await?;
        let staff = services.accounts.list_staff(hospital.id).await?.len();
        listed.push(dto::hospital_to_json(hospital, patients, staff));
    }
    Ok(Json(dto::items(listed)))
}

pub async fn approve_hospital(
    services: Extension<Arc<AppServices>>,
    ctx: Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Hospital>> {
    change_status(services, ctx, &id, HospitalStatus::Approved).await
}

pub async fn reject_hospital(
    services: Extension<Arc<AppServices>>,
    ctx: Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Hospital>> {
    change_status(services, ctx, &id, HospitalStatus::Rejected).await
}

pub async fn suspend_hospital(
    services: Extension<Arc<AppServices>>,
    ctx: Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Hospital>> {
    change_status(services, ctx, &id, HospitalStatus::Suspended).await
}

pub async fn reactivate_hospital(
    services: Extension<Arc<AppServices>>,
    ctx: Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Hospital>> {
    change_status(services, ctx, &id, HospitalStatus::Approved).await
}

async fn change_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    raw_id: &str,
    target: HospitalStatus,
) -> ApiResult<Json<Hospital>> {
    authz::require(&ctx, &authz::SUPER_ADMIN, None)?;

    let id: TenantId = errors::parse_id(raw_id)?;
    let hospital = services.accounts.set_hospital_status(id, target).await?;
    Ok(Json(hospital))
}

pub async fn stats(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
) -> ApiResult<Json<Value>> {
    authz::require(&ctx, &authz::SUPER_ADMIN, None)?;

    let accounts = &services.accounts;
    let counts = services.clinic.platform_counts().await?;
    Ok(Json(json!({
        "total_hospitals": accounts.count_hospitals(None).await?,
        "pending_hospitals": accounts.count_hospitals(Some(HospitalStatus::Pending)).await?,
        "approved_hospitals": accounts.count_hospitals(Some(HospitalStatus::Approved)).await?,
        "suspended_hospitals": accounts.count_hospitals(Some(HospitalStatus::Suspended)).await?,
        "total_patients": counts.total_patients,
        "total_appointments": counts.total_appointments,
    })))
}
