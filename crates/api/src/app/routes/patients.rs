use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
};
use serde_json::Value;

use apexhms_core::{NewPatient, Patient, PatientUpdate, RecordId, TenantId};

use crate::app::dto;
use crate::app::errors::{self, ApiResult};
use crate::app::extract::ApiJson;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/hospital/:hospital_id", get(list_patients).post(add_patient))
        .route("/:id", get(get_patient).put(update_patient).delete(remove_patient))
}

pub async fn list_patients(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(hospital_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let hospital_id: TenantId = errors::parse_id(&hospital_id)?;
    authz::require(&ctx, &authz::HOSPITAL_STAFF, Some(hospital_id))?;

    let patients = services.clinic.list_patients(hospital_id).await?;
    Ok(Json(dto::items(patients)))
}

pub async fn add_patient(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(hospital_id): Path<String>,
    ApiJson(body): ApiJson<NewPatient>,
) -> ApiResult<(StatusCode, Json<Patient>)> {
    let hospital_id: TenantId = errors::parse_id(&hospital_id)?;
    authz::require(&ctx, &authz::HOSPITAL_STAFF, Some(hospital_id))?;

    let patient = services.clinic.add_patient(hospital_id, body).await?;
    Ok((StatusCode::CREATED, Json(patient)))
}

pub async fn get_patient(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Patient>> {
    authz::require(&ctx, &authz::STAFF, None)?;
    let tenant = authz::tenant_filter(&ctx)?;
    let id: RecordId = errors::parse_id(&id)?;

    Ok(Json(services.clinic.patient(tenant, id).await?))
}

pub async fn update_patient(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<PatientUpdate>,
) -> ApiResult<Json<Patient>> {
    authz::require(&ctx, &authz::STAFF, None)?;
    let tenant = authz::tenant_filter(&ctx)?;
    let id: RecordId = errors::parse_id(&id)?;

    Ok(Json(services.clinic.update_patient(tenant, id, body).await?))
}

pub async fn remove_patient(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    authz::require(&ctx, &authz::STAFF, None)?;
    let tenant = authz::tenant_filter(&ctx)?;
    let id: RecordId = errors::parse_id(&id)?;

    services.clinic.remove_patient(tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
