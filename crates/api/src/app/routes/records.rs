//! Medical records.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, post},
};
use serde_json::Value;

use apexhms_auth::{AuthError, Role};
use apexhms_core::{MedicalRecord, NewMedicalRecord, RecordId};

use crate::app::dto;
use crate::app::errors::{self, ApiResult};
use crate::app::extract::ApiJson;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(write_record))
        .route("/patient/:patient_id", get(records_for_patient))
        .route("/:id", get(get_record))
}

pub async fn records_for_patient(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(patient_id): Path<String>,
) -> ApiResult<Json<Value>> {
    authz::require(&ctx, &authz::STAFF, None)?;
    let tenant = authz::tenant_filter(&ctx)?;
    let patient_id: RecordId = errors::parse_id(&patient_id)?;

    let records = services.clinic.records_for_patient(tenant, patient_id).await?;
    Ok(Json(dto::items(records)))
}

pub async fn write_record(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    ApiJson(body): ApiJson<NewMedicalRecord>,
) -> ApiResult<(StatusCode, Json<MedicalRecord>)> {
    authz::require(&ctx, &authz::STAFF, None)?;
    let tenant = authz::tenant_filter(&ctx)?;

    let record = services.clinic.write_record(tenant, ctx.principal_id(), body).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Staff see any record of their hospital; a patient sees only their own.
/// Both get 404 for anything else.
pub async fn get_record(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<MedicalRecord>> {
    authz::require(&ctx, &authz::CARE_VIEWER, None)?;
    let tenant = authz::tenant_filter(&ctx)?;
    let id: RecordId = errors::parse_id(&id)?;

    let record = services.clinic.record(tenant, id).await?;
    if ctx.role() == Role::Patient {
        let own = services.clinic.patient_for_principal(tenant, ctx.principal_id()).await?;
        if own.id != record.patient_id {
            return Err(AuthError::ResourceNotFound.into());
        }
    }
    Ok(Json(record))
}
