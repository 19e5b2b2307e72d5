use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::{delete, get, post},
};
use serde_json::Value;

use apexhms_core::{NewPrescription, Prescription, RecordId};

use crate::app::dto;
use crate::app::errors::{self, ApiResult};
use crate::app::extract::ApiJson;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(issue_prescription))
        .route("/patient/:patient_id", get(prescriptions_for_patient))
        .route("/:id", delete(remove_prescription))
}

pub async fn prescriptions_for_patient(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(patient_id): Path<String>,
) -> ApiResult<Json<Value>> {
    authz::require(&ctx, &authz::STAFF, None)?;
    let tenant = authz::tenant_filter(&ctx)?;
    let patient_id: RecordId = errors::parse_id(&patient_id)?;

    let items = services.clinic.prescriptions_for_patient(tenant, patient_id).await?;
    Ok(Json(dto::items(items)))
}

pub async fn issue_prescription(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    ApiJson(body): ApiJson<NewPrescription>,
) -> ApiResult<(StatusCode, Json<Prescription>)> {
    authz::require(&ctx, &authz::STAFF, None)?;
    let tenant = authz::tenant_filter(&ctx)?;

    let prescription = services.clinic.issue_prescription(tenant, ctx.principal_id(), body).await?;
    Ok((StatusCode::CREATED, Json(prescription)))
}

pub async fn remove_prescription(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    authz::require(&ctx, &authz::STAFF, None)?;
    let tenant = authz::tenant_filter(&ctx)?;
    let id: RecordId = errors::parse_id(&id)?;

    services.clinic.remove_prescription(tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
