//! The signed-in patient's own chart.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    routing::get,
};
use serde_json::Value;

use apexhms_core::{Patient, TenantId};

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/records", get(my_records))
        .route("/prescriptions", get(my_prescriptions))
        .route("/appointments", get(my_appointments))
}

async fn own_patient(services: &AppServices, ctx: &PrincipalContext) -> ApiResult<(TenantId, Patient)> {
    authz::require(ctx, &authz::PATIENT, None)?;
    let tenant = authz::tenant_filter(ctx)?;
    let patient = services.clinic.patient_for_principal(tenant, ctx.principal_id()).await?;
    Ok((tenant, patient))
}

pub async fn my_records(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
) -> ApiResult<Json<Value>> {
    let (tenant, patient) = own_patient(&services, &ctx).await?;
    let items = services.clinic.records_for_patient(tenant, patient.id).await?;
    Ok(Json(dto::items(items)))
}

pub async fn my_prescriptions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
) -> ApiResult<Json<Value>> {
    let (tenant, patient) = own_patient(&services, &ctx).await?;
    let items = services.clinic.prescriptions_for_patient(tenant, patient.id).await?;
    Ok(Json(dto::items(items)))
}

pub async fn my_appointments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
) -> ApiResult<Json<Value>> {
    let (tenant, patient) = own_patient(&services, &ctx).await?;
    let items = services.clinic.appointments_for_patient(tenant, patient.id).await?;
    Ok(Json(dto::items(items)))
}
