use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::{delete, get, patch},
};
use serde_json::Value;

use apexhms_core::{Appointment, NewAppointment, RecordId, TenantId};

use crate::app::dto;
use crate::app::errors::{self, ApiResult};
use crate::app::extract::ApiJson;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/hospital/:hospital_id", get(list_appointments).post(book_appointment))
        .route("/:id/status", patch(set_status))
        .route("/:id", delete(cancel_appointment))
}

pub async fn list_appointments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(hospital_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let hospital_id: TenantId = errors::parse_id(&hospital_id)?;
    authz::require(&ctx, &authz::HOSPITAL_STAFF, Some(hospital_id))?;

    let items = services.clinic.list_appointments(hospital_id).await?;
    Ok(Json(dto::items(items)))
}

pub async fn book_appointment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(hospital_id): Path<String>,
    ApiJson(body): ApiJson<NewAppointment>,
) -> ApiResult<(StatusCode, Json<Appointment>)> {
    let hospital_id: TenantId = errors::parse_id(&hospital_id)?;
    authz::require(&ctx, &authz::HOSPITAL_STAFF, Some(hospital_id))?;

    let appointment = services.clinic.book_appointment(hospital_id, body).await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

pub async fn set_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::AppointmentStatusRequest>,
) -> ApiResult<Json<Appointment>> {
    authz::require(&ctx, &authz::STAFF, None)?;
    let tenant = authz::tenant_filter(&ctx)?;
    let id: RecordId = errors::parse_id(&id)?;

    Ok(Json(services.clinic.set_appointment_status(tenant, id, body.status).await?))
}

/// Cancels rather than deletes; the patient is emailed.
pub async fn cancel_appointment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Appointment>> {
    authz::require(&ctx, &authz::STAFF, None)?;
    let tenant = authz::tenant_filter(&ctx)?;
    let id: RecordId = errors::parse_id(&id)?;

    Ok(Json(services.clinic.cancel_appointment(tenant, id).await?))
}
