//! Request bodies, query strings and JSON shaping that the services do not
//! already cover.

use serde::Deserialize;
use serde_json::{Value, json};

use apexhms_core::{AppointmentStatus, Hospital};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct HospitalListQuery {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AppointmentStatusRequest {
    pub status: AppointmentStatus,
}

/// Hospital profile plus the head counts shown on the hospital dashboard.
pub fn hospital_to_json(hospital: &Hospital, patient_count: usize, staff_count: usize) -> Value {
    json!({
        "id": hospital.id.to_string(),
        "name": hospital.name,
        "hospital_type": hospital.hospital_type.as_str(),
        "address": hospital.address,
        "phone": hospital.phone,
        "email": hospital.email,
        "license_number": hospital.license_number,
        "admin_name": hospital.admin_name,
        "status": hospital.status.as_str(),
        "created_at": hospital.created_at,
        "approved_at": hospital.approved_at,
        "patient_count": patient_count,
        "staff_count": staff_count,
    })
}

pub fn items<T: serde::Serialize>(items: Vec<T>) -> Value {
    json!({ "items": items })
}
