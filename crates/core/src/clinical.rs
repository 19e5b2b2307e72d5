//! Tenant-owned clinical records.
//!
//! Every record carries the hospital that owns it. The routes that serve
//! these records never look one up without that hospital id in the key.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, TenantOwned};
use crate::error::DomainError;
use crate::id::{PrincipalId, RecordId, TenantId};
use crate::value_object::Email;

macro_rules! tenant_owned_record {
    ($t:ty) => {
        impl Entity for $t {
            type Id = RecordId;

            fn id(&self) -> &Self::Id {
                &self.id
            }
        }

        impl TenantOwned for $t {
            fn owner(&self) -> TenantId {
                self.hospital_id
            }
        }
    };
}

fn required(label: &str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{label} is required")));
    }
    Ok(trimmed.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Patient
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: RecordId,
    pub hospital_id: TenantId,
    /// Login identity, when the patient has an account.
    pub principal_id: Option<PrincipalId>,
    pub patient_number: String,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub phone: String,
    pub email: Option<Email>,
    pub blood_group: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

/// Fields accepted when a patient is admitted or self-registers.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPatient {
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<Email>,
    #[serde(default)]
    pub blood_group: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Editable patient fields; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<Email>,
    pub blood_group: Option<String>,
    pub address: Option<String>,
}

impl Patient {
    /// `P` followed by a zero-padded, per-hospital sequence number.
    pub fn patient_number(sequence: usize) -> String {
        format!("P{sequence:06}")
    }

    pub fn admit(
        hospital_id: TenantId,
        sequence: usize,
        fields: NewPatient,
        principal_id: Option<PrincipalId>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if fields.date_of_birth > now.date_naive() {
            return Err(DomainError::validation("a valid date of birth is required"));
        }

        Ok(Self {
            id: RecordId::new(),
            hospital_id,
            principal_id,
            patient_number: Self::patient_number(sequence),
            full_name: required("full name", &fields.full_name)?,
            date_of_birth: fields.date_of_birth,
            gender: fields.gender.unwrap_or_else(|| "other".to_string()),
            phone: fields.phone.unwrap_or_default(),
            email: fields.email,
            blood_group: fields.blood_group.unwrap_or_else(|| "N/A".to_string()),
            address: fields.address.unwrap_or_default(),
            created_at: now,
        })
    }

    pub fn apply_update(&mut self, update: PatientUpdate) -> Result<(), DomainError> {
        if let Some(name) = update.full_name {
            self.full_name = required("full name", &name)?;
        }
        if let Some(phone) = update.phone {
            self.phone = phone.trim().to_string();
        }
        if let Some(email) = update.email {
            self.email = Some(email);
        }
        if let Some(blood_group) = update.blood_group {
            self.blood_group = blood_group.trim().to_string();
        }
        if let Some(address) = update.address {
            self.address = address.trim().to_string();
        }
        Ok(())
    }
}

tenant_owned_record!(Patient);

// ─────────────────────────────────────────────────────────────────────────────
// Medical record
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub id: RecordId,
    pub hospital_id: TenantId,
    pub patient_id: RecordId,
    pub author_id: PrincipalId,
    pub diagnosis: String,
    pub symptoms: String,
    pub treatment_plan: String,
    pub notes: String,
    /// Free-form vitals (blood pressure, heart rate, weight...).
    pub vitals: serde_json::Value,
    pub visit_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMedicalRecord {
    pub patient_id: RecordId,
    pub diagnosis: String,
    #[serde(default)]
    pub symptoms: String,
    #[serde(default)]
    pub treatment_plan: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub vitals: Option<serde_json::Value>,
}

impl MedicalRecord {
    pub fn write(
        hospital_id: TenantId,
        author_id: PrincipalId,
        fields: NewMedicalRecord,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id: RecordId::new(),
            hospital_id,
            patient_id: fields.patient_id,
            author_id,
            diagnosis: required("diagnosis", &fields.diagnosis)?,
            symptoms: fields.symptoms,
            treatment_plan: fields.treatment_plan,
            notes: fields.notes,
            vitals: fields.vitals.unwrap_or_else(|| serde_json::json!({})),
            visit_date: now,
        })
    }
}

tenant_owned_record!(MedicalRecord);

// ─────────────────────────────────────────────────────────────────────────────
// Prescription
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prescription {
    pub id: RecordId,
    pub hospital_id: TenantId,
    pub patient_id: RecordId,
    pub prescriber_id: PrincipalId,
    pub medication_name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub instructions: String,
    pub date_issued: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPrescription {
    pub patient_id: RecordId,
    pub medication_name: String,
    pub dosage: String,
    pub frequency: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub instructions: String,
}

impl Prescription {
    pub fn issue(
        hospital_id: TenantId,
        prescriber_id: PrincipalId,
        fields: NewPrescription,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id: RecordId::new(),
            hospital_id,
            patient_id: fields.patient_id,
            prescriber_id,
            medication_name: required("medication name", &fields.medication_name)?,
            dosage: required("dosage", &fields.dosage)?,
            frequency: required("frequency", &fields.frequency)?,
            duration: fields.duration,
            instructions: fields.instructions,
            date_issued: now,
        })
    }
}

tenant_owned_record!(Prescription);

// ─────────────────────────────────────────────────────────────────────────────
// Appointment
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no_show",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: RecordId,
    pub hospital_id: TenantId,
    pub patient_id: RecordId,
    pub doctor_id: PrincipalId,
    pub scheduled_at: DateTime<Utc>,
    pub reason: String,
    pub kind: String,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAppointment {
    pub patient_id: RecordId,
    pub doctor_id: PrincipalId,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub kind: Option<String>,
}

impl Appointment {
    pub fn book(hospital_id: TenantId, fields: NewAppointment) -> Self {
        Self {
            id: RecordId::new(),
            hospital_id,
            patient_id: fields.patient_id,
            doctor_id: fields.doctor_id,
            scheduled_at: fields.scheduled_at,
            reason: fields.reason,
            kind: fields.kind.unwrap_or_else(|| "general".to_string()),
            status: AppointmentStatus::Scheduled,
        }
    }

    /// Same doctor at the same instant, unless the existing slot was cancelled.
    pub fn conflicts_with(&self, existing: &Appointment) -> bool {
        existing.doctor_id == self.doctor_id
            && existing.scheduled_at == self.scheduled_at
            && existing.status != AppointmentStatus::Cancelled
    }

    pub fn set_status(&mut self, to: AppointmentStatus) -> Result<(), DomainError> {
        if self.status == AppointmentStatus::Cancelled && to != AppointmentStatus::Cancelled {
            return Err(DomainError::invariant("a cancelled appointment cannot be reopened"));
        }
        self.status = to;
        Ok(())
    }
}

tenant_owned_record!(Appointment);
