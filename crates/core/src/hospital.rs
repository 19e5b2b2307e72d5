//! Hospital (tenant) entity and its approval lifecycle.
//!
//! A hospital is the isolation boundary of the platform. Its approval status
//! gates every login of the principals attributed to it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::DomainError;
use crate::id::TenantId;
use crate::value_object::Email;

// ─────────────────────────────────────────────────────────────────────────────
// Status
// ─────────────────────────────────────────────────────────────────────────────

/// Approval status of a hospital.
///
/// ```text
/// Pending ──► Approved ◄──► Suspended
///    │
///    └──────► Rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HospitalStatus {
    #[default]
    Pending,
    Approved,
    Suspended,
    Rejected,
}

impl HospitalStatus {
    /// Validate a status change and return the new status.
    pub fn transition(self, to: HospitalStatus) -> Result<HospitalStatus, DomainError> {
        use HospitalStatus::*;

        match (self, to) {
            (Pending, Approved) | (Pending, Rejected) => Ok(to),
            (Approved, Suspended) | (Suspended, Approved) => Ok(to),
            (from, to) => Err(DomainError::invariant(format!(
                "hospital cannot move from {from} to {to}"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HospitalStatus::Pending => "pending",
            HospitalStatus::Approved => "approved",
            HospitalStatus::Suspended => "suspended",
            HospitalStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(HospitalStatus::Pending),
            "approved" => Ok(HospitalStatus::Approved),
            "suspended" => Ok(HospitalStatus::Suspended),
            "rejected" => Ok(HospitalStatus::Rejected),
            _ => Err(DomainError::validation(
                "status must be one of: pending, approved, suspended, rejected",
            )),
        }
    }
}

impl core::fmt::Display for HospitalStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of facility, as declared at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HospitalType {
    Public,
    Private,
    Specialty,
    Clinic,
    MedicalCenter,
}

impl HospitalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HospitalType::Public => "public",
            HospitalType::Private => "private",
            HospitalType::Specialty => "specialty",
            HospitalType::Clinic => "clinic",
            HospitalType::MedicalCenter => "medical_center",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "public" => Ok(HospitalType::Public),
            "private" => Ok(HospitalType::Private),
            "specialty" => Ok(HospitalType::Specialty),
            "clinic" => Ok(HospitalType::Clinic),
            "medical_center" => Ok(HospitalType::MedicalCenter),
            _ => Err(DomainError::validation("invalid hospital type")),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entity
// ─────────────────────────────────────────────────────────────────────────────

/// A registered hospital.
///
/// # Invariants
/// - `approved_at` is set the first time the hospital reaches `Approved` and never cleared.
/// - `email` and `license_number` are unique across the platform (enforced by the store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hospital {
    pub id: TenantId,
    pub name: String,
    pub hospital_type: HospitalType,
    pub address: String,
    pub phone: String,
    pub email: Email,
    pub license_number: String,
    pub admin_name: String,
    pub status: HospitalStatus,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

/// Fields supplied by a hospital registration.
#[derive(Debug, Clone)]
pub struct NewHospital {
    pub name: String,
    pub hospital_type: HospitalType,
    pub address: String,
    pub phone: String,
    pub email: Email,
    pub license_number: String,
    pub admin_name: String,
}

/// Editable profile fields; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HospitalProfileUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl Hospital {
    /// Create a hospital awaiting platform approval.
    pub fn register(fields: NewHospital, now: DateTime<Utc>) -> Result<Self, DomainError> {
        for (label, value) in [
            ("hospital name", &fields.name),
            ("address", &fields.address),
            ("phone", &fields.phone),
            ("license number", &fields.license_number),
            ("administrator name", &fields.admin_name),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::validation(format!("{label} is required")));
            }
        }

        Ok(Self {
            id: TenantId::new(),
            name: fields.name.trim().to_string(),
            hospital_type: fields.hospital_type,
            address: fields.address.trim().to_string(),
            phone: fields.phone.trim().to_string(),
            email: fields.email,
            license_number: fields.license_number.trim().to_string(),
            admin_name: fields.admin_name.trim().to_string(),
            status: HospitalStatus::Pending,
            created_at: now,
            approved_at: None,
        })
    }

    /// Apply a status change, stamping the first approval.
    pub fn change_status(&mut self, to: HospitalStatus, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.status = self.status.transition(to)?;
        if to == HospitalStatus::Approved && self.approved_at.is_none() {
            self.approved_at = Some(now);
        }
        Ok(())
    }

    pub fn apply_profile(&mut self, update: &HospitalProfileUpdate) -> Result<(), DomainError> {
        if let Some(name) = &update.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("hospital name cannot be empty"));
            }
            self.name = name.trim().to_string();
        }
        if let Some(address) = &update.address {
            self.address = address.trim().to_string();
        }
        if let Some(phone) = &update.phone {
            self.phone = phone.trim().to_string();
        }
        Ok(())
    }
}

impl Entity for Hospital {
    type Id = TenantId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
