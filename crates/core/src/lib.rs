//! `apexhms-core`: hospital domain building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the hospital (tenant) lifecycle and the tenant-owned clinical
//! records every business route reads and writes.

pub mod clinical;
pub mod entity;
pub mod error;
pub mod hospital;
pub mod id;
pub mod value_object;

pub use clinical::{
    Appointment, AppointmentStatus, MedicalRecord, NewAppointment, NewMedicalRecord, NewPatient,
    NewPrescription, Patient, PatientUpdate, Prescription,
};
pub use entity::{Entity, TenantOwned};
pub use error::{DomainError, DomainResult};
pub use hospital::{Hospital, HospitalProfileUpdate, HospitalStatus, HospitalType, NewHospital};
pub use id::{PrincipalId, RecordId, TenantId};
pub use value_object::Email;
