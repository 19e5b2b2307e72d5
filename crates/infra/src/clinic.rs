//! Tenant-scoped clinical operations.
//!
//! Every method takes the caller's tenant filter. A record owned by another
//! hospital is reported as not found, exactly like a record that does not
//! exist.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tracing::instrument;

use apexhms_auth::{AuthError, Role};
use apexhms_core::{
    Appointment, AppointmentStatus, MedicalRecord, NewAppointment, NewMedicalRecord, NewPatient, NewPrescription,
    Patient, PatientUpdate, Prescription, PrincipalId, RecordId, TenantId,
};

use crate::error::{AccountError, AccountResult};
use crate::mailer::{self, Mailer};
use crate::store::{
    CredentialStore, InMemoryTenantSequence, InMemoryTenantStore, StoreError, TenantScopedStore, TenantSequence,
    insert_owned,
};

const ADMIT_ATTEMPTS: usize = 5;

fn not_found() -> AccountError {
    AccountError::Auth(AuthError::ResourceNotFound)
}

/// Admits a patient under the next `P000000` number of the hospital.
///
/// Numbers come from a per-hospital counter and are never reissued, even
/// after the patient holding one is removed. The conditional insert still
/// guards against a number already taken by an imported record.
pub async fn admit_patient(
    stores: &ClinicStores,
    tenant_id: TenantId,
    fields: NewPatient,
    principal_id: Option<PrincipalId>,
    now: DateTime<Utc>,
) -> AccountResult<Patient> {
    for _ in 0..ADMIT_ATTEMPTS {
        let next = stores.patient_numbers.next(tenant_id).await?;
        let sequence =
            usize::try_from(next).map_err(|_| AccountError::Internal("patient number overflow".to_string()))?;

        let patient = Patient::admit(tenant_id, sequence, fields.clone(), principal_id, now)?;
        let number = patient.patient_number.clone();

        match stores
            .patients
            .insert_unless(tenant_id, patient.id, patient.clone(), &move |p: &Patient| p.patient_number == number)
            .await
        {
            Ok(()) => return Ok(patient),
            Err(StoreError::Conflict(_)) => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(AccountError::Conflict("could not allocate a patient number".to_string()))
}

/// Handles to the tenant-scoped business record stores.
#[derive(Clone)]
pub struct ClinicStores {
    pub patients: Arc<dyn TenantScopedStore<RecordId, Patient>>,
    pub patient_numbers: Arc<dyn TenantSequence>,
    pub records: Arc<dyn TenantScopedStore<RecordId, MedicalRecord>>,
    pub prescriptions: Arc<dyn TenantScopedStore<RecordId, Prescription>>,
    pub appointments: Arc<dyn TenantScopedStore<RecordId, Appointment>>,
}

impl ClinicStores {
    pub fn in_memory() -> Self {
        Self {
            patients: Arc::new(InMemoryTenantStore::new()),
            patient_numbers: Arc::new(InMemoryTenantSequence::new()),
            records: Arc::new(InMemoryTenantStore::new()),
            prescriptions: Arc::new(InMemoryTenantStore::new()),
            appointments: Arc::new(InMemoryTenantStore::new()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PlatformCounts {
    pub total_patients: usize,
    pub total_appointments: usize,
}

pub struct ClinicService {
    stores: ClinicStores,
    credentials: Arc<dyn CredentialStore>,
    mailer: Arc<dyn Mailer>,
}

impl ClinicService {
    pub fn new(stores: ClinicStores, credentials: Arc<dyn CredentialStore>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            stores,
            credentials,
            mailer,
        }
    }

    // ── patients ────────────────────────────────────────────────────────────

    pub async fn list_patients(&self, tenant_id: TenantId) -> AccountResult<Vec<Patient>> {
        let mut patients = self.stores.patients.list(tenant_id).await?;
        patients.sort_by(|a, b| a.patient_number.cmp(&b.patient_number));
        Ok(patients)
    }

    #[instrument(skip(self, fields), err)]
    pub async fn add_patient(&self, tenant_id: TenantId, fields: NewPatient) -> AccountResult<Patient> {
        admit_patient(&self.stores, tenant_id, fields, None, Utc::now()).await
    }

    pub async fn patient(&self, tenant_id: TenantId, id: RecordId) -> AccountResult<Patient> {
        self.stores.patients.get(tenant_id, &id).await?.ok_or_else(not_found)
    }

    pub async fn update_patient(
        &self,
        tenant_id: TenantId,
        id: RecordId,
        update: PatientUpdate,
    ) -> AccountResult<Patient> {
        let mut updated = self.patient(tenant_id, id).await?;
        updated.apply_update(update)?;

        let replacement = updated.clone();
        self.stores
            .patients
            .update(tenant_id, &id, &move |p: &mut Patient| {
                *p = replacement.clone();
                Ok(())
            })
            .await?
            .ok_or_else(not_found)
    }

    /// Removes a patient without clinical history, together with the patient
    /// login when one is linked. A patient with records, prescriptions or
    /// appointments is refused with a conflict.
    #[instrument(skip(self), err)]
    pub async fn remove_patient(&self, tenant_id: TenantId, id: RecordId) -> AccountResult<()> {
        let patient = self.patient(tenant_id, id).await?;

        let has_records = self.stores.records.list(tenant_id).await?.iter().any(|r| r.patient_id == id);
        let has_prescriptions = self
            .stores
            .prescriptions
            .list(tenant_id)
            .await?
            .iter()
            .any(|p| p.patient_id == id);
        let has_appointments = self
            .stores
            .appointments
            .list(tenant_id)
            .await?
            .iter()
            .any(|a| a.patient_id == id);
        if has_records || has_prescriptions || has_appointments {
            return Err(AccountError::Conflict("patient has clinical history and cannot be removed".to_string()));
        }

        self.stores.patients.remove(tenant_id, &id).await?.ok_or_else(not_found)?;
        if let Some(principal_id) = patient.principal_id {
            self.credentials.remove(principal_id).await?;
        }

        tracing::info!(tenant_id = %tenant_id, patient_id = %id, "patient removed");
        Ok(())
    }

    /// The patient record linked to a patient login.
    pub async fn patient_for_principal(&self, tenant_id: TenantId, principal_id: PrincipalId) -> AccountResult<Patient> {
        self.stores
            .patients
            .list(tenant_id)
            .await?
            .into_iter()
            .find(|p| p.principal_id == Some(principal_id))
            .ok_or_else(not_found)
    }

    // ── medical records ─────────────────────────────────────────────────────

    pub async fn records_for_patient(&self, tenant_id: TenantId, patient_id: RecordId) -> AccountResult<Vec<MedicalRecord>> {
        self.patient(tenant_id, patient_id).await?;

        let mut records: Vec<MedicalRecord> = self
            .stores
            .records
            .list(tenant_id)
            .await?
            .into_iter()
            .filter(|r| r.patient_id == patient_id)
            .collect();
        records.sort_by(|a, b| b.visit_date.cmp(&a.visit_date));
        Ok(records)
    }

    pub async fn record(&self, tenant_id: TenantId, id: RecordId) -> AccountResult<MedicalRecord> {
        self.stores.records.get(tenant_id, &id).await?.ok_or_else(not_found)
    }

    #[instrument(skip(self, fields), err)]
    pub async fn write_record(
        &self,
        tenant_id: TenantId,
        author_id: PrincipalId,
        fields: NewMedicalRecord,
    ) -> AccountResult<MedicalRecord> {
        self.patient(tenant_id, fields.patient_id).await?;

        let record = MedicalRecord::write(tenant_id, author_id, fields, Utc::now())?;
        insert_owned(&*self.stores.records, record.clone()).await?;
        Ok(record)
    }

    // ── prescriptions ───────────────────────────────────────────────────────

    pub async fn prescriptions_for_patient(
        &self,
        tenant_id: TenantId,
        patient_id: RecordId,
    ) -> AccountResult<Vec<Prescription>> {
        self.patient(tenant_id, patient_id).await?;

        let mut out: Vec<Prescription> = self
            .stores
            .prescriptions
            .list(tenant_id)
            .await?
            .into_iter()
            .filter(|p| p.patient_id == patient_id)
            .collect();
        out.sort_by(|a, b| b.date_issued.cmp(&a.date_issued));
        Ok(out)
    }

    #[instrument(skip(self, fields), err)]
    pub async fn issue_prescription(
        &self,
        tenant_id: TenantId,
        prescriber_id: PrincipalId,
        fields: NewPrescription,
    ) -> AccountResult<Prescription> {
        self.patient(tenant_id, fields.patient_id).await?;

        let prescription = Prescription::issue(tenant_id, prescriber_id, fields, Utc::now())?;
        insert_owned(&*self.stores.prescriptions, prescription.clone()).await?;
        Ok(prescription)
    }

    pub async fn remove_prescription(&self, tenant_id: TenantId, id: RecordId) -> AccountResult<()> {
        self.stores.prescriptions.remove(tenant_id, &id).await?.ok_or_else(not_found)?;
        Ok(())
    }

    // ── appointments ────────────────────────────────────────────────────────

    pub async fn list_appointments(&self, tenant_id: TenantId) -> AccountResult<Vec<Appointment>> {
        let mut out = self.stores.appointments.list(tenant_id).await?;
        out.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at));
        Ok(out)
    }

    pub async fn appointments_for_patient(
        &self,
        tenant_id: TenantId,
        patient_id: RecordId,
    ) -> AccountResult<Vec<Appointment>> {
        Ok(self
            .list_appointments(tenant_id)
            .await?
            .into_iter()
            .filter(|a| a.patient_id == patient_id)
            .collect())
    }

    /// Books a slot. The same doctor cannot hold two live appointments at
    /// the same instant.
    #[instrument(skip(self, fields), err)]
    pub async fn book_appointment(&self, tenant_id: TenantId, fields: NewAppointment) -> AccountResult<Appointment> {
        self.patient(tenant_id, fields.patient_id).await?;

        let doctor = self.credentials.find_in_tenant(tenant_id, fields.doctor_id).await?;
        if !doctor.is_some_and(|d| d.role == Role::Doctor) {
            return Err(AccountError::Validation("doctor not found in this hospital".to_string()));
        }

        let appointment = Appointment::book(tenant_id, fields);
        let candidate = appointment.clone();
        self.stores
            .appointments
            .insert_unless(tenant_id, appointment.id, appointment.clone(), &move |existing: &Appointment| {
                candidate.conflicts_with(existing)
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => {
                    AccountError::Conflict("doctor already has an appointment at this time".to_string())
                }
                other => other.into(),
            })?;

        Ok(appointment)
    }

    /// Moves an appointment to `status`. The transition is checked against
    /// the stored record inside the update, so a concurrent cancel cannot be
    /// overwritten.
    pub async fn set_appointment_status(
        &self,
        tenant_id: TenantId,
        id: RecordId,
        status: AppointmentStatus,
    ) -> AccountResult<Appointment> {
        self.stores
            .appointments
            .update(tenant_id, &id, &move |a: &mut Appointment| {
                a.set_status(status).map_err(|e| StoreError::Conflict(e.to_string()))
            })
            .await?
            .ok_or_else(not_found)
    }

    /// Cancels and tells the patient, when an address is on file. Cancelling
    /// an already cancelled appointment changes nothing and sends nothing.
    #[instrument(skip(self), err)]
    pub async fn cancel_appointment(&self, tenant_id: TenantId, id: RecordId) -> AccountResult<Appointment> {
        let was_live = AtomicBool::new(false);
        let cancelled = self
            .stores
            .appointments
            .update(tenant_id, &id, &|a: &mut Appointment| {
                was_live.store(a.status != AppointmentStatus::Cancelled, Ordering::SeqCst);
                a.set_status(AppointmentStatus::Cancelled).map_err(|e| StoreError::Conflict(e.to_string()))
            })
            .await?
            .ok_or_else(not_found)?;

        if !was_live.load(Ordering::SeqCst) {
            tracing::debug!(appointment_id = %id, "appointment already cancelled");
            return Ok(cancelled);
        }

        match self.stores.patients.get(tenant_id, &cancelled.patient_id).await? {
            Some(Patient {
                email: Some(email),
                full_name,
                ..
            }) => {
                let mail = mailer::appointment_cancelled_email(email, &full_name, cancelled.scheduled_at);
                mailer::deliver(&*self.mailer, mail).await;
            }
            _ => tracing::debug!(appointment_id = %id, "no patient email on file"),
        }

        Ok(cancelled)
    }

    pub async fn platform_counts(&self) -> AccountResult<PlatformCounts> {
        Ok(PlatformCounts {
            total_patients: self.stores.patients.count_all().await?,
            total_appointments: self.stores.appointments.count_all().await?,
        })
    }

    pub async fn patient_count(&self, tenant_id: TenantId) -> AccountResult<usize> {
        Ok(self.stores.patients.count(tenant_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::RecordingMailer;
    use crate::store::InMemoryCredentialStore;
    use apexhms_auth::Credential;
    use apexhms_core::Email;
    use chrono::{Duration, NaiveDate, TimeZone};

    struct Harness {
        clinic: ClinicService,
        credentials: Arc<InMemoryCredentialStore>,
        mailer: Arc<RecordingMailer>,
    }

    fn harness() -> Harness {
        let credentials = Arc::new(InMemoryCredentialStore::new());
        let mailer = Arc::new(RecordingMailer::new());
        Harness {
            clinic: ClinicService::new(ClinicStores::in_memory(), credentials.clone(), mailer.clone()),
            credentials,
            mailer,
        }
    }

    fn new_patient(name: &str, email: Option<&str>) -> NewPatient {
        NewPatient {
            full_name: name.to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1980, 1, 1).unwrap(),
            gender: None,
            phone: None,
            email: email.map(|e| Email::parse(e).unwrap()),
            blood_group: None,
            address: None,
        }
    }

    async fn doctor(h: &Harness, tenant: TenantId, email: &str) -> PrincipalId {
        let c = Credential::provisioned(Email::parse(email).unwrap(), "hash".into(), Role::Doctor, Some(tenant), Utc::now())
            .unwrap();
        let id = c.principal_id;
        h.credentials.insert(c).await.unwrap();
        id
    }

    #[tokio::test]
    async fn patient_numbers_are_sequential_per_hospital() {
        let h = harness();
        let (t1, t2) = (TenantId::new(), TenantId::new());

        let a = h.clinic.add_patient(t1, new_patient("A", None)).await.unwrap();
        let b = h.clinic.add_patient(t1, new_patient("B", None)).await.unwrap();
        let c = h.clinic.add_patient(t2, new_patient("C", None)).await.unwrap();

        assert_eq!(a.patient_number, "P000001");
        assert_eq!(b.patient_number, "P000002");
        assert_eq!(c.patient_number, "P000001");
    }

    #[tokio::test]
    async fn cross_tenant_access_is_not_found() {
        let h = harness();
        let (mine, theirs) = (TenantId::new(), TenantId::new());
        let author = doctor(&h, theirs, "doc@h.com").await;

        let patient = h.clinic.add_patient(theirs, new_patient("Jane", None)).await.unwrap();
        let record = h
            .clinic
            .write_record(
                theirs,
                author,
                NewMedicalRecord {
                    patient_id: patient.id,
                    diagnosis: "flu".to_string(),
                    symptoms: String::new(),
                    treatment_plan: String::new(),
                    notes: String::new(),
                    vitals: None,
                },
            )
            .await
            .unwrap();

        let nf = AccountError::Auth(AuthError::ResourceNotFound);
        assert_eq!(h.clinic.patient(mine, patient.id).await.unwrap_err(), nf);
        assert_eq!(h.clinic.record(mine, record.id).await.unwrap_err(), nf);
        assert_eq!(h.clinic.records_for_patient(mine, patient.id).await.unwrap_err(), nf);
        assert_eq!(h.clinic.remove_patient(mine, patient.id).await.unwrap_err(), nf);
        assert_eq!(
            h.clinic
                .update_patient(mine, patient.id, PatientUpdate::default())
                .await
                .unwrap_err(),
            nf
        );

        // still intact for the owner
        assert_eq!(h.clinic.record(theirs, record.id).await.unwrap(), record);
    }

    #[tokio::test]
    async fn records_require_a_patient_of_the_same_hospital() {
        let h = harness();
        let (t1, t2) = (TenantId::new(), TenantId::new());
        let foreign = h.clinic.add_patient(t2, new_patient("Jane", None)).await.unwrap();

        let err = h
            .clinic
            .issue_prescription(
                t1,
                PrincipalId::new(),
                NewPrescription {
                    patient_id: foreign.id,
                    medication_name: "Amoxicillin".to_string(),
                    dosage: "500mg".to_string(),
                    frequency: "3x daily".to_string(),
                    duration: "7 days".to_string(),
                    instructions: String::new(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, AccountError::Auth(AuthError::ResourceNotFound));
    }

    #[tokio::test]
    async fn double_booking_conflicts_until_cancelled() {
        let h = harness();
        let tenant = TenantId::new();
        let doc = doctor(&h, tenant, "doc@h.com").await;
        let patient = h.clinic.add_patient(tenant, new_patient("Jane", Some("jane@h.com"))).await.unwrap();
        let at = Utc.with_ymd_and_hms(2030, 5, 1, 9, 0, 0).unwrap();

        let slot = || NewAppointment {
            patient_id: patient.id,
            doctor_id: doc,
            scheduled_at: at,
            reason: "checkup".to_string(),
            kind: None,
        };

        let first = h.clinic.book_appointment(tenant, slot()).await.unwrap();
        assert!(matches!(
            h.clinic.book_appointment(tenant, slot()).await.unwrap_err(),
            AccountError::Conflict(_)
        ));

        let other_time = NewAppointment {
            scheduled_at: at + Duration::minutes(30),
            ..slot()
        };
        assert!(h.clinic.book_appointment(tenant, other_time).await.is_ok());

        let cancelled = h.clinic.cancel_appointment(tenant, first.id).await.unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
        assert!(h.clinic.book_appointment(tenant, slot()).await.is_ok());

        let mails = h.mailer.sent_to(&Email::parse("jane@h.com").unwrap());
        assert_eq!(mails.len(), 1);
        assert!(mails[0].body.contains("CANCELLED"));
    }

    #[tokio::test]
    async fn booking_needs_a_doctor_of_the_hospital() {
        let h = harness();
        let (t1, t2) = (TenantId::new(), TenantId::new());
        let foreign_doc = doctor(&h, t2, "doc@h.com").await;
        let patient = h.clinic.add_patient(t1, new_patient("Jane", None)).await.unwrap();

        let err = h
            .clinic
            .book_appointment(
                t1,
                NewAppointment {
                    patient_id: patient.id,
                    doctor_id: foreign_doc,
                    scheduled_at: Utc::now() + Duration::days(1),
                    reason: String::new(),
                    kind: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::Validation(_)));
    }

    #[tokio::test]
    async fn cancelled_appointments_stay_cancelled() {
        let h = harness();
        let tenant = TenantId::new();
        let doc = doctor(&h, tenant, "doc@h.com").await;
        let patient = h.clinic.add_patient(tenant, new_patient("Jane", None)).await.unwrap();
        let appt = h
            .clinic
            .book_appointment(
                tenant,
                NewAppointment {
                    patient_id: patient.id,
                    doctor_id: doc,
                    scheduled_at: Utc::now() + Duration::days(1),
                    reason: String::new(),
                    kind: None,
                },
            )
            .await
            .unwrap();

        h.clinic.cancel_appointment(tenant, appt.id).await.unwrap();
        assert!(matches!(
            h.clinic
                .set_appointment_status(tenant, appt.id, AppointmentStatus::Scheduled)
                .await
                .unwrap_err(),
            AccountError::Conflict(_)
        ));
    }

    #[tokio::test]
    async fn patient_login_finds_own_record() {
        let stores = ClinicStores::in_memory();
        let clinic = ClinicService::new(
            stores.clone(),
            Arc::new(InMemoryCredentialStore::new()),
            Arc::new(RecordingMailer::new()),
        );
        let (tenant, other) = (TenantId::new(), TenantId::new());
        let principal = PrincipalId::new();

        let patient = admit_patient(&stores, tenant, new_patient("Jane", None), Some(principal), Utc::now())
            .await
            .unwrap();

        assert_eq!(clinic.patient_for_principal(tenant, principal).await.unwrap(), patient);
        assert!(clinic.patient_for_principal(other, principal).await.is_err());
    }

    async fn booked(h: &Harness, tenant: TenantId, email: Option<&str>) -> Appointment {
        let doc = doctor(h, tenant, &format!("doc-{}@h.com", RecordId::new())).await;
        let patient = h.clinic.add_patient(tenant, new_patient("Jane", email)).await.unwrap();
        h.clinic
            .book_appointment(
                tenant,
                NewAppointment {
                    patient_id: patient.id,
                    doctor_id: doc,
                    scheduled_at: Utc::now() + Duration::days(1),
                    reason: String::new(),
                    kind: None,
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn patient_numbers_are_not_reused_after_removal() {
        let h = harness();
        let tenant = TenantId::new();

        h.clinic.add_patient(tenant, new_patient("A", None)).await.unwrap();
        let b = h.clinic.add_patient(tenant, new_patient("B", None)).await.unwrap();
        assert_eq!(b.patient_number, "P000002");

        h.clinic.remove_patient(tenant, b.id).await.unwrap();
        let c = h.clinic.add_patient(tenant, new_patient("C", None)).await.unwrap();
        assert_eq!(c.patient_number, "P000003");
    }

    #[tokio::test]
    async fn patient_with_clinical_history_cannot_be_removed() {
        let h = harness();
        let tenant = TenantId::new();
        let appt = booked(&h, tenant, None).await;

        let err = h.clinic.remove_patient(tenant, appt.patient_id).await.unwrap_err();
        assert!(matches!(err, AccountError::Conflict(_)));
        assert!(h.clinic.patient(tenant, appt.patient_id).await.is_ok());
    }

    #[tokio::test]
    async fn removing_a_patient_drops_the_linked_login() {
        let stores = ClinicStores::in_memory();
        let credentials = Arc::new(InMemoryCredentialStore::new());
        let clinic = ClinicService::new(stores.clone(), credentials.clone(), Arc::new(RecordingMailer::new()));
        let tenant = TenantId::new();

        let email = Email::parse("jane@h.com").unwrap();
        let login =
            Credential::self_registered(email.clone(), "hash".into(), Role::Patient, Some(tenant), Utc::now()).unwrap();
        let principal = login.principal_id;
        credentials.insert(login).await.unwrap();
        let patient = admit_patient(&stores, tenant, new_patient("Jane", None), Some(principal), Utc::now())
            .await
            .unwrap();

        clinic.remove_patient(tenant, patient.id).await.unwrap();
        assert!(credentials.find_by_id(principal).await.unwrap().is_none());
        assert!(credentials.find_by_email(&email).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cancelling_twice_notifies_once() {
        let h = harness();
        let tenant = TenantId::new();
        let appt = booked(&h, tenant, Some("jane@h.com")).await;

        h.clinic.cancel_appointment(tenant, appt.id).await.unwrap();
        let again = h.clinic.cancel_appointment(tenant, appt.id).await.unwrap();

        assert_eq!(again.status, AppointmentStatus::Cancelled);
        assert_eq!(h.mailer.sent_to(&Email::parse("jane@h.com").unwrap()).len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_status_changes_never_reopen_a_cancellation() {
        let h = Arc::new(harness());
        let tenant = TenantId::new();

        for _ in 0..16 {
            let appt = booked(&h, tenant, None).await;

            let cancel = {
                let h = h.clone();
                tokio::spawn(async move { h.clinic.cancel_appointment(tenant, appt.id).await })
            };
            let complete = {
                let h = h.clone();
                tokio::spawn(async move {
                    h.clinic
                        .set_appointment_status(tenant, appt.id, AppointmentStatus::Completed)
                        .await
                })
            };

            // Cancel wins from either order; completion may lose with a conflict.
            cancel.await.unwrap().unwrap();
            if let Err(e) = complete.await.unwrap() {
                assert!(matches!(e, AccountError::Conflict(_)));
            }

            let stored = h.clinic.list_appointments(tenant).await.unwrap();
            let stored = stored.iter().find(|a| a.id == appt.id).unwrap();
            assert_eq!(stored.status, AppointmentStatus::Cancelled);
        }
    }
}
