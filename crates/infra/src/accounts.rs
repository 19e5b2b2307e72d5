//! Account lifecycle: registration, email verification, login and
//! administrative status changes.
//!
//! bcrypt runs on the blocking pool; everything else is store calls.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use apexhms_auth::{
    AccountStatus, AccountView, AuthError, Credential, Hs256Jwt, PasswordHasher, PrincipalView, Role, RoleSet,
    VerificationToken, check_login,
};
use apexhms_core::{
    Email, Hospital, HospitalProfileUpdate, HospitalStatus, HospitalType, NewHospital, NewPatient, Patient,
    PrincipalId, TenantId,
};

use crate::clinic::{self, ClinicStores};
use crate::config::AuthSettings;
use crate::error::{AccountError, AccountResult};
use crate::mailer::{self, Mailer};
use crate::store::{CredentialStore, HospitalStore};

#[derive(Debug, Clone, Deserialize)]
pub struct PatientRegistration {
    pub email: String,
    pub password: String,
    pub hospital_id: TenantId,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub blood_group: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HospitalRegistration {
    pub name: String,
    pub hospital_type: HospitalType,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub license_number: String,
    pub admin_name: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaffProvisioning {
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub token: String,
    pub expires_at: chrono::DateTime<Utc>,
    pub principal: PrincipalView,
}

#[derive(Debug, Clone, Serialize)]
pub struct HospitalRegistered {
    pub hospital: Hospital,
    pub account: AccountView,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientRegistered {
    pub patient: Patient,
    pub account: AccountView,
}

pub struct AccountService {
    credentials: Arc<dyn CredentialStore>,
    hospitals: Arc<dyn HospitalStore>,
    clinic: ClinicStores,
    mailer: Arc<dyn Mailer>,
    hasher: PasswordHasher,
    jwt: Arc<Hs256Jwt>,
    settings: AuthSettings,
    /// Verified against when the email is unknown, so a miss costs the same
    /// bcrypt work as a wrong password.
    dummy_hash: String,
}

impl AccountService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        hospitals: Arc<dyn HospitalStore>,
        clinic: ClinicStores,
        mailer: Arc<dyn Mailer>,
        jwt: Arc<Hs256Jwt>,
        settings: AuthSettings,
    ) -> AccountResult<Self> {
        let hasher = PasswordHasher::new(settings.bcrypt_cost)?;
        let dummy_hash = hasher.hash(VerificationToken::generate().as_str())?;

        Ok(Self {
            credentials,
            hospitals,
            clinic,
            mailer,
            hasher,
            jwt,
            settings,
            dummy_hash,
        })
    }

    async fn hash_password(&self, password: &str) -> AccountResult<String> {
        PasswordHasher::validate_strength(password)?;

        let hasher = self.hasher;
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AccountError::Internal(format!("hashing task failed: {e}")))?
            .map_err(AccountError::from)
    }

    async fn verify_password(&self, password: &str, hash: &str) -> AccountResult<bool> {
        let hasher = self.hasher;
        let (password, hash) = (password.to_string(), hash.to_string());
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AccountError::Internal(format!("verification task failed: {e}")))
    }

    async fn ensure_email_free(&self, email: &Email) -> AccountResult<()> {
        if self.credentials.find_by_email(email).await?.is_some() {
            return Err(AccountError::Conflict("email already registered".to_string()));
        }
        Ok(())
    }

    async fn send_verification(&self, credential: &Credential) {
        if let Some(pending) = &credential.pending_verification {
            let link = self.settings.verification_link(pending.token.as_str());
            mailer::deliver(&*self.mailer, mailer::verification_email(credential.email.clone(), &link)).await;
        }
    }

    /// Patient self-registration against an approved hospital.
    #[instrument(skip_all, fields(tenant_id = %req.hospital_id), err)]
    pub async fn register_patient(&self, req: PatientRegistration) -> AccountResult<PatientRegistered> {
        let email = Email::parse(&req.email)?;
        let now = Utc::now();

        let hospital = self
            .hospitals
            .get(req.hospital_id)
            .await?
            .filter(|h| h.status == HospitalStatus::Approved)
            .ok_or_else(|| AccountError::Validation("hospital is not accepting registrations".to_string()))?;

        let fields = NewPatient {
            full_name: req.full_name,
            date_of_birth: req.date_of_birth,
            gender: req.gender,
            phone: req.phone,
            email: Some(email.clone()),
            blood_group: req.blood_group,
            address: req.address,
        };
        // Validate the record before any write.
        Patient::admit(hospital.id, 0, fields.clone(), None, now)?;

        self.ensure_email_free(&email).await?;
        let hash = self.hash_password(&req.password).await?;
        let credential = Credential::self_registered(email, hash, Role::Patient, Some(hospital.id), now)?;
        self.credentials.insert(credential.clone()).await?;

        let patient =
            match clinic::admit_patient(&self.clinic, hospital.id, fields, Some(credential.principal_id), now).await {
                Ok(patient) => patient,
                Err(e) => {
                    // No credential without its patient record.
                    if let Err(undo) = self.credentials.remove(credential.principal_id).await {
                        tracing::error!(principal_id = %credential.principal_id, error = %undo, "orphan credential left behind");
                    }
                    return Err(e);
                }
            };

        self.send_verification(&credential).await;
        tracing::info!(principal_id = %credential.principal_id, "patient registered");

        Ok(PatientRegistered {
            patient,
            account: AccountView::from(&credential),
        })
    }

    /// Hospital self-registration; the hospital starts pending approval.
    #[instrument(skip_all, err)]
    pub async fn register_hospital(&self, req: HospitalRegistration) -> AccountResult<HospitalRegistered> {
        let email = Email::parse(&req.email)?;
        PasswordHasher::validate_strength(&req.password)?;
        let now = Utc::now();

        let hospital = Hospital::register(
            NewHospital {
                name: req.name,
                hospital_type: req.hospital_type,
                address: req.address,
                phone: req.phone,
                email: email.clone(),
                license_number: req.license_number,
                admin_name: req.admin_name,
            },
            now,
        )?;

        self.ensure_email_free(&email).await?;
        let hash = self.hash_password(&req.password).await?;

        self.hospitals.insert(hospital.clone()).await?;
        let credential = Credential::self_registered(email, hash, Role::HospitalAdmin, Some(hospital.id), now)?;
        self.credentials.insert(credential.clone()).await?;

        self.send_verification(&credential).await;
        tracing::info!(tenant_id = %hospital.id, "hospital registered, pending approval");

        Ok(HospitalRegistered {
            account: AccountView::from(&credential),
            hospital,
        })
    }

    /// Staff account created by a hospital administrator; active at once.
    #[instrument(skip_all, fields(tenant_id = %tenant_id), err)]
    pub async fn provision_staff(&self, tenant_id: TenantId, req: StaffProvisioning) -> AccountResult<AccountView> {
        if !RoleSet::PROVISIONABLE_STAFF.contains(req.role) {
            return Err(AccountError::Validation(format!("role {} cannot be provisioned", req.role)));
        }
        let email = Email::parse(&req.email)?;

        if self.hospitals.get(tenant_id).await?.is_none() {
            return Err(AuthError::ResourceNotFound.into());
        }

        self.ensure_email_free(&email).await?;
        let hash = self.hash_password(&req.password).await?;
        let credential = Credential::provisioned(email, hash, req.role, Some(tenant_id), Utc::now())?;
        self.credentials.insert(credential.clone()).await?;

        tracing::info!(principal_id = %credential.principal_id, role = %req.role, "staff provisioned");
        Ok(AccountView::from(&credential))
    }

    /// Consumes a verification token. Unknown, expired and already used
    /// tokens are one outcome.
    #[instrument(skip_all)]
    pub async fn verify_email(&self, token: &str) -> AccountResult<AccountView> {
        let token = VerificationToken::from_client(token.trim());
        let activated = self
            .credentials
            .consume_verification(&token, Utc::now(), self.settings.verification_ttl)
            .await?;

        let Some(credential) = activated else {
            tracing::debug!("verification token rejected");
            return Err(AuthError::TokenAlreadyUsedOrInvalid.into());
        };

        // Only the caller that flipped the status gets here.
        mailer::deliver(&*self.mailer, mailer::welcome_email(credential.email.clone())).await;
        tracing::info!(principal_id = %credential.principal_id, "email verified");

        Ok(AccountView::from(&credential))
    }

    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> AccountResult<LoginOutcome> {
        let credential = match Email::parse(email) {
            Ok(email) => self.credentials.find_by_email(&email).await?,
            Err(_) => None,
        };

        let Some(credential) = credential else {
            self.verify_password(password, &self.dummy_hash).await?;
            return Err(AuthError::InvalidCredentials.into());
        };

        let tenant_status = match credential.tenant_id {
            Some(tenant) => self.hospitals.get(tenant).await?.map(|h| h.status),
            None => None,
        };
        let password_ok = self.verify_password(password, &credential.password_hash).await?;

        if let Err(e) = check_login(&credential, tenant_status, password_ok) {
            tracing::debug!(principal_id = %credential.principal_id, reason = e.code(), "login refused");
            return Err(e.into());
        }

        let principal = credential.principal()?;
        let now = Utc::now();
        let issued = self
            .jwt
            .issue(&principal, self.settings.token_ttl.ttl_for(principal.role()), now)
            .map_err(|e| AccountError::Internal(e.to_string()))?;

        tracing::info!(principal_id = %principal.id(), role = %principal.role(), "login succeeded");
        Ok(LoginOutcome {
            token: issued.token,
            expires_at: issued.expires_at,
            principal: PrincipalView::from(&principal),
        })
    }

    pub async fn account(&self, id: PrincipalId) -> AccountResult<AccountView> {
        self.credentials
            .find_by_id(id)
            .await?
            .map(|c| AccountView::from(&c))
            .ok_or(AccountError::Auth(AuthError::ResourceNotFound))
    }

    pub async fn list_staff(&self, tenant_id: TenantId) -> AccountResult<Vec<AccountView>> {
        Ok(self
            .credentials
            .list_in_tenant(tenant_id)
            .await?
            .iter()
            .filter(|c| c.role != Role::Patient)
            .map(AccountView::from)
            .collect())
    }

    /// Suspend or reactivate an account of the caller's hospital. Accounts of
    /// other hospitals are not found. Administrators cannot be changed here.
    #[instrument(skip(self), err)]
    pub async fn set_account_status(
        &self,
        tenant_id: TenantId,
        id: PrincipalId,
        target: AccountStatus,
    ) -> AccountResult<AccountView> {
        let current = self
            .credentials
            .find_in_tenant(tenant_id, id)
            .await?
            .ok_or(AccountError::Auth(AuthError::ResourceNotFound))?;

        if current.role == Role::HospitalAdmin {
            return Err(AuthError::PermissionDenied.into());
        }

        current.status.transition(target)?;
        let updated = self
            .credentials
            .set_status(id, current.status, target)
            .await?
            .ok_or_else(|| AccountError::Conflict("account status changed concurrently".to_string()))?;

        tracing::info!(principal_id = %id, status = %target, "account status changed");
        Ok(AccountView::from(&updated))
    }

    pub async fn hospital(&self, id: TenantId) -> AccountResult<Hospital> {
        self.hospitals
            .get(id)
            .await?
            .ok_or(AccountError::Auth(AuthError::ResourceNotFound))
    }

    pub async fn list_hospitals(&self, status: Option<HospitalStatus>) -> AccountResult<Vec<Hospital>> {
        Ok(self.hospitals.list(status).await?)
    }

    /// Platform-level approval state change.
    #[instrument(skip(self), err)]
    pub async fn set_hospital_status(&self, id: TenantId, target: HospitalStatus) -> AccountResult<Hospital> {
        let current = self.hospital(id).await?;
        current.status.transition(target)?;

        let updated = self
            .hospitals
            .set_status(id, current.status, target, Utc::now())
            .await?
            .ok_or_else(|| AccountError::Conflict("hospital status changed concurrently".to_string()))?;

        tracing::info!(tenant_id = %id, status = %target, "hospital status changed");
        Ok(updated)
    }

    pub async fn update_hospital_profile(
        &self,
        id: TenantId,
        update: &HospitalProfileUpdate,
    ) -> AccountResult<Hospital> {
        let mut hospital = self.hospital(id).await?;
        hospital.apply_profile(update)?;
        if !self.hospitals.update_profile(&hospital).await? {
            return Err(AuthError::ResourceNotFound.into());
        }
        Ok(hospital)
    }

    pub async fn count_hospitals(&self, status: Option<HospitalStatus>) -> AccountResult<usize> {
        Ok(self.hospitals.count_by_status(status).await?)
    }

    /// Creates the platform super-admin if it does not exist yet.
    pub async fn seed_super_admin(&self, email: &str, password: &str) -> AccountResult<()> {
        let email = Email::parse(email)?;
        if let Some(existing) = self.credentials.find_by_email(&email).await? {
            if existing.role == Role::SuperAdmin {
                tracing::debug!("super-admin already present");
                return Ok(());
            }
            return Err(AccountError::Conflict("seed email belongs to another account".to_string()));
        }

        let hash = self.hash_password(password).await?;
        let credential = Credential::provisioned(email, hash, Role::SuperAdmin, None, Utc::now())?;
        self.credentials.insert(credential).await?;
        tracing::info!("super-admin seeded");
        Ok(())
    }
}
