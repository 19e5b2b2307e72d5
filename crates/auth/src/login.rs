use apexhms_core::HospitalStatus;

use crate::AuthError;
use crate::credential::{AccountStatus, Credential};

/// Decides whether a login may proceed.
///
/// Order matters: an unapproved tenant is reported before the password is
/// considered, so a hospital's onboarding state is visible to its staff even
/// if they mistype. Everything after the tenant gate requires the right
/// password, so account state is never revealed to someone without it.
///
/// `tenant_status` is `None` for platform principals, and also when a
/// tenant-bound credential points at a hospital that no longer exists, which
/// is refused.
pub fn check_login(
    credential: &Credential,
    tenant_status: Option<HospitalStatus>,
    password_ok: bool,
) -> Result<(), AuthError> {
    if credential.tenant_id.is_some() {
        match tenant_status {
            Some(HospitalStatus::Approved) => {}
            Some(HospitalStatus::Pending) => return Err(AuthError::TenantPending),
            Some(HospitalStatus::Suspended) => return Err(AuthError::TenantSuspended),
            Some(HospitalStatus::Rejected) => return Err(AuthError::TenantRejected),
            None => return Err(AuthError::InvalidCredentials),
        }
    }

    if !password_ok {
        return Err(AuthError::InvalidCredentials);
    }

    match credential.status {
        AccountStatus::Active => Ok(()),
        AccountStatus::Unverified => Err(AuthError::AccountNotVerified),
        AccountStatus::Suspended | AccountStatus::Rejected => Err(AuthError::AccountSuspended),
    }
}
