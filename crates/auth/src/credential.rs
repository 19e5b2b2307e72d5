//! Stored login credentials and the account lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use apexhms_core::{DomainError, DomainResult, Email, PrincipalId, TenantId};

use crate::verification::PendingVerification;
use crate::{Principal, PrincipalError, Role};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    #[default]
    Unverified,
    Active,
    Suspended,
    Rejected,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Unverified => "unverified",
            AccountStatus::Active => "active",
            AccountStatus::Suspended => "suspended",
            AccountStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unverified" => Some(AccountStatus::Unverified),
            "active" => Some(AccountStatus::Active),
            "suspended" => Some(AccountStatus::Suspended),
            "rejected" => Some(AccountStatus::Rejected),
            _ => None,
        }
    }

    /// Administrative transitions. `Unverified -> Active` only happens by
    /// consuming a verification token and is not reachable here.
    pub fn transition(self, to: AccountStatus) -> DomainResult<AccountStatus> {
        use AccountStatus::*;
        match (self, to) {
            (Active, Suspended) | (Suspended, Active) | (Unverified, Rejected) => Ok(to),
            (from, to) => Err(DomainError::invariant(format!(
                "account cannot move from {} to {}",
                from.as_str(),
                to.as_str()
            ))),
        }
    }
}

impl core::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub principal_id: PrincipalId,
    pub email: Email,
    pub password_hash: String,
    pub role: Role,
    pub tenant_id: Option<TenantId>,
    pub status: AccountStatus,
    pub pending_verification: Option<PendingVerification>,
    pub created_at: DateTime<Utc>,
}

impl Credential {
    /// A self-service signup: unverified, with a fresh verification token.
    pub fn self_registered(
        email: Email,
        password_hash: String,
        role: Role,
        tenant_id: Option<TenantId>,
        now: DateTime<Utc>,
    ) -> Result<Self, PrincipalError> {
        let principal = Principal::new(PrincipalId::new(), role, tenant_id)?;
        Ok(Self {
            principal_id: principal.id(),
            email,
            password_hash,
            role,
            tenant_id,
            status: AccountStatus::Unverified,
            pending_verification: Some(PendingVerification::issue(now)),
            created_at: now,
        })
    }

    /// Created by an administrator on someone's behalf; usable immediately.
    pub fn provisioned(
        email: Email,
        password_hash: String,
        role: Role,
        tenant_id: Option<TenantId>,
        now: DateTime<Utc>,
    ) -> Result<Self, PrincipalError> {
        let principal = Principal::new(PrincipalId::new(), role, tenant_id)?;
        Ok(Self {
            principal_id: principal.id(),
            email,
            password_hash,
            role,
            tenant_id,
            status: AccountStatus::Active,
            pending_verification: None,
            created_at: now,
        })
    }

    pub fn principal(&self) -> Result<Principal, PrincipalError> {
        Principal::new(self.principal_id, self.role, self.tenant_id)
    }

    /// Marks the account verified. Callers must have matched the token first.
    pub fn mark_verified(&mut self) {
        self.status = AccountStatus::Active;
        self.pending_verification = None;
    }
}

/// What a credential looks like to API clients. Never carries the hash or
/// the verification token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountView {
    pub id: PrincipalId,
    pub email: Email,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<TenantId>,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
}

impl From<&Credential> for AccountView {
    fn from(c: &Credential) -> Self {
        Self {
            id: c.principal_id,
            email: c.email.clone(),
            role: c.role,
            tenant_id: c.tenant_id,
            status: c.status,
            created_at: c.created_at,
        }
    }
}
