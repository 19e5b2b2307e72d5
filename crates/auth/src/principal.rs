use serde::{Deserialize, Serialize};
use thiserror::Error;

use apexhms_core::{PrincipalId, TenantId};

use crate::Role;

/// The authenticated identity behind a request.
///
/// # Invariants
/// - `SuperAdmin` carries no tenant.
/// - Every other role carries exactly one tenant.
///
/// Both hold by construction: the fields are private and `new` is the only
/// way in (including when decoding token claims).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    id: PrincipalId,
    role: Role,
    tenant_id: Option<TenantId>,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PrincipalError {
    #[error("role {0} requires a tenant")]
    MissingTenant(Role),

    #[error("role {0} cannot belong to a tenant")]
    UnexpectedTenant(Role),
}

impl Principal {
    pub fn new(id: PrincipalId, role: Role, tenant_id: Option<TenantId>) -> Result<Self, PrincipalError> {
        match (role.is_tenant_bound(), tenant_id) {
            (true, None) => Err(PrincipalError::MissingTenant(role)),
            (false, Some(_)) => Err(PrincipalError::UnexpectedTenant(role)),
            _ => Ok(Self { id, role, tenant_id }),
        }
    }

    pub fn super_admin(id: PrincipalId) -> Self {
        Self {
            id,
            role: Role::SuperAdmin,
            tenant_id: None,
        }
    }

    pub fn id(&self) -> PrincipalId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }
}

/// Wire shape of a principal, for `whoami`-style responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalView {
    pub id: PrincipalId,
    pub role: Role,
    pub tenant_id: Option<TenantId>,
}

impl From<&Principal> for PrincipalView {
    fn from(p: &Principal) -> Self {
        Self {
            id: p.id,
            role: p.role,
            tenant_id: p.tenant_id,
        }
    }
}
