use apexhms_auth::{Principal, Role};
use apexhms_core::{PrincipalId, TenantId};

/// Principal context for a request (the verified token, nothing more).
///
/// Inserted by the auth middleware and immutable afterwards. Tenant identity
/// comes only from here, never from a path or body.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn principal_id(&self) -> PrincipalId {
        self.principal.id()
    }

    pub fn role(&self) -> Role {
        self.principal.role()
    }

    /// `None` only for the platform super-admin.
    pub fn tenant_id(&self) -> Option<TenantId> {
        self.principal.tenant_id()
    }
}
