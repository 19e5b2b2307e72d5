//! Pure authorization checks over a verified [`Principal`].
//!
//! - No IO
//! - No panics
//!
//! Two distinct outcomes: a role or tenant mismatch on a route is
//! `PermissionDenied`; a record lookup outside the caller's tenant is
//! `ResourceNotFound` (see [`tenant_filter`]), so record existence in other
//! tenants is never observable.

use apexhms_core::TenantId;

use crate::{AuthError, Principal, RoleSet};

/// Why a policy denied a request. Logged, never returned to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    RoleNotAllowed,
    TenantMismatch,
}

pub fn require_role(principal: &Principal, allowed: &RoleSet) -> Result<(), AuthError> {
    if allowed.contains(principal.role()) {
        Ok(())
    } else {
        Err(AuthError::PermissionDenied)
    }
}

/// Tenant predicate for routes that name a hospital in the path.
///
/// Super-admin is exempt. The outcome does not depend on whether `target`
/// exists.
pub fn require_tenant(principal: &Principal, target: TenantId) -> Result<(), AuthError> {
    if principal.is_super_admin() || principal.tenant_id() == Some(target) {
        Ok(())
    } else {
        Err(AuthError::PermissionDenied)
    }
}

/// Equality filter for record lookups: `hospital_id == returned value`.
pub fn tenant_filter(principal: &Principal) -> Result<TenantId, AuthError> {
    principal.tenant_id().ok_or(AuthError::ResourceNotFound)
}

/// A route policy: allowed roles, plus whether a path tenant must match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    pub roles: RoleSet,
    pub tenant_scoped: bool,
}

impl Policy {
    pub const fn roles(roles: RoleSet) -> Self {
        Self { roles, tenant_scoped: false }
    }

    pub const fn tenant(roles: RoleSet) -> Self {
        Self { roles, tenant_scoped: true }
    }

    /// Role first, then tenant. `target` is ignored for policies that are not
    /// tenant scoped.
    pub fn evaluate(&self, principal: &Principal, target: Option<TenantId>) -> Result<(), DenialReason> {
        if !self.roles.contains(principal.role()) {
            return Err(DenialReason::RoleNotAllowed);
        }
        if self.tenant_scoped {
            let target = target.ok_or(DenialReason::TenantMismatch)?;
            if require_tenant(principal, target).is_err() {
                return Err(DenialReason::TenantMismatch);
            }
        }
        Ok(())
    }

    pub fn check(&self, principal: &Principal, target: Option<TenantId>) -> Result<(), AuthError> {
        self.evaluate(principal, target).map_err(|reason| {
            tracing::debug!(
                principal_id = %principal.id(),
                role = %principal.role(),
                ?reason,
                "policy denied request"
            );
            AuthError::PermissionDenied
        })
    }
}
