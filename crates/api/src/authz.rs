//! Route policies and the checks handlers run before touching a store.

use apexhms_auth::{Policy, RoleSet};
use apexhms_core::TenantId;

use crate::app::errors::ApiError;
use crate::context::PrincipalContext;

pub const SUPER_ADMIN: Policy = Policy::roles(RoleSet::PLATFORM);
/// Any authenticated role, limited to its own hospital.
pub const HOSPITAL_MEMBER: Policy = Policy::tenant(RoleSet::ANY);
pub const HOSPITAL_ADMIN: Policy = Policy::tenant(RoleSet::HOSPITAL_ADMIN);
/// Staff-or-admin on a route that names the hospital in its path.
pub const HOSPITAL_STAFF: Policy = Policy::tenant(RoleSet::STAFF_OR_ADMIN);
/// Staff-or-admin on a route addressed by record id.
pub const STAFF: Policy = Policy::roles(RoleSet::STAFF_OR_ADMIN);
pub const CARE_VIEWER: Policy = Policy::roles(RoleSet::CARE_VIEWERS);
pub const PATIENT: Policy = Policy::roles(RoleSet::PATIENT);

/// Check a policy; `target` is the hospital named by the route, if any.
pub fn require(ctx: &PrincipalContext, policy: &Policy, target: Option<TenantId>) -> Result<(), ApiError> {
    policy.check(ctx.principal(), target).map_err(ApiError::from)
}

/// Ownership filter for record lookups.
pub fn tenant_filter(ctx: &PrincipalContext) -> Result<TenantId, ApiError> {
    apexhms_auth::tenant_filter(ctx.principal()).map_err(ApiError::from)
}
