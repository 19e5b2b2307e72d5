//! Entity traits: identity + tenant ownership.

use crate::id::TenantId;

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// An entity that belongs to exactly one hospital.
///
/// The owning tenant is fixed at creation; stores key every record by it so a
/// lookup under another tenant behaves exactly like a lookup of a missing id.
pub trait TenantOwned: Entity {
    fn owner(&self) -> TenantId;
}
