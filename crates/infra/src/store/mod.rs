//! Persistence collaborators.
//!
//! Every handle is injected at startup as `Arc<dyn ...>`; there is no global
//! client. Reads of business records are always keyed by tenant, so a record
//! owned by another hospital looks exactly like a missing one.

mod credentials;
mod hospitals;
#[cfg(feature = "postgres")]
pub mod postgres;
mod sequence;
mod tenant_store;

pub use credentials::{CredentialStore, InMemoryCredentialStore};
pub use hospitals::{HospitalStore, InMemoryHospitalStore};
pub use sequence::{InMemoryTenantSequence, TenantSequence};
pub use tenant_store::{InMemoryTenantStore, TenantScopedStore, insert_owned};

use thiserror::Error;

/// Infrastructure failure, as opposed to a domain outcome.
///
/// Messages are for logs only; the API never forwards them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint was hit (email, license number, booking slot).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Backend unreachable, pool closed, lock poisoned.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Stored data could not be mapped back into domain types.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub(crate) fn poisoned() -> Self {
        StoreError::Unavailable("lock poisoned".to_string())
    }
}
