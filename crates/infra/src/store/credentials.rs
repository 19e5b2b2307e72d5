use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use apexhms_auth::{AccountStatus, Credential, VerificationToken};
use apexhms_core::{Email, PrincipalId, TenantId};

use super::StoreError;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fails with `StoreError::Conflict` when the email is already taken.
    async fn insert(&self, credential: Credential) -> Result<(), StoreError>;

    async fn find_by_email(&self, email: &Email) -> Result<Option<Credential>, StoreError>;

    async fn find_by_id(&self, id: PrincipalId) -> Result<Option<Credential>, StoreError>;

    async fn find_in_tenant(&self, tenant_id: TenantId, id: PrincipalId) -> Result<Option<Credential>, StoreError>;

    async fn list_in_tenant(&self, tenant_id: TenantId) -> Result<Vec<Credential>, StoreError>;

    /// Activates the unverified credential holding `token`, in one atomic
    /// step: token match, status still unverified and (when `ttl` is set)
    /// not expired. Clears the token. Returns the activated credential, or
    /// `None` if nothing matched, including when another caller already won.
    async fn consume_verification(
        &self,
        token: &VerificationToken,
        now: DateTime<Utc>,
        ttl: Option<Duration>,
    ) -> Result<Option<Credential>, StoreError>;

    /// Compare-and-set on the account status. `None` when the credential is
    /// missing or not currently in `from`.
    async fn set_status(
        &self,
        id: PrincipalId,
        from: AccountStatus,
        to: AccountStatus,
    ) -> Result<Option<Credential>, StoreError>;

    /// Deletes the credential and frees its email. `false` when absent.
    async fn remove(&self, id: PrincipalId) -> Result<bool, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;
}

#[derive(Debug, Default)]
struct Tables {
    by_id: HashMap<PrincipalId, Credential>,
    by_email: HashMap<Email, PrincipalId>,
}

/// In-memory credential store.
///
/// A single write lock covers both the uniqueness check and the verification
/// consume, which is what makes them atomic.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    inner: RwLock<Tables>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn insert(&self, credential: Credential) -> Result<(), StoreError> {
        let mut t = self.inner.write().map_err(|_| StoreError::poisoned())?;
        if t.by_email.contains_key(&credential.email) {
            return Err(StoreError::Conflict("email already registered".to_string()));
        }
        t.by_email.insert(credential.email.clone(), credential.principal_id);
        t.by_id.insert(credential.principal_id, credential);
        Ok(())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Credential>, StoreError> {
        let t = self.inner.read().map_err(|_| StoreError::poisoned())?;
        Ok(t.by_email.get(email).and_then(|id| t.by_id.get(id)).cloned())
    }

    async fn find_by_id(&self, id: PrincipalId) -> Result<Option<Credential>, StoreError> {
        let t = self.inner.read().map_err(|_| StoreError::poisoned())?;
        Ok(t.by_id.get(&id).cloned())
    }

    async fn find_in_tenant(&self, tenant_id: TenantId, id: PrincipalId) -> Result<Option<Credential>, StoreError> {
        let t = self.inner.read().map_err(|_| StoreError::poisoned())?;
        Ok(t.by_id.get(&id).filter(|c| c.tenant_id == Some(tenant_id)).cloned())
    }

    async fn list_in_tenant(&self, tenant_id: TenantId) -> Result<Vec<Credential>, StoreError> {
        let t = self.inner.read().map_err(|_| StoreError::poisoned())?;
        let mut out: Vec<Credential> = t
            .by_id
            .values()
            .filter(|c| c.tenant_id == Some(tenant_id))
            .cloned()
            .collect();
        out.sort_by_key(|c| c.created_at);
        Ok(out)
    }

    async fn consume_verification(
        &self,
        token: &VerificationToken,
        now: DateTime<Utc>,
        ttl: Option<Duration>,
    ) -> Result<Option<Credential>, StoreError> {
        let mut t = self.inner.write().map_err(|_| StoreError::poisoned())?;

        let hit = t.by_id.values_mut().find(|c| {
            c.status == AccountStatus::Unverified
                && c
                    .pending_verification
                    .as_ref()
                    .is_some_and(|p| p.matches(token) && p.is_live(now, ttl))
        });

        Ok(hit.map(|c| {
            c.mark_verified();
            c.clone()
        }))
    }

    async fn set_status(
        &self,
        id: PrincipalId,
        from: AccountStatus,
        to: AccountStatus,
    ) -> Result<Option<Credential>, StoreError> {
        let mut t = self.inner.write().map_err(|_| StoreError::poisoned())?;
        Ok(t.by_id.get_mut(&id).filter(|c| c.status == from).map(|c| {
            c.status = to;
            if to == AccountStatus::Rejected {
                c.pending_verification = None;
            }
            c.clone()
        }))
    }

    async fn remove(&self, id: PrincipalId) -> Result<bool, StoreError> {
        let mut t = self.inner.write().map_err(|_| StoreError::poisoned())?;
        match t.by_id.remove(&id) {
            Some(c) => {
                t.by_email.remove(&c.email);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let t = self.inner.read().map_err(|_| StoreError::poisoned())?;
        Ok(t.by_id.len())
    }
}
