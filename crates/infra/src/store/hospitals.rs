use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use apexhms_core::{Hospital, HospitalStatus, TenantId};

use super::StoreError;

#[async_trait]
pub trait HospitalStore: Send + Sync {
    /// Fails with `StoreError::Conflict` when the email or license number is
    /// already registered.
    async fn insert(&self, hospital: Hospital) -> Result<(), StoreError>;

    async fn get(&self, id: TenantId) -> Result<Option<Hospital>, StoreError>;

    /// Newest first.
    async fn list(&self, status: Option<HospitalStatus>) -> Result<Vec<Hospital>, StoreError>;

    /// Compare-and-set on the approval status. The change itself goes through
    /// `Hospital::change_status`, so an illegal transition is a `Conflict`.
    /// `None` when the hospital is missing or not in `from`.
    async fn set_status(
        &self,
        id: TenantId,
        from: HospitalStatus,
        to: HospitalStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Hospital>, StoreError>;

    /// Persists the editable profile fields of an already validated hospital.
    async fn update_profile(&self, hospital: &Hospital) -> Result<bool, StoreError>;

    async fn count_by_status(&self, status: Option<HospitalStatus>) -> Result<usize, StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemoryHospitalStore {
    inner: RwLock<HashMap<TenantId, Hospital>>,
}

impl InMemoryHospitalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HospitalStore for InMemoryHospitalStore {
    async fn insert(&self, hospital: Hospital) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned())?;
        if map.values().any(|h| h.email == hospital.email) {
            return Err(StoreError::Conflict("hospital email already registered".to_string()));
        }
        if map.values().any(|h| h.license_number == hospital.license_number) {
            return Err(StoreError::Conflict("license number already registered".to_string()));
        }
        map.insert(hospital.id, hospital);
        Ok(())
    }

    async fn get(&self, id: TenantId) -> Result<Option<Hospital>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn list(&self, status: Option<HospitalStatus>) -> Result<Vec<Hospital>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::poisoned())?;
        let mut out: Vec<Hospital> = map
            .values()
            .filter(|h| status.is_none_or(|s| h.status == s))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn set_status(
        &self,
        id: TenantId,
        from: HospitalStatus,
        to: HospitalStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Hospital>, StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned())?;
        let Some(h) = map.get_mut(&id).filter(|h| h.status == from) else {
            return Ok(None);
        };
        let mut next = h.clone();
        next.change_status(to, now).map_err(|e| StoreError::Conflict(e.to_string()))?;
        *h = next.clone();
        Ok(Some(next))
    }

    async fn update_profile(&self, hospital: &Hospital) -> Result<bool, StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned())?;
        Ok(match map.get_mut(&hospital.id) {
            Some(h) => {
                h.name = hospital.name.clone();
                h.address = hospital.address.clone();
                h.phone = hospital.phone.clone();
                true
            }
            None => false,
        })
    }

    async fn count_by_status(&self, status: Option<HospitalStatus>) -> Result<usize, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::poisoned())?;
        Ok(map.values().filter(|h| status.is_none_or(|s| h.status == s)).count())
    }
}
