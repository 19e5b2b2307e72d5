use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use apexhms_core::{Entity, RecordId, TenantId, TenantOwned};

use super::StoreError;

/// Tenant-isolated key/value store for business records.
///
/// Every operation takes the owning tenant; a key that exists under another
/// tenant is indistinguishable from an absent key.
#[async_trait]
pub trait TenantScopedStore<K, V>: Send + Sync
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    async fn get(&self, tenant_id: TenantId, key: &K) -> Result<Option<V>, StoreError>;

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<V>, StoreError>;

    async fn insert(&self, tenant_id: TenantId, key: K, value: V) -> Result<(), StoreError>;

    /// Inserts unless an existing record of the same tenant conflicts, as one
    /// atomic step. Returns `StoreError::Conflict` otherwise.
    async fn insert_unless(
        &self,
        tenant_id: TenantId,
        key: K,
        value: V,
        conflicts: &(dyn for<'a> Fn(&'a V) -> bool + Send + Sync),
    ) -> Result<(), StoreError>;

    /// Applies `f` to the record and returns the updated copy, as one atomic
    /// step. An error from `f` leaves the stored record untouched.
    /// `None` when the key is not present under `tenant_id`.
    async fn update(
        &self,
        tenant_id: TenantId,
        key: &K,
        f: &(dyn for<'a> Fn(&'a mut V) -> Result<(), StoreError> + Send + Sync),
    ) -> Result<Option<V>, StoreError>;

    async fn remove(&self, tenant_id: TenantId, key: &K) -> Result<Option<V>, StoreError>;

    async fn count(&self, tenant_id: TenantId) -> Result<usize, StoreError>;

    /// Platform-wide count, for super-admin statistics.
    async fn count_all(&self) -> Result<usize, StoreError>;
}

/// Stores a record under the hospital and id it carries, so the key can
/// never disagree with the record.
pub async fn insert_owned<V>(store: &dyn TenantScopedStore<RecordId, V>, record: V) -> Result<(), StoreError>
where
    V: TenantOwned + Entity<Id = RecordId> + Send + Sync + 'static,
{
    store.insert(record.owner(), *record.id(), record).await
}

#[async_trait]
impl<K, V, S> TenantScopedStore<K, V> for Arc<S>
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
    S: TenantScopedStore<K, V> + ?Sized,
{
    async fn get(&self, tenant_id: TenantId, key: &K) -> Result<Option<V>, StoreError> {
        (**self).get(tenant_id, key).await
    }

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<V>, StoreError> {
        (**self).list(tenant_id).await
    }

    async fn insert(&self, tenant_id: TenantId, key: K, value: V) -> Result<(), StoreError> {
        (**self).insert(tenant_id, key, value).await
    }

    async fn insert_unless(
        &self,
        tenant_id: TenantId,
        key: K,
        value: V,
        conflicts: &(dyn for<'a> Fn(&'a V) -> bool + Send + Sync),
    ) -> Result<(), StoreError> {
        (**self).insert_unless(tenant_id, key, value, conflicts).await
    }

    async fn update(
        &self,
        tenant_id: TenantId,
        key: &K,
        f: &(dyn for<'a> Fn(&'a mut V) -> Result<(), StoreError> + Send + Sync),
    ) -> Result<Option<V>, StoreError> {
        (**self).update(tenant_id, key, f).await
    }

    async fn remove(&self, tenant_id: TenantId, key: &K) -> Result<Option<V>, StoreError> {
        (**self).remove(tenant_id, key).await
    }

    async fn count(&self, tenant_id: TenantId) -> Result<usize, StoreError> {
        (**self).count(tenant_id).await
    }

    async fn count_all(&self) -> Result<usize, StoreError> {
        (**self).count_all().await
    }
}

/// In-memory tenant-isolated store.
///
/// Keys are stored as `(TenantId, K)`, so the tenant is part of identity and
/// not a filter applied after the fact.
#[derive(Debug)]
pub struct InMemoryTenantStore<K, V> {
    inner: RwLock<HashMap<(TenantId, K), V>>,
}

impl<K, V> InMemoryTenantStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryTenantStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<K, V> TenantScopedStore<K, V> for InMemoryTenantStore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, tenant_id: TenantId, key: &K) -> Result<Option<V>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::poisoned())?;
        Ok(map.get(&(tenant_id, key.clone())).cloned())
    }

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<V>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::poisoned())?;
        Ok(map
            .iter()
            .filter_map(|((t, _k), v)| if *t == tenant_id { Some(v.clone()) } else { None })
            .collect())
    }

    async fn insert(&self, tenant_id: TenantId, key: K, value: V) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned())?;
        map.insert((tenant_id, key), value);
        Ok(())
    }

    async fn insert_unless(
        &self,
        tenant_id: TenantId,
        key: K,
        value: V,
        conflicts: &(dyn for<'a> Fn(&'a V) -> bool + Send + Sync),
    ) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned())?;
        let clash = map
            .iter()
            .any(|((t, _k), existing)| *t == tenant_id && conflicts(existing));
        if clash {
            return Err(StoreError::Conflict("conflicting record exists".to_string()));
        }
        map.insert((tenant_id, key), value);
        Ok(())
    }

    async fn update(
        &self,
        tenant_id: TenantId,
        key: &K,
        f: &(dyn for<'a> Fn(&'a mut V) -> Result<(), StoreError> + Send + Sync),
    ) -> Result<Option<V>, StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned())?;
        let Some(slot) = map.get_mut(&(tenant_id, key.clone())) else {
            return Ok(None);
        };
        let mut next = slot.clone();
        f(&mut next)?;
        *slot = next.clone();
        Ok(Some(next))
    }

    async fn remove(&self, tenant_id: TenantId, key: &K) -> Result<Option<V>, StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned())?;
        Ok(map.remove(&(tenant_id, key.clone())))
    }

    async fn count(&self, tenant_id: TenantId) -> Result<usize, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::poisoned())?;
        Ok(map.keys().filter(|(t, _k)| *t == tenant_id).count())
    }

    async fn count_all(&self) -> Result<usize, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::poisoned())?;
        Ok(map.len())
    }
}
