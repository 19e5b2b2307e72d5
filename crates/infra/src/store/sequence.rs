use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use apexhms_core::TenantId;

use super::StoreError;

/// Per-tenant counter that only moves forward.
///
/// A value handed out is never handed out again for the same tenant, even
/// when the record that used it is later deleted.
#[async_trait]
pub trait TenantSequence: Send + Sync {
    /// Claims the next value, starting at 1.
    async fn next(&self, tenant_id: TenantId) -> Result<u64, StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemoryTenantSequence {
    counters: Mutex<HashMap<TenantId, u64>>,
}

impl InMemoryTenantSequence {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TenantSequence for InMemoryTenantSequence {
    async fn next(&self, tenant_id: TenantId) -> Result<u64, StoreError> {
        let mut counters = self.counters.lock().map_err(|_| StoreError::poisoned())?;
        let slot = counters.entry(tenant_id).or_insert(0);
        *slot += 1;
        Ok(*slot)
    }
}
