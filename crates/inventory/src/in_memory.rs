//! In-memory inventory store for tests/dev.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::record::InventoryRecord;
use crate::store::{InventoryStore, StoreError};

/// Mutex-guarded map of inventory rows.
///
/// The conditional decrement in [`deduct`](InventoryStore::deduct) happens
/// under the lock, giving the same atomicity a conditional `UPDATE` gives
/// the persistent store.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    rows: Mutex<HashMap<u32, InventoryRecord>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a row.
    pub fn upsert(&self, record: InventoryRecord) {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        rows.insert(record.product_id, record);
    }
}

impl InventoryStore for InMemoryInventoryStore {
    fn get_inventory(&self, product_id: u32) -> Result<Option<InventoryRecord>, StoreError> {
        let rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        Ok(rows.get(&product_id).cloned())
    }

    fn deduct(&self, product_id: u32, units: u32) -> Result<u64, StoreError> {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        match rows.get_mut(&product_id) {
            Some(row) if row.items_in_stock >= i64::from(units) => {
                row.items_in_stock -= i64::from(units);
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}
