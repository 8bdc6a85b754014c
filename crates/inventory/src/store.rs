//! Inventory store contract.

use thiserror::Error;

use crate::record::InventoryRecord;

/// Storage-level failure (connection, query, row decode).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store connection error: {0}")]
    Connection(String),

    #[error("store query error: {0}")]
    Query(String),
}

/// Read-then-conditionally-write access to the shared inventory, keyed by
/// product id.
///
/// The store is the only resource mutated by more than one pipeline
/// instance at a time, so `deduct` carries the concurrency invariant of the
/// whole system: across all concurrent deduction attempts against one
/// product, the sum of successfully deducted units never exceeds the stock
/// observed at the start of the contention window, and `items_in_stock`
/// never goes negative.
pub trait InventoryStore: Send + Sync {
    /// Look up the inventory row for `product_id`; `Ok(None)` when no row
    /// exists.
    fn get_inventory(&self, product_id: u32) -> Result<Option<InventoryRecord>, StoreError>;

    /// Atomically decrement `items_in_stock` by `units`, but only when the
    /// row exists and holds at least `units`.
    ///
    /// Returns the number of rows affected: 1 on success, 0 when the row is
    /// missing or stock is insufficient. The insufficiency check is part of
    /// the same atomic update (conditional decrement), not a separate read;
    /// two racing callers can therefore never drive the stock negative.
    fn deduct(&self, product_id: u32, units: u32) -> Result<u64, StoreError>;
}

impl<S> InventoryStore for std::sync::Arc<S>
where
    S: InventoryStore + ?Sized,
{
    fn get_inventory(&self, product_id: u32) -> Result<Option<InventoryRecord>, StoreError> {
        (**self).get_inventory(product_id)
    }

    fn deduct(&self, product_id: u32, units: u32) -> Result<u64, StoreError> {
        (**self).deduct(product_id, units)
    }
}
