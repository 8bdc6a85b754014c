use serde::{Deserialize, Serialize};

/// One row of the shared product inventory.
///
/// `items_in_stock` must remain ≥ 0 under any sequence of deductions, even
/// with multiple pipeline instances deducting concurrently; the store's
/// [`deduct`](crate::store::InventoryStore::deduct) enforces this at the
/// storage layer. `unit_price` is read-only from the pipeline's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub product_id: u32,
    pub product_name: String,
    pub description: String,
    pub items_in_stock: i64,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: u64,
}

impl InventoryRecord {
    pub fn new(
        product_id: u32,
        product_name: impl Into<String>,
        description: impl Into<String>,
        items_in_stock: i64,
        unit_price: u64,
    ) -> Self {
        Self {
            product_id,
            product_name: product_name.into(),
            description: description.into(),
            items_in_stock,
            unit_price,
        }
    }
}
