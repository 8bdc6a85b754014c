//! Inventory records and the store contract the pipeline deducts against.

pub mod in_memory;
pub mod record;
pub mod store;

pub use in_memory::InMemoryInventoryStore;
pub use record::InventoryRecord;
pub use store::{InventoryStore, StoreError};
