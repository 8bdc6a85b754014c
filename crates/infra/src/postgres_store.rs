//! Postgres-backed inventory store.
//!
//! The deduction is a **conditional** `UPDATE` (`WHERE items_in_stock >=
//! units`): sufficiency is checked and the decrement applied in one atomic
//! statement, so concurrent pipeline instances can never drive a row
//! negative: a loser of the race simply sees zero affected rows.
//!
//! Like the rest of the pipeline this store is called from synchronous
//! code; queries run through `tokio::runtime::Handle::block_on`, which
//! requires an ambient tokio runtime (the binaries enter one at startup).

use std::sync::Arc;

use sqlx::{PgPool, Row};

use orderflow_inventory::record::InventoryRecord;
use orderflow_inventory::store::{InventoryStore, StoreError};

pub struct PostgresInventoryStore {
    pool: Arc<PgPool>,
}

impl PostgresInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    fn runtime_handle() -> Result<tokio::runtime::Handle, StoreError> {
        tokio::runtime::Handle::try_current().map_err(|_| {
            StoreError::Connection(
                "PostgresInventoryStore requires an ambient tokio runtime".to_string(),
            )
        })
    }
}

impl InventoryStore for PostgresInventoryStore {
    fn get_inventory(&self, product_id: u32) -> Result<Option<InventoryRecord>, StoreError> {
        let handle = Self::runtime_handle()?;
        let pool = Arc::clone(&self.pool);

        handle.block_on(async move {
            let row = sqlx::query(
                r#"
                SELECT
                    product_name,
                    description,
                    items_in_stock,
                    unit_price
                FROM product_inventory
                WHERE product_id = $1
                "#,
            )
            .bind(product_id as i64)
            .fetch_optional(&*pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

            let Some(row) = row else {
                return Ok(None);
            };

            let product_name: String = row
                .try_get("product_name")
                .map_err(|e| StoreError::Query(e.to_string()))?;
            let description: String = row
                .try_get("description")
                .map_err(|e| StoreError::Query(e.to_string()))?;
            let items_in_stock: i64 = row
                .try_get("items_in_stock")
                .map_err(|e| StoreError::Query(e.to_string()))?;
            let unit_price: i64 = row
                .try_get("unit_price")
                .map_err(|e| StoreError::Query(e.to_string()))?;

            Ok(Some(InventoryRecord::new(
                product_id,
                product_name,
                description,
                items_in_stock,
                unit_price.max(0) as u64,
            )))
        })
    }

    fn deduct(&self, product_id: u32, units: u32) -> Result<u64, StoreError> {
        let handle = Self::runtime_handle()?;
        let pool = Arc::clone(&self.pool);

        handle.block_on(async move {
            let result = sqlx::query(
                r#"
                UPDATE product_inventory
                SET items_in_stock = items_in_stock - $1
                WHERE product_id = $2
                  AND items_in_stock >= $1
                "#,
            )
            .bind(i64::from(units))
            .bind(product_id as i64)
            .execute(&*pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

            Ok(result.rows_affected())
        })
    }
}
