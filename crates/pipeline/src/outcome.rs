//! Fulfillment outcome and routing decision.
//!
//! The result of processing one order is an explicit value, consumed by an
//! explicit routing step; "not found" and "insufficient stock" are ordinary
//! outcomes, not errors.

/// What happened to one order against the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FulfillmentOutcome {
    /// Stock was deducted; carries `unit_price * number_of_units` in the
    /// smallest currency unit.
    Shipped { total_order_amount: u64 },
    /// The product exists but holds fewer units than requested (or another
    /// consumer won the deduction race).
    InsufficientStock,
    /// No inventory row for the order's product id.
    ProductNotFound,
    /// The inventory lookup or update failed; routed like a miss so the
    /// order is reconciled out-of-band instead of silently dropped.
    StorageError,
}

/// Downstream topic class an order is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Ship,
    Reconcile,
}

impl FulfillmentOutcome {
    /// Only a successful deduction goes to the ship topic; everything else
    /// needs out-of-band reconciliation.
    pub fn destination(&self) -> Destination {
        match self {
            Self::Shipped { .. } => Destination::Ship,
            Self::InsufficientStock | Self::ProductNotFound | Self::StorageError => {
                Destination::Reconcile
            }
        }
    }

    /// Payload to republish for this outcome.
    ///
    /// Shipped orders carry the original JSON augmented with
    /// `totalOrderAmount`; every reconciliation route carries the original
    /// payload unchanged.
    pub fn routed_payload(&self, original: &str) -> Result<String, serde_json::Error> {
        match self {
            Self::Shipped { total_order_amount } => {
                let mut value: serde_json::Value = serde_json::from_str(original)?;
                value["totalOrderAmount"] = serde_json::json!(total_order_amount);
                serde_json::to_string(&value)
            }
            _ => Ok(original.to_string()),
        }
    }
}
