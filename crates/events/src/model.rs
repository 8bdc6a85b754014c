//! Immutable domain event value types.
//!
//! Events are facts: identity and timestamps are assigned at construction
//! and never mutated afterwards. Equality and hashing are structural over
//! all fields. Wire field names are stable (camelCase) and consumers must
//! tolerate fields added post-hoc (see [`OrderEvent::total_order_amount`]).
//!
//! Monetary amounts are carried in the smallest currency unit (e.g. cents)
//! so that events stay `Eq`/`Hash` and serialize losslessly.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order lifecycle status at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Processing,
}

/// An order placed by a customer, as published on the intake topic.
///
/// `customerId` doubles as the ordering key: all orders of one customer are
/// observed in publish order by downstream consumers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEvent {
    /// Globally unique, assigned at construction, never reused.
    pub order_id: String,
    pub customer_id: u32,
    pub status: OrderStatus,
    pub product_id: u32,
    pub number_of_units: u32,
    /// Milliseconds since epoch, set at construction.
    pub created_at: i64,
    /// Injected by the fulfillment pipeline on the ship topic; absent on
    /// the intake topic. Smallest currency unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_order_amount: Option<u64>,
}

impl OrderEvent {
    pub fn new(
        customer_id: u32,
        status: OrderStatus,
        product_id: u32,
        number_of_units: u32,
    ) -> Self {
        Self {
            order_id: Uuid::now_v7().to_string(),
            customer_id,
            status,
            product_id,
            number_of_units,
            created_at: Utc::now().timestamp_millis(),
            total_order_amount: None,
        }
    }

    /// Ordering key used when publishing this event.
    pub fn ordering_key(&self) -> String {
        self.customer_id.to_string()
    }
}

/// Category of an insurance claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimType {
    Life,
    Home,
    Auto,
    Travel,
    Health,
}

/// Claim review status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimStatus {
    Pending,
    InReview,
    Approved,
    Rejected,
    Cancelled,
}

/// Processing status of a single claim entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    Pending,
    Processed,
    Failed,
    Cancelled,
}

/// One update entry for an insurance claim.
///
/// A claim groups several entries; `entryNumber` is the 1-based ordinal of
/// this entry within its claim. `claimId` doubles as the ordering key so
/// that entries of one claim arrive in publish order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimEvent {
    /// Globally unique, assigned at construction, never reused.
    pub event_id: String,
    pub claim_id: u32,
    /// 1-based entry ordinal within the claim.
    pub entry_number: u32,
    pub claim_type: ClaimType,
    pub status: ClaimStatus,
    pub entry_status: EntryStatus,
    /// Smallest currency unit.
    pub amount: u64,
    /// Milliseconds since epoch, set at construction.
    pub timestamp: i64,
}

impl ClaimEvent {
    pub fn new(
        claim_id: u32,
        entry_number: u32,
        claim_type: ClaimType,
        status: ClaimStatus,
        entry_status: EntryStatus,
        amount: u64,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7().to_string(),
            claim_id,
            entry_number,
            claim_type,
            status,
            entry_status,
            amount,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Ordering key used when publishing this event.
    pub fn ordering_key(&self) -> String {
        self.claim_id.to_string()
    }
}
