//! Random event generation for demo/test traffic.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use orderflow_events::model::{
    ClaimEvent, ClaimStatus, ClaimType, EntryStatus, OrderEvent, OrderStatus,
};

const CLAIM_TYPES: [ClaimType; 5] = [
    ClaimType::Life,
    ClaimType::Home,
    ClaimType::Auto,
    ClaimType::Travel,
    ClaimType::Health,
];

const CLAIM_STATUSES: [ClaimStatus; 5] = [
    ClaimStatus::Pending,
    ClaimStatus::InReview,
    ClaimStatus::Approved,
    ClaimStatus::Rejected,
    ClaimStatus::Cancelled,
];

const ENTRY_STATUSES: [EntryStatus; 4] = [
    EntryStatus::Pending,
    EntryStatus::Processed,
    EntryStatus::Failed,
    EntryStatus::Cancelled,
];

const ORDER_STATUSES: [OrderStatus; 2] = [OrderStatus::Pending, OrderStatus::Processing];

/// Claim id range.
const MIN_CLAIM_ID: u32 = 1000;
const MAX_CLAIM_ID: u32 = 9999;

/// Amount range, smallest currency unit.
const MIN_AMOUNT: u64 = 10_000;
const MAX_AMOUNT: u64 = 1_010_000;

/// Generator for synthetic claim and order events.
pub struct ClaimEventGenerator {
    rng: StdRng,
}

impl Default for ClaimEventGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimEventGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic generator for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate `number_of_claims * entries_per_claim` events.
    ///
    /// Claim ids form a contiguous block but are shuffled before entry
    /// expansion, so consumers see entities arrive out of numeric order
    /// and per-key ordering gets exercised downstream. Type, status and
    /// amount are fixed per claim across its entries; entry numbers run
    /// 1..=entries_per_claim.
    pub fn generate_claim_events(
        &mut self,
        number_of_claims: u32,
        entries_per_claim: u32,
    ) -> Vec<ClaimEvent> {
        let claim_ids = self.contiguous_shuffled_claim_ids(number_of_claims);
        let mut events = Vec::with_capacity(batch_capacity(number_of_claims, entries_per_claim));

        for claim_id in claim_ids {
            let claim_type = *CLAIM_TYPES
                .choose(&mut self.rng)
                .unwrap_or(&ClaimType::Auto);
            let status = *CLAIM_STATUSES
                .choose(&mut self.rng)
                .unwrap_or(&ClaimStatus::Pending);
            let amount = self.rng.gen_range(MIN_AMOUNT..=MAX_AMOUNT);

            for entry_number in 1..=entries_per_claim {
                let entry_status = *ENTRY_STATUSES
                    .choose(&mut self.rng)
                    .unwrap_or(&EntryStatus::Pending);
                events.push(ClaimEvent::new(
                    claim_id,
                    entry_number,
                    claim_type,
                    status,
                    entry_status,
                    amount,
                ));
            }
        }

        events
    }

    /// One random order: customer and product ids 1..=100, 1..=10 units.
    pub fn generate_order(&mut self) -> OrderEvent {
        let customer_id = self.rng.gen_range(1..=100);
        let status = *ORDER_STATUSES
            .choose(&mut self.rng)
            .unwrap_or(&OrderStatus::Pending);
        let product_id = self.rng.gen_range(1..=100);
        let number_of_units = self.rng.gen_range(1..=10);
        OrderEvent::new(customer_id, status, product_id, number_of_units)
    }

    fn contiguous_shuffled_claim_ids(&mut self, count: u32) -> Vec<u32> {
        let span = MAX_CLAIM_ID - MIN_CLAIM_ID;
        let base = MIN_CLAIM_ID + self.rng.gen_range(0..=span.saturating_sub(count));
        let mut ids: Vec<u32> = (base..base + count).collect();
        ids.shuffle(&mut self.rng);
        ids
    }
}

/// Widen before multiplying; the batch dimensions come from the
/// environment and their u32 product can overflow.
fn batch_capacity(number_of_claims: u32, entries_per_claim: u32) -> usize {
    number_of_claims as usize * entries_per_claim as usize
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn batch_capacity_survives_dimensions_whose_product_overflows_u32() {
        assert_eq!(batch_capacity(70_000, 70_000), 4_900_000_000usize);
    }

    #[test]
    fn batch_has_claims_times_entries_events() {
        let mut generator = ClaimEventGenerator::with_seed(7);
        let events = generator.generate_claim_events(4, 2);
        assert_eq!(events.len(), 8);
    }

    #[test]
    fn claim_ids_form_a_contiguous_block() {
        let mut generator = ClaimEventGenerator::with_seed(7);
        let events = generator.generate_claim_events(4, 2);

        let ids: BTreeSet<u32> = events.iter().map(|e| e.claim_id).collect();
        assert_eq!(ids.len(), 4);
        let first = *ids.iter().next().unwrap();
        let last = *ids.iter().next_back().unwrap();
        assert_eq!(last - first, 3);
    }

    #[test]
    fn claim_order_is_shuffled() {
        // With enough claims, at least one seed must produce a non-sorted
        // id sequence; assert it for a fixed seed so the test is stable.
        let mut generator = ClaimEventGenerator::with_seed(7);
        let events = generator.generate_claim_events(16, 1);
        let ids: Vec<u32> = events.iter().map(|e| e.claim_id).collect();

        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_ne!(ids, sorted);
    }

    #[test]
    fn entries_of_one_claim_share_type_status_amount_and_key() {
        let mut generator = ClaimEventGenerator::with_seed(42);
        let events = generator.generate_claim_events(3, 4);

        for window in events.chunks(4) {
            let first = &window[0];
            for (offset, event) in window.iter().enumerate() {
                assert_eq!(event.claim_id, first.claim_id);
                assert_eq!(event.claim_type, first.claim_type);
                assert_eq!(event.status, first.status);
                assert_eq!(event.amount, first.amount);
                assert_eq!(event.entry_number, offset as u32 + 1);
                assert_eq!(event.ordering_key(), first.ordering_key());
            }
        }
    }

    #[test]
    fn generated_orders_stay_in_documented_ranges() {
        let mut generator = ClaimEventGenerator::with_seed(11);
        for _ in 0..100 {
            let order = generator.generate_order();
            assert!((1..=100).contains(&order.customer_id));
            assert!((1..=100).contains(&order.product_id));
            assert!((1..=10).contains(&order.number_of_units));
        }
    }
}
