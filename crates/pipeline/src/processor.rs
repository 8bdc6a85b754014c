//! The consume-process-produce loop.
//!
//! Each cycle drains one poll batch from the durable subscription, handles
//! every message, and commits the batch once. Commit granularity is the
//! whole batch: a decode or processing failure for one record is logged and
//! swallowed, never escalated, so it cannot block the commit of the records
//! that did succeed. A dropped record is an explicit accepted loss; the
//! alternative would be to poison the subscription with a message that will
//! never decode.
//!
//! The loop itself never exits on a per-message failure; transport errors
//! on poll are logged and retried after a backoff. Crash-safety comes from
//! the durable cursor, not from in-memory state: termination at any point
//! before commit redelivers the batch.

use std::sync::mpsc;
use std::time::Duration;

use tracing::{error, info, warn};

use orderflow_events::bus::{Message, SubscriberSession, TopicClient, TransportError};
use orderflow_events::model::OrderEvent;
use orderflow_inventory::store::InventoryStore;

use crate::outcome::{Destination, FulfillmentOutcome};

/// Downstream topic names the pipeline routes to.
#[derive(Debug, Clone)]
pub struct PipelineTopics {
    pub ship: String,
    pub reconcile: String,
}

/// A single-threaded, blocking fulfillment consumer.
///
/// Horizontal scale comes from running more instances against the same
/// durable subscriber name; one instance has no internal concurrency.
pub struct FulfillmentPipeline<C, S> {
    client: C,
    store: S,
    topics: PipelineTopics,
    poll_timeout: Duration,
    max_batch_size: usize,
}

impl<C, S> FulfillmentPipeline<C, S>
where
    C: TopicClient,
    S: InventoryStore,
{
    pub fn new(
        client: C,
        store: S,
        topics: PipelineTopics,
        poll_timeout: Duration,
        max_batch_size: usize,
    ) -> Self {
        Self {
            client,
            store,
            topics,
            poll_timeout,
            max_batch_size: max_batch_size.max(1),
        }
    }

    /// Decide what happens to one decoded order.
    ///
    /// Check-then-act: the lookup distinguishes a missing row from a short
    /// one, but the deduction itself is the store's atomic conditional
    /// decrement; losing the race to another consumer after a sufficient
    /// read shows up as zero affected rows and is an insufficiency, not a
    /// ship.
    pub fn decide(&self, order: &OrderEvent) -> FulfillmentOutcome {
        let record = match self.store.get_inventory(order.product_id) {
            Ok(Some(record)) => record,
            Ok(None) => {
                warn!(product_id = order.product_id, "product not found in inventory");
                return FulfillmentOutcome::ProductNotFound;
            }
            Err(err) => {
                error!(product_id = order.product_id, error = %err, "inventory lookup failed");
                return FulfillmentOutcome::StorageError;
            }
        };

        if record.items_in_stock < i64::from(order.number_of_units) {
            warn!(
                product_id = order.product_id,
                items_in_stock = record.items_in_stock,
                number_of_units = order.number_of_units,
                "insufficient stock"
            );
            return FulfillmentOutcome::InsufficientStock;
        }

        match self.store.deduct(order.product_id, order.number_of_units) {
            Ok(0) => {
                // Another consumer drained the stock between our read and
                // the conditional update.
                warn!(
                    product_id = order.product_id,
                    number_of_units = order.number_of_units,
                    "deduction lost the race, stock no longer sufficient"
                );
                FulfillmentOutcome::InsufficientStock
            }
            Ok(_) => {
                let total_order_amount = record
                    .unit_price
                    .saturating_mul(u64::from(order.number_of_units));
                info!(
                    product_id = order.product_id,
                    number_of_units = order.number_of_units,
                    total_order_amount,
                    "deducted stock, order ready to ship"
                );
                FulfillmentOutcome::Shipped { total_order_amount }
            }
            Err(err) => {
                error!(product_id = order.product_id, error = %err, "inventory update failed");
                FulfillmentOutcome::StorageError
            }
        }
    }

    /// Decode, decide and republish one message.
    ///
    /// Errors are returned so the batch loop can log them; they never abort
    /// the batch.
    fn process_message(&self, message: &Message) -> Result<(), serde_json::Error> {
        let order: OrderEvent = serde_json::from_str(&message.payload)?;
        info!(
            order_id = %order.order_id,
            product_id = order.product_id,
            number_of_units = order.number_of_units,
            "processing order"
        );

        let outcome = self.decide(&order);
        let payload = outcome.routed_payload(&message.payload)?;
        let topic = match outcome.destination() {
            Destination::Ship => &self.topics.ship,
            Destination::Reconcile => &self.topics.reconcile,
        };

        // Downstream publish failures must not block continued polling; the
        // order stays observable through the logs.
        if let Err(err) = self
            .client
            .publish(topic, &payload, &order.ordering_key())
        {
            error!(topic = %topic, order_id = %order.order_id, error = %err, "routing publish failed");
        }
        Ok(())
    }

    /// Drain and process one poll batch, committing once at the end.
    ///
    /// Returns the number of messages received. The first poll blocks up to
    /// the configured timeout; the rest of the batch is drained without
    /// blocking, capped at `max_batch_size`.
    pub fn process_next_batch(
        &self,
        session: &mut C::Session,
    ) -> Result<usize, TransportError> {
        let mut received = 0usize;

        while received < self.max_batch_size {
            let timeout = if received == 0 {
                self.poll_timeout
            } else {
                Duration::ZERO
            };
            let message = match session.poll(timeout) {
                Ok(Some(message)) => message,
                Ok(None) => break,
                Err(err) if received == 0 => return Err(err),
                Err(err) => {
                    // Keep what we already received; the batch still
                    // commits below.
                    error!(error = %err, "poll failed mid-batch");
                    break;
                }
            };
            received += 1;

            if let Err(err) = self.process_message(&message) {
                error!(payload = %message.payload, error = %err, "failed to process record");
            }
        }

        if received > 0 {
            if let Err(err) = session.commit() {
                // The cursor did not advance; the batch redelivers, which
                // at-least-once consumers must tolerate anyway.
                warn!(error = %err, "batch commit failed, messages will redeliver");
            }
        }
        Ok(received)
    }

    /// Run the consume-process-produce loop until shutdown is requested.
    ///
    /// Unrecoverable poll errors are logged and retried after a backoff;
    /// the process never exits on a single message's failure.
    pub fn run(&self, session: &mut C::Session, shutdown: &mpsc::Receiver<()>) {
        let error_backoff = self.poll_timeout.saturating_mul(10);

        loop {
            match shutdown.try_recv() {
                Ok(()) => break,
                Err(mpsc::TryRecvError::Disconnected) => break,
                Err(mpsc::TryRecvError::Empty) => {}
            }

            if let Err(err) = self.process_next_batch(session) {
                error!(error = %err, "transport poll failed, backing off");
                std::thread::sleep(error_backoff);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use orderflow_events::in_memory::InMemoryTopicBroker;
    use orderflow_events::model::OrderStatus;
    use orderflow_inventory::in_memory::InMemoryInventoryStore;
    use orderflow_inventory::record::InventoryRecord;
    use orderflow_inventory::store::StoreError;

    fn topics() -> PipelineTopics {
        PipelineTopics {
            ship: "orders-to-ship".to_string(),
            reconcile: "orders-to-reconcile".to_string(),
        }
    }

    fn pipeline(
        store: InMemoryInventoryStore,
    ) -> FulfillmentPipeline<InMemoryTopicBroker, InMemoryInventoryStore> {
        FulfillmentPipeline::new(
            InMemoryTopicBroker::new(),
            store,
            topics(),
            Duration::from_millis(10),
            50,
        )
    }

    fn order(product_id: u32, units: u32) -> OrderEvent {
        OrderEvent::new(7, OrderStatus::Pending, product_id, units)
    }

    #[test]
    fn decide_ships_and_prices_when_stock_sufficient() {
        let store = InMemoryInventoryStore::new();
        store.upsert(InventoryRecord::new(1, "widget", "a widget", 5, 199));
        let pipeline = pipeline(store);

        let outcome = pipeline.decide(&order(1, 5));
        assert_eq!(
            outcome,
            FulfillmentOutcome::Shipped {
                total_order_amount: 995
            }
        );
    }

    #[test]
    fn decide_rejects_when_stock_insufficient() {
        let store = InMemoryInventoryStore::new();
        store.upsert(InventoryRecord::new(1, "widget", "a widget", 3, 199));
        let pipeline = pipeline(store);

        assert_eq!(
            pipeline.decide(&order(1, 5)),
            FulfillmentOutcome::InsufficientStock
        );
    }

    #[test]
    fn decide_reports_not_found_for_unknown_product() {
        let pipeline = pipeline(InMemoryInventoryStore::new());
        assert_eq!(
            pipeline.decide(&order(404, 1)),
            FulfillmentOutcome::ProductNotFound
        );
    }

    /// Store whose read promises stock but whose conditional update always
    /// reports the row gone, i.e. the lost-race shape.
    struct RacyStore;

    impl InventoryStore for RacyStore {
        fn get_inventory(
            &self,
            product_id: u32,
        ) -> Result<Option<InventoryRecord>, StoreError> {
            Ok(Some(InventoryRecord::new(product_id, "w", "w", 100, 50)))
        }

        fn deduct(&self, _product_id: u32, _units: u32) -> Result<u64, StoreError> {
            Ok(0)
        }
    }

    #[test]
    fn losing_the_deduction_race_is_an_insufficiency() {
        let pipeline = FulfillmentPipeline::new(
            InMemoryTopicBroker::new(),
            RacyStore,
            topics(),
            Duration::from_millis(10),
            50,
        );
        assert_eq!(
            pipeline.decide(&order(1, 2)),
            FulfillmentOutcome::InsufficientStock
        );
    }

    struct BrokenStore;

    impl InventoryStore for BrokenStore {
        fn get_inventory(
            &self,
            _product_id: u32,
        ) -> Result<Option<InventoryRecord>, StoreError> {
            Err(StoreError::Query("connection reset".to_string()))
        }

        fn deduct(&self, _product_id: u32, _units: u32) -> Result<u64, StoreError> {
            Err(StoreError::Query("connection reset".to_string()))
        }
    }

    #[test]
    fn storage_failure_becomes_a_reconcilable_outcome() {
        let pipeline = FulfillmentPipeline::new(
            InMemoryTopicBroker::new(),
            BrokenStore,
            topics(),
            Duration::from_millis(10),
            50,
        );
        let outcome = pipeline.decide(&order(1, 2));
        assert_eq!(outcome, FulfillmentOutcome::StorageError);
        assert_eq!(outcome.destination(), Destination::Reconcile);
    }
}
