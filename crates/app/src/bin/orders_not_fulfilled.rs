//! Reconciliation-topic watcher.
//!
//! Durably consumes the reconcile topic under its own subscriber name and
//! surfaces every unfulfillable order as a warning, committing once per
//! non-empty batch. Kept separate from the pipeline so operators can run
//! it only when investigating.

use anyhow::Context;

use orderflow_app::watch::drain_batch;
use orderflow_events::TopicClient;
use orderflow_infra::{AppConfig, RedisTopicClient};

const SUBSCRIBER_NAME: &str = "orders-not-fulfilled";

fn main() -> anyhow::Result<()> {
    orderflow_observability::init();

    let config = AppConfig::from_env();
    let client = RedisTopicClient::new(&config.redis_url)?;

    let mut session = client
        .durable_subscribe(&config.reconcile_topic, SUBSCRIBER_NAME)
        .context("failed to open durable subscription")?;

    tracing::info!(topic = %config.reconcile_topic, "watching for unfulfilled orders");

    let error_backoff = config.consumer_timeout().saturating_mul(10);

    loop {
        let drained = drain_batch(
            &mut session,
            config.consumer_timeout(),
            config.max_batch_size,
            |message| {
                tracing::warn!(
                    ordering_key = %message.ordering_key,
                    payload = %message.payload,
                    "order not fulfilled"
                );
            },
        );

        if let Err(err) = drained {
            tracing::error!(error = %err, "transport poll failed, backing off");
            std::thread::sleep(error_backoff);
        }
    }
}
