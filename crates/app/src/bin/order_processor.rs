//! Fulfillment pipeline service.
//!
//! Consumes order events from the intake topic under a durable subscriber
//! name, checks and deducts inventory, and routes each order to the ship
//! or reconcile topic. Runs until killed; restarts resume from the last
//! committed position.

use std::sync::mpsc;

use anyhow::Context;
use sqlx::PgPool;

use orderflow_events::TopicClient;
use orderflow_infra::{AppConfig, PostgresInventoryStore, RedisTopicClient};
use orderflow_pipeline::{FulfillmentPipeline, PipelineTopics};

fn main() -> anyhow::Result<()> {
    orderflow_observability::init();

    let config = AppConfig::from_env();

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    let _guard = runtime.enter();

    let pool = runtime
        .block_on(PgPool::connect(&config.database_url))
        .context("failed to connect to postgres")?;

    let client = RedisTopicClient::new(&config.redis_url)?;
    let store = PostgresInventoryStore::new(pool);
    let topics = PipelineTopics {
        ship: config.ship_topic.clone(),
        reconcile: config.reconcile_topic.clone(),
    };

    let pipeline = FulfillmentPipeline::new(
        client.clone(),
        store,
        topics,
        config.consumer_timeout(),
        config.max_batch_size,
    );

    let mut session = client
        .durable_subscribe(&config.topic_name, &config.subscriber_name)
        .context("failed to open durable subscription")?;

    // Dropping the sender stops the loop; hold it for the process lifetime.
    let (_shutdown_tx, shutdown_rx) = mpsc::channel();

    tracing::info!(
        topic = %config.topic_name,
        subscriber = %config.subscriber_name,
        "order processor starting"
    );

    pipeline.run(&mut session, &shutdown_rx);

    Ok(())
}
