//! Timed claim-update feed.
//!
//! Publishes a fresh batch of synthetic claim events on a fixed interval,
//! forever. Publish failures are logged and retried after an extended
//! backoff; the process never exits on its own.

use orderflow_infra::{AppConfig, RedisTopicClient};
use orderflow_producer::{ClaimEventGenerator, ProducerLoop};

fn main() -> anyhow::Result<()> {
    orderflow_observability::init();

    let config = AppConfig::from_env();
    let client = RedisTopicClient::new(&config.redis_url)?;
    let mut generator = ClaimEventGenerator::new();

    tracing::info!(
        topic = %config.claim_topic,
        claims = config.number_of_claims,
        entries = config.entries_per_claim,
        "claim producer starting"
    );

    let producer = ProducerLoop::new(
        client,
        config.claim_topic.clone(),
        config.number_of_claims,
        config.entries_per_claim,
        config.production_interval(),
    );

    producer.run(&mut generator)
}
