//! Claim-update feed consumer.
//!
//! Durably consumes the claim topic and logs every update, committing once
//! per non-empty batch. Entries of one claim arrive in publish order
//! because the producer keys them by claim id.

use anyhow::Context;

use orderflow_app::watch::drain_batch;
use orderflow_events::{ClaimEvent, TopicClient};
use orderflow_infra::{AppConfig, RedisTopicClient};

const SUBSCRIBER_NAME: &str = "claim-consumer";

fn main() -> anyhow::Result<()> {
    orderflow_observability::init();

    let config = AppConfig::from_env();
    let client = RedisTopicClient::new(&config.redis_url)?;

    let mut session = client
        .durable_subscribe(&config.claim_topic, SUBSCRIBER_NAME)
        .context("failed to open durable subscription")?;

    tracing::info!(topic = %config.claim_topic, "consuming claim updates");

    let error_backoff = config.consumer_timeout().saturating_mul(10);

    loop {
        let drained = drain_batch(
            &mut session,
            config.consumer_timeout(),
            config.max_batch_size,
            |message| match serde_json::from_str::<ClaimEvent>(&message.payload) {
                Ok(claim) => tracing::info!(
                    claim_id = claim.claim_id,
                    entry_number = claim.entry_number,
                    claim_type = ?claim.claim_type,
                    status = ?claim.status,
                    amount = claim.amount,
                    "claim update received"
                ),
                Err(err) => tracing::warn!(
                    payload = %message.payload,
                    error = %err,
                    "undecodable claim update"
                ),
            },
        );

        if let Err(err) = drained {
            tracing::error!(error = %err, "transport poll failed, backing off");
            std::thread::sleep(error_backoff);
        }
    }
}
