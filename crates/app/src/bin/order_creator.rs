//! Interactive order creator.
//!
//! Prompts on stdin: an empty line publishes one synthetic order, `N`
//! publishes N orders one at a time, `bulk-N` publishes N as one burst,
//! and `exit` terminates the process.

use std::io::{BufRead, Write};

use anyhow::Context;

use orderflow_events::TopicClient;
use orderflow_infra::{AppConfig, RedisTopicClient};
use orderflow_producer::{ClaimEventGenerator, UserCommand, parse_user_command};

fn main() -> anyhow::Result<()> {
    orderflow_observability::init();

    let config = AppConfig::from_env();
    let client = RedisTopicClient::new(&config.redis_url)?;
    let mut generator = ClaimEventGenerator::new();

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("orders to send ([N] | bulk-N | exit): ");
        std::io::stdout().flush().context("failed to flush prompt")?;

        let line = match lines.next() {
            Some(line) => line.context("failed to read stdin")?,
            None => break,
        };

        match parse_user_command(&line) {
            UserCommand::Exit => break,
            UserCommand::Send { count, bulk } => {
                if let Err(err) = send_orders(&client, &config, &mut generator, count, bulk) {
                    tracing::error!(error = %err, "failed to publish orders");
                }
            }
        }
    }

    Ok(())
}

fn send_orders(
    client: &RedisTopicClient,
    config: &AppConfig,
    generator: &mut ClaimEventGenerator,
    count: u32,
    bulk: bool,
) -> anyhow::Result<()> {
    for _ in 0..count {
        let order = generator.generate_order();
        let payload = serde_json::to_string(&order)?;
        client.publish(&config.topic_name, &payload, &order.ordering_key())?;

        if !bulk {
            tracing::info!(
                order_id = %order.order_id,
                customer_id = order.customer_id,
                "order published"
            );
        }
    }

    if bulk {
        tracing::info!(count, topic = %config.topic_name, "bulk publish complete");
    }

    Ok(())
}
