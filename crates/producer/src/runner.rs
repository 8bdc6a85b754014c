//! Timed claim-event producer loop.

use std::time::{Duration, Instant};

use tracing::{error, info};

use orderflow_events::bus::{TopicClient, TransportError};

use crate::generator::ClaimEventGenerator;

/// A single-threaded loop that publishes a batch of synthetic claim events
/// on a fixed cadence, forever.
///
/// A failed cycle is logged and followed by a longer backoff sleep (10× the
/// normal interval) before the next attempt; the loop never terminates on a
/// transient publish error.
pub struct ProducerLoop<C> {
    client: C,
    topic: String,
    number_of_claims: u32,
    entries_per_claim: u32,
    interval: Duration,
}

impl<C: TopicClient> ProducerLoop<C> {
    pub fn new(
        client: C,
        topic: impl Into<String>,
        number_of_claims: u32,
        entries_per_claim: u32,
        interval: Duration,
    ) -> Self {
        Self {
            client,
            topic: topic.into(),
            number_of_claims,
            entries_per_claim,
            interval,
        }
    }

    /// Generate and publish one batch; each event is keyed by its claim id
    /// so entries of one claim keep their publish order downstream.
    ///
    /// Returns the number of events published. Fails on the first publish
    /// or serialization error; the events already published stay published
    /// (at-least-once, consumers are idempotent).
    pub fn publish_batch(
        &self,
        generator: &mut ClaimEventGenerator,
    ) -> Result<usize, TransportError> {
        let events = generator.generate_claim_events(self.number_of_claims, self.entries_per_claim);

        for event in &events {
            let payload = serde_json::to_string(event)
                .map_err(|e| TransportError::Publish(e.to_string()))?;
            self.client
                .publish(&self.topic, &payload, &event.ordering_key())?;
        }

        Ok(events.len())
    }

    /// Run the producer loop forever.
    pub fn run(&self, generator: &mut ClaimEventGenerator) -> ! {
        let error_backoff = self.interval.saturating_mul(10);

        loop {
            let started = Instant::now();
            match self.publish_batch(generator) {
                Ok(published) => {
                    info!(
                        topic = %self.topic,
                        published,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "published claim event batch"
                    );
                    std::thread::sleep(self.interval);
                }
                Err(err) => {
                    error!(topic = %self.topic, error = %err, "producer cycle failed, backing off");
                    std::thread::sleep(error_backoff);
                }
            }
        }
    }
}
