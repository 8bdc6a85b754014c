//! Capped drain-handle-commit loop shared by the watcher binaries.

use std::time::Duration;

use orderflow_events::bus::{Message, SubscriberSession, TransportError};

/// Drain up to `max_batch_size` messages, handing each to `on_message`,
/// then commit once if anything arrived.
///
/// The first poll blocks up to `timeout`; the rest of the batch drains
/// without blocking. The cap bounds the time between commits, so a
/// sustained feed cannot starve the durable cursor.
pub fn drain_batch<S, F>(
    session: &mut S,
    timeout: Duration,
    max_batch_size: usize,
    mut on_message: F,
) -> Result<usize, TransportError>
where
    S: SubscriberSession,
    F: FnMut(&Message),
{
    let mut received = 0usize;

    while received < max_batch_size.max(1) {
        let wait = if received == 0 { timeout } else { Duration::ZERO };
        match session.poll(wait)? {
            Some(message) => {
                on_message(&message);
                received += 1;
            }
            None => break,
        }
    }

    if received > 0 {
        session.commit()?;
    }
    Ok(received)
}

#[cfg(test)]
mod tests {
    use super::*;

    use orderflow_events::bus::TopicClient;
    use orderflow_events::in_memory::InMemoryTopicBroker;

    #[test]
    fn drain_is_capped_and_commits_only_what_it_took() {
        let broker = InMemoryTopicBroker::new();
        for i in 0..5 {
            broker
                .publish("reconcile", &format!("payload-{i}"), "k")
                .unwrap();
        }

        let mut session = broker.durable_subscribe("reconcile", "watch").unwrap();
        let mut seen = Vec::new();
        let received = drain_batch(&mut session, Duration::from_millis(10), 2, |m| {
            seen.push(m.payload.clone());
        })
        .unwrap();

        assert_eq!(received, 2);
        assert_eq!(seen, vec!["payload-0", "payload-1"]);
        drop(session);

        // The commit covers exactly the capped batch.
        let mut resumed = broker.durable_subscribe("reconcile", "watch").unwrap();
        let next = resumed.poll(Duration::from_millis(10)).unwrap().unwrap();
        assert_eq!(next.payload, "payload-2");
    }

    #[test]
    fn empty_drain_receives_nothing() {
        let broker = InMemoryTopicBroker::new();
        let mut session = broker.durable_subscribe("reconcile", "watch").unwrap();

        let received =
            drain_batch(&mut session, Duration::from_millis(5), 50, |_| {}).unwrap();
        assert_eq!(received, 0);
    }
}
