//! In-memory topic broker for tests/dev.
//!
//! - No IO / no async
//! - Durable named cursors with manual commit (at-least-once)
//! - Single append-only log per topic, so per-key ordering holds trivially
//!
//! Dropping a session without committing simulates a consumer crash: the
//! next `durable_subscribe` with the same name resumes from the last
//! committed cursor and redelivers everything in between.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::bus::{Message, SubscriberSession, TopicClient, TransportError};

#[derive(Default)]
struct BrokerState {
    /// Append-only message log per topic.
    topics: HashMap<String, Vec<Message>>,
    /// Committed cursor per (topic, subscriber name). Survives sessions.
    cursors: HashMap<(String, String), usize>,
}

struct Shared {
    state: Mutex<BrokerState>,
    arrivals: Condvar,
}

/// In-memory pub/sub broker with durable subscriptions.
#[derive(Clone)]
pub struct InMemoryTopicBroker {
    shared: Arc<Shared>,
}

impl Default for InMemoryTopicBroker {
    fn default() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(BrokerState::default()),
                arrivals: Condvar::new(),
            }),
        }
    }
}

impl InMemoryTopicBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages ever published to `topic`.
    pub fn topic_len(&self, topic: &str) -> usize {
        let state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
        state.topics.get(topic).map_or(0, Vec::len)
    }

    /// Snapshot of every message published to `topic`, in publish order.
    pub fn topic_messages(&self, topic: &str) -> Vec<Message> {
        let state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
        state.topics.get(topic).cloned().unwrap_or_default()
    }
}

impl TopicClient for InMemoryTopicBroker {
    type Session = InMemorySession;

    fn publish(
        &self,
        topic: &str,
        payload: &str,
        ordering_key: &str,
    ) -> Result<(), TransportError> {
        let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
        state.topics.entry(topic.to_string()).or_default().push(Message {
            payload: payload.to_string(),
            ordering_key: ordering_key.to_string(),
        });
        self.shared.arrivals.notify_all();
        Ok(())
    }

    fn durable_subscribe(
        &self,
        topic: &str,
        subscriber_name: &str,
    ) -> Result<Self::Session, TransportError> {
        let key = (topic.to_string(), subscriber_name.to_string());
        let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
        // First subscribe with this name creates the cursor at the start of
        // the log; later subscribes resume from the committed position.
        let committed = *state.cursors.entry(key.clone()).or_insert(0);
        Ok(InMemorySession {
            shared: Arc::clone(&self.shared),
            cursor_key: key,
            delivered: committed,
        })
    }
}

/// A consumer session over the in-memory broker.
pub struct InMemorySession {
    shared: Arc<Shared>,
    cursor_key: (String, String),
    /// Position after the last delivered message (session-local; only a
    /// commit persists it into the broker's cursor map).
    delivered: usize,
}

impl SubscriberSession for InMemorySession {
    fn poll(&mut self, timeout: Duration) -> Result<Option<Message>, TransportError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());

        loop {
            if let Some(log) = state.topics.get(&self.cursor_key.0) {
                if self.delivered < log.len() {
                    let message = log[self.delivered].clone();
                    self.delivered += 1;
                    return Ok(Some(message));
                }
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            let (guard, wait) = self
                .shared
                .arrivals
                .wait_timeout(state, remaining)
                .unwrap_or_else(|e| e.into_inner());
            state = guard;
            if wait.timed_out() {
                // One last check before reporting an empty poll; a message
                // may have raced the timeout.
                if let Some(log) = state.topics.get(&self.cursor_key.0) {
                    if self.delivered < log.len() {
                        continue;
                    }
                }
                return Ok(None);
            }
        }
    }

    fn commit(&mut self) -> Result<(), TransportError> {
        let mut state = self.shared.state.lock().unwrap_or_else(|e| e.into_inner());
        state.cursors.insert(self.cursor_key.clone(), self.delivered);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn publish_n(broker: &InMemoryTopicBroker, topic: &str, n: usize) {
        for i in 0..n {
            broker
                .publish(topic, &format!("payload-{i}"), "key-1")
                .unwrap();
        }
    }

    #[test]
    fn poll_returns_none_on_timeout() {
        let broker = InMemoryTopicBroker::new();
        let mut session = broker.durable_subscribe("orders", "sub").unwrap();

        let got = session.poll(Duration::from_millis(10)).unwrap();
        assert!(got.is_none());
    }

    #[test]
    fn messages_are_delivered_in_publish_order() {
        let broker = InMemoryTopicBroker::new();
        publish_n(&broker, "orders", 3);

        let mut session = broker.durable_subscribe("orders", "sub").unwrap();
        for i in 0..3 {
            let msg = session.poll(Duration::from_millis(10)).unwrap().unwrap();
            assert_eq!(msg.payload, format!("payload-{i}"));
            assert_eq!(msg.ordering_key, "key-1");
        }
        assert!(session.poll(Duration::from_millis(10)).unwrap().is_none());
    }

    #[test]
    fn uncommitted_messages_redeliver_on_resume() {
        let broker = InMemoryTopicBroker::new();
        publish_n(&broker, "orders", 2);

        let mut session = broker.durable_subscribe("orders", "sub").unwrap();
        assert!(session.poll(Duration::from_millis(10)).unwrap().is_some());
        assert!(session.poll(Duration::from_millis(10)).unwrap().is_some());
        drop(session); // crash before commit

        let mut resumed = broker.durable_subscribe("orders", "sub").unwrap();
        let msg = resumed.poll(Duration::from_millis(10)).unwrap().unwrap();
        assert_eq!(msg.payload, "payload-0");
    }

    #[test]
    fn commit_advances_past_everything_delivered_this_session() {
        let broker = InMemoryTopicBroker::new();
        publish_n(&broker, "orders", 3);

        let mut session = broker.durable_subscribe("orders", "sub").unwrap();
        assert!(session.poll(Duration::from_millis(10)).unwrap().is_some());
        assert!(session.poll(Duration::from_millis(10)).unwrap().is_some());
        session.commit().unwrap();
        drop(session);

        let mut resumed = broker.durable_subscribe("orders", "sub").unwrap();
        let msg = resumed.poll(Duration::from_millis(10)).unwrap().unwrap();
        assert_eq!(msg.payload, "payload-2");
    }

    #[test]
    fn subscribers_with_different_names_have_independent_cursors() {
        let broker = InMemoryTopicBroker::new();
        publish_n(&broker, "orders", 1);

        let mut a = broker.durable_subscribe("orders", "a").unwrap();
        assert!(a.poll(Duration::from_millis(10)).unwrap().is_some());
        a.commit().unwrap();

        let mut b = broker.durable_subscribe("orders", "b").unwrap();
        assert!(b.poll(Duration::from_millis(10)).unwrap().is_some());
    }

    #[test]
    fn same_key_messages_keep_send_order() {
        let broker = InMemoryTopicBroker::new();
        broker.publish("orders", "first", "7").unwrap();
        broker.publish("orders", "other", "9").unwrap();
        broker.publish("orders", "second", "7").unwrap();

        let mut session = broker.durable_subscribe("orders", "sub").unwrap();
        let mut for_key_7 = Vec::new();
        while let Some(msg) = session.poll(Duration::from_millis(10)).unwrap() {
            if msg.ordering_key == "7" {
                for_key_7.push(msg.payload);
            }
        }
        assert_eq!(for_key_7, vec!["first", "second"]);
    }
}
