//! Durable publish/subscribe transport contract (mechanics only).
//!
//! This module defines the **narrow client contract** the rest of the system
//! uses to talk to a topic-based transport. The transport itself (broker
//! storage, replication, partition assignment) is out of scope; this layer
//! only fixes the delivery and ordering semantics every implementation has
//! to provide:
//!
//! - **Durable named subscriptions**: a subscription cursor is created on
//!   the first `durable_subscribe` with a given name and survives process
//!   restarts. Only one active consumer per (topic, subscriber name) is
//!   supported; enforcing exclusivity is the transport's job.
//! - **At-least-once delivery**: the cursor advances only on explicit
//!   [`SubscriberSession::commit`]. A crash between receive and commit
//!   causes redelivery on reconnect; consumers must be idempotent.
//! - **Ordering keys**: two messages published with the same ordering key
//!   by the same publisher session are delivered in send order. Across
//!   keys there is no guarantee.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// A message as delivered by the transport.
///
/// The payload is opaque JSON text; the transport never reinterprets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub payload: String,
    pub ordering_key: String,
}

/// Transport-level failure.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport connection error: {0}")]
    Connection(String),

    #[error("publish failed: {0}")]
    Publish(String),

    #[error("subscribe failed: {0}")]
    Subscribe(String),

    #[error("poll failed: {0}")]
    Poll(String),

    #[error("commit failed: {0}")]
    Commit(String),
}

/// Client handle for a durable topic-based transport.
///
/// Implementations must be safe to share across threads; publishing is
/// synchronous and may block on I/O.
pub trait TopicClient: Send + Sync {
    type Session: SubscriberSession;

    /// Publish one message to `topic`.
    ///
    /// Ordering between two messages with the same `ordering_key` sent by
    /// this client is preserved end to end.
    fn publish(
        &self,
        topic: &str,
        payload: &str,
        ordering_key: &str,
    ) -> Result<(), TransportError>;

    /// Create or resume the durable subscription `subscriber_name` on
    /// `topic`, returning a session positioned at the last committed cursor.
    fn durable_subscribe(
        &self,
        topic: &str,
        subscriber_name: &str,
    ) -> Result<Self::Session, TransportError>;
}

/// One consumer's session on a durable subscription.
///
/// The session tracks every message it has delivered since the last commit;
/// `commit` advances the durable cursor past all of them at once. This is
/// the only operation that advances the durable position.
pub trait SubscriberSession {
    /// Block up to `timeout` for the next message.
    ///
    /// Returns `Ok(None)` on timeout; a timeout is never an error.
    fn poll(&mut self, timeout: Duration) -> Result<Option<Message>, TransportError>;

    /// Advance the durable cursor past everything delivered in this session
    /// since the last commit.
    fn commit(&mut self) -> Result<(), TransportError>;
}

impl<C> TopicClient for Arc<C>
where
    C: TopicClient + ?Sized,
{
    type Session = C::Session;

    fn publish(
        &self,
        topic: &str,
        payload: &str,
        ordering_key: &str,
    ) -> Result<(), TransportError> {
        (**self).publish(topic, payload, ordering_key)
    }

    fn durable_subscribe(
        &self,
        topic: &str,
        subscriber_name: &str,
    ) -> Result<Self::Session, TransportError> {
        (**self).durable_subscribe(topic, subscriber_name)
    }
}
