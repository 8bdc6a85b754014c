//! Domain events and the durable pub/sub transport contract.
//!
//! This crate contains **pure event-layer** building blocks (no broker or
//! storage concerns): the immutable event value types, the narrow client
//! contract over a topic-based transport, and an in-memory broker used by
//! tests and local development.

pub mod bus;
pub mod in_memory;
pub mod model;

pub use bus::{Message, SubscriberSession, TopicClient, TransportError};
pub use in_memory::InMemoryTopicBroker;
pub use model::{
    ClaimEvent, ClaimStatus, ClaimType, EntryStatus, OrderEvent, OrderStatus,
};
