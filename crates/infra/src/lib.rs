//! Infrastructure adapters: environment configuration, the Redis Streams
//! transport and the Postgres-backed inventory store.

pub mod config;
pub mod postgres_store;

#[cfg(feature = "redis")]
pub mod redis_bus;

pub use config::AppConfig;
pub use postgres_store::PostgresInventoryStore;

#[cfg(feature = "redis")]
pub use redis_bus::RedisTopicClient;
