//! Redis Streams-backed durable topic transport (at-least-once delivery).
//!
//! Mapping of the client contract onto Redis Streams:
//!
//! - **Topic** → one stream per topic (`orderflow:topic:<name>`, XADD)
//! - **Durable subscription** → a consumer group per subscriber name
//!   (XGROUP CREATE ... MKSTREAM, idempotent); the group's cursor persists
//!   in Redis across process restarts
//! - **Poll** → XREADGROUP; a fresh session first drains its own pending
//!   backlog (messages delivered but never acknowledged by a previous
//!   session of the same subscriber, walked with an advancing cursor) and
//!   then blocks for new entries (id `>`)
//! - **Commit** → batched XACK of every id delivered since the last commit
//!
//! Because the consumer name equals the subscriber name, one active
//! consumer per subscription is assumed, which is the contract's exclusivity
//! rule.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use orderflow_events::bus::{Message, SubscriberSession, TopicClient, TransportError};

const STREAM_KEY_PREFIX: &str = "orderflow:topic";

/// Durable topic client over Redis Streams.
#[derive(Clone)]
pub struct RedisTopicClient {
    client: Arc<redis::Client>,
}

impl RedisTopicClient {
    /// Connects lazily; the URL is validated here, the first command opens
    /// the connection.
    pub fn new(redis_url: impl AsRef<str>) -> Result<Self, TransportError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    fn connection(&self) -> Result<redis::Connection, TransportError> {
        self.client
            .get_connection()
            .map_err(|e| TransportError::Connection(e.to_string()))
    }
}

fn stream_key(topic: &str) -> String {
    format!("{STREAM_KEY_PREFIX}:{topic}")
}

impl TopicClient for RedisTopicClient {
    type Session = RedisSubscriberSession;

    fn publish(
        &self,
        topic: &str,
        payload: &str,
        ordering_key: &str,
    ) -> Result<(), TransportError> {
        let mut conn = self.connection()?;

        // XADD with auto-generated id; a single stream is totally ordered,
        // which subsumes the per-key ordering guarantee.
        let _: String = redis::cmd("XADD")
            .arg(stream_key(topic))
            .arg("*")
            .arg("ordering_key")
            .arg(ordering_key)
            .arg("payload")
            .arg(payload)
            .query(&mut conn)
            .map_err(|e| TransportError::Publish(format!("XADD failed: {e}")))?;

        Ok(())
    }

    fn durable_subscribe(
        &self,
        topic: &str,
        subscriber_name: &str,
    ) -> Result<Self::Session, TransportError> {
        let key = stream_key(topic);
        let mut conn = self.connection()?;

        // Idempotent group creation; BUSYGROUP means the durable cursor
        // already exists and we resume it.
        let created: Result<String, _> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&key)
            .arg(subscriber_name)
            .arg("0")
            .arg("MKSTREAM")
            .query(&mut conn);
        if let Err(err) = created {
            if !err.to_string().contains("BUSYGROUP") {
                return Err(TransportError::Subscribe(format!(
                    "XGROUP CREATE failed: {err}"
                )));
            }
        }

        debug!(topic, subscriber_name, "durable subscription ready");

        Ok(RedisSubscriberSession {
            client: Arc::clone(&self.client),
            stream_key: key,
            group: subscriber_name.to_string(),
            delivered: Vec::new(),
            backlog: BacklogCursor::new(),
        })
    }
}

/// Cursor over the pending-entries backlog of a resumed session.
///
/// XREADGROUP with an explicit id returns pending entries with ids
/// strictly greater than that id, and nothing leaves the pending list
/// until commit XACKs it. The cursor must therefore advance past every
/// delivered id, otherwise each poll would return the same lowest pending
/// entry again.
enum BacklogCursor {
    Pending(String),
    Drained,
}

impl BacklogCursor {
    fn new() -> Self {
        Self::Pending("0".to_string())
    }

    /// The id to read after, or `None` once the backlog is exhausted.
    fn position(&self) -> Option<&str> {
        match self {
            Self::Pending(id) => Some(id),
            Self::Drained => None,
        }
    }

    fn advance(&mut self, id: &str) {
        *self = Self::Pending(id.to_string());
    }

    fn mark_drained(&mut self) {
        *self = Self::Drained;
    }
}

/// BLOCK argument for a new-entries read.
///
/// Redis treats `BLOCK 0` as "block forever", while the poll contract
/// treats a zero timeout as "do not wait": zero and sub-millisecond
/// timeouts map to a plain non-blocking read instead.
fn block_arg(timeout: Duration) -> Option<u64> {
    let block_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
    if block_ms == 0 { None } else { Some(block_ms) }
}

/// One consumer session on a Redis Streams consumer group.
pub struct RedisSubscriberSession {
    client: Arc<redis::Client>,
    stream_key: String,
    group: String,
    /// Ids delivered since the last commit, acknowledged together.
    delivered: Vec<String>,
    backlog: BacklogCursor,
}

impl RedisSubscriberSession {
    fn connection(&self) -> Result<redis::Connection, TransportError> {
        self.client
            .get_connection()
            .map_err(|e| TransportError::Connection(e.to_string()))
    }

    fn read_one(
        &self,
        conn: &mut redis::Connection,
        id: &str,
        block_ms: Option<u64>,
    ) -> Result<Option<(String, Message)>, TransportError> {
        let mut cmd = redis::cmd("XREADGROUP");
        cmd.arg("GROUP")
            .arg(&self.group)
            // Consumer name = group name: one active consumer per durable
            // subscription, so the pending backlog is always our own.
            .arg(&self.group)
            .arg("COUNT")
            .arg("1");
        if let Some(block_ms) = block_ms {
            cmd.arg("BLOCK").arg(block_ms.to_string());
        }
        cmd.arg("STREAMS").arg(&self.stream_key).arg(id);

        let reply: Option<HashMap<String, Vec<redis::Value>>> = cmd
            .query(conn)
            .map_err(|e| TransportError::Poll(format!("XREADGROUP failed: {e}")))?;

        let entries = match reply.and_then(|mut streams| streams.remove(&self.stream_key)) {
            Some(entries) => entries,
            None => return Ok(None),
        };

        match entries.into_iter().next() {
            Some(entry) => parse_stream_entry(entry).map(Some),
            None => Ok(None),
        }
    }
}

impl SubscriberSession for RedisSubscriberSession {
    fn poll(&mut self, timeout: Duration) -> Result<Option<Message>, TransportError> {
        let mut conn = self.connection()?;

        // Resume: drain messages a previous session received but never
        // acknowledged before asking for new ones, advancing the cursor
        // past each delivered id.
        while let Some(cursor) = self.backlog.position() {
            let cursor = cursor.to_string();
            match self.read_one(&mut conn, &cursor, None)? {
                Some((id, message)) => {
                    self.backlog.advance(&id);
                    self.delivered.push(id);
                    return Ok(Some(message));
                }
                None => self.backlog.mark_drained(),
            }
        }

        match self.read_one(&mut conn, ">", block_arg(timeout))? {
            Some((id, message)) => {
                self.delivered.push(id);
                Ok(Some(message))
            }
            None => Ok(None),
        }
    }

    fn commit(&mut self) -> Result<(), TransportError> {
        if self.delivered.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection()?;

        let _: u64 = redis::cmd("XACK")
            .arg(&self.stream_key)
            .arg(&self.group)
            .arg(&self.delivered[..])
            .query(&mut conn)
            .map_err(|e| TransportError::Commit(format!("XACK failed: {e}")))?;

        self.delivered.clear();
        Ok(())
    }
}

/// Parse one `[id, [field, value, ...]]` stream entry.
fn parse_stream_entry(entry: redis::Value) -> Result<(String, Message), TransportError> {
    let entry_vec = match entry {
        redis::Value::Bulk(v) => v,
        _ => return Err(TransportError::Poll("invalid entry format".to_string())),
    };
    if entry_vec.len() < 2 {
        return Err(TransportError::Poll("entry too short".to_string()));
    }

    let id = match &entry_vec[0] {
        redis::Value::Data(data) => String::from_utf8_lossy(data).to_string(),
        _ => return Err(TransportError::Poll("invalid entry id".to_string())),
    };

    let fields_vec = match &entry_vec[1] {
        redis::Value::Bulk(v) => v,
        _ => return Err(TransportError::Poll("invalid entry fields".to_string())),
    };

    let mut fields: HashMap<String, String> = HashMap::new();
    for chunk in fields_vec.chunks(2) {
        if let [redis::Value::Data(key), redis::Value::Data(value)] = chunk {
            fields.insert(
                String::from_utf8_lossy(key).to_string(),
                String::from_utf8_lossy(value).to_string(),
            );
        }
    }

    let payload = fields
        .remove("payload")
        .ok_or_else(|| TransportError::Poll("missing payload field".to_string()))?;
    let ordering_key = fields.remove("ordering_key").unwrap_or_default();

    Ok((id, Message {
        payload,
        ordering_key,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backlog_cursor_advances_past_each_delivered_id() {
        let mut cursor = BacklogCursor::new();
        assert_eq!(cursor.position(), Some("0"));

        // Each delivery moves the read position; re-reading from the same
        // id would return the same pending entry forever.
        cursor.advance("1-1");
        assert_eq!(cursor.position(), Some("1-1"));
        cursor.advance("1-2");
        assert_eq!(cursor.position(), Some("1-2"));

        cursor.mark_drained();
        assert_eq!(cursor.position(), None);
    }

    #[test]
    fn zero_and_subms_timeouts_read_without_blocking() {
        assert_eq!(block_arg(Duration::ZERO), None);
        assert_eq!(block_arg(Duration::from_micros(500)), None);
    }

    #[test]
    fn positive_timeouts_block_for_their_millis() {
        assert_eq!(block_arg(Duration::from_millis(1)), Some(1));
        assert_eq!(block_arg(Duration::from_secs(1)), Some(1000));
    }

    #[test]
    fn stream_entry_parses_id_and_fields() {
        let entry = redis::Value::Bulk(vec![
            redis::Value::Data(b"1-1".to_vec()),
            redis::Value::Bulk(vec![
                redis::Value::Data(b"ordering_key".to_vec()),
                redis::Value::Data(b"42".to_vec()),
                redis::Value::Data(b"payload".to_vec()),
                redis::Value::Data(b"{}".to_vec()),
            ]),
        ]);

        let (id, message) = parse_stream_entry(entry).unwrap();
        assert_eq!(id, "1-1");
        assert_eq!(message.ordering_key, "42");
        assert_eq!(message.payload, "{}");
    }
}
