//! Broker message envelope.

use bytes::Bytes;

use super::topic::Topic;

/// An immutable payload delivered by the broker for a topic.
///
/// Payloads are forwarded verbatim; the gateway never inspects or rewrites
/// them. `Bytes` keeps the clone handed to each subscriber cheap.
#[derive(Debug, Clone)]
pub struct BrokerMessage {
    /// The topic the payload was published on.
    pub topic: Topic,

    /// The raw payload bytes.
    pub payload: Bytes,
}

impl BrokerMessage {
    /// Creates a new message envelope.
    pub fn new(topic: Topic, payload: Bytes) -> Self {
        Self { topic, payload }
    }
}
