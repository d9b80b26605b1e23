//! Domain layer - pure types with no transport or runtime dependencies.

mod errors;
mod message;
mod topic;

pub use errors::TopicError;
pub use message::BrokerMessage;
pub use topic::{Topic, DEFAULT_TOPIC, WILDCARD_ALL};
