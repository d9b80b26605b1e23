//! Ports - interfaces the gateway core depends on.
//!
//! The broker is an external collaborator; the gateway only ever talks to it
//! through these traits. Adapters live in `crate::adapters`.

mod broker;
mod log_sink;

pub use broker::{Broker, BrokerError, Subscription};
pub use log_sink::BrokerLogSink;
