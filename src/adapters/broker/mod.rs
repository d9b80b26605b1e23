//! Broker adapters - the embedded message bus and its supervision.

mod log_sink;
mod memory_bus;
mod supervisor;

pub use log_sink::TracingLogSink;
pub use memory_bus::MemoryBus;
pub use supervisor::{BrokerSupervisor, READY_POLL_ATTEMPTS, READY_POLL_INTERVAL};
