//! Broker process supervision.
//!
//! Starts the embedded bus, blocks the gateway until it reports ready, and
//! owns the ordered stop sequence (drain, then shutdown). The gateway must
//! never accept connections before `wait_ready` succeeds.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::ports::{Broker, BrokerError};

use super::memory_bus::MemoryBus;

/// Readiness poll interval.
pub const READY_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Attempts before readiness is declared a fatal startup error.
pub const READY_POLL_ATTEMPTS: u32 = 50;

/// Supervises the embedded broker's lifecycle.
pub struct BrokerSupervisor {
    bus: Arc<MemoryBus>,
}

impl BrokerSupervisor {
    /// Takes ownership of the broker's lifecycle.
    pub fn new(bus: Arc<MemoryBus>) -> Self {
        Self { bus }
    }

    /// The supervised broker, as seen by the request paths.
    pub fn broker(&self) -> Arc<dyn Broker> {
        Arc::clone(&self.bus) as Arc<dyn Broker>
    }

    /// Starts the broker asynchronously.
    pub fn start(&self) {
        let bus = Arc::clone(&self.bus);
        info!("starting embedded broker");
        tokio::spawn(async move {
            bus.start();
        });
    }

    /// Blocks until the broker reports ready.
    ///
    /// Polls at [`READY_POLL_INTERVAL`] up to [`READY_POLL_ATTEMPTS`] times.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::NeverReady`] if every attempt times out; the
    /// caller must treat this as startup-fatal and not serve traffic.
    pub async fn wait_ready(&self) -> Result<(), BrokerError> {
        for attempt in 0..READY_POLL_ATTEMPTS {
            if self.bus.ready(READY_POLL_INTERVAL).await {
                info!("broker ready");
                return Ok(());
            }
            warn!(attempt, "waiting for broker");
        }
        Err(BrokerError::NeverReady {
            attempts: READY_POLL_ATTEMPTS,
        })
    }

    /// Ordered stop: drain buffered deliveries, then shut the broker down.
    ///
    /// Callers stop accepting inbound requests before invoking this.
    pub async fn stop(&self) {
        self.bus.drain().await;
        self.bus.shutdown().await;
        info!("broker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Topic;
    use crate::ports::BrokerLogSink;
    use bytes::Bytes;

    struct NullSink;

    impl BrokerLogSink for NullSink {
        fn notice(&self, _: &str) {}
        fn warn(&self, _: &str) {}
        fn error(&self, _: &str) {}
        fn fatal(&self, _: &str) {}
        fn debug(&self, _: &str) {}
        fn trace(&self, _: &str) {}
    }

    fn supervisor() -> BrokerSupervisor {
        BrokerSupervisor::new(Arc::new(MemoryBus::new(Arc::new(NullSink))))
    }

    #[tokio::test]
    async fn wait_ready_succeeds_after_start() {
        let supervisor = supervisor();
        supervisor.start();

        supervisor.wait_ready().await.unwrap();
    }

    #[tokio::test]
    async fn stop_closes_the_broker() {
        let supervisor = supervisor();
        supervisor.start();
        supervisor.wait_ready().await.unwrap();

        supervisor.stop().await;

        let broker = supervisor.broker();
        let topic = Topic::parse("orders").unwrap();
        assert!(broker.publish(&topic, Bytes::from_static(b"x")).await.is_err());
    }

    #[tokio::test]
    async fn broker_handle_publishes_while_running() {
        let supervisor = supervisor();
        supervisor.start();
        supervisor.wait_ready().await.unwrap();

        let broker = supervisor.broker();
        let topic = Topic::parse("orders").unwrap();
        broker
            .publish(&topic, Bytes::from_static(b"x"))
            .await
            .unwrap();
    }
}
