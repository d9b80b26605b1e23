//! Broker port - interface to the pub/sub message bus.
//!
//! The gateway treats the broker as a provided, reliable primitive: it
//! publishes, subscribes, and drives lifecycle (`ready`, `drain`,
//! `shutdown`) without any knowledge of routing or storage internals.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::domain::{BrokerMessage, Topic};

/// Errors surfaced by broker operations.
#[derive(Debug, Clone, Error)]
pub enum BrokerError {
    /// The broker has been shut down; no further operations succeed.
    #[error("Broker is shut down")]
    Closed,

    /// The broker never reported ready during startup polling.
    #[error("Broker not ready after {attempts} attempts")]
    NeverReady { attempts: u32 },
}

/// Port for publishing to and subscribing on the message bus.
///
/// Implementations must ensure:
/// - delivery is exact-match per topic (the universal wildcard `">"` is the
///   only exception, reserved for trusted internal subscribers)
/// - one slow subscriber never blocks delivery to another
/// - after `shutdown`, publish and subscribe fail with [`BrokerError::Closed`]
#[async_trait]
pub trait Broker: Send + Sync {
    /// Publish a payload to a topic.
    ///
    /// Fire-and-forget from the caller's perspective: the broker buffers
    /// internally and delivery to subscribers is asynchronous.
    async fn publish(&self, topic: &Topic, payload: Bytes) -> Result<(), BrokerError>;

    /// Subscribe to a topic, receiving every subsequently published message.
    ///
    /// Each subscription is an independent delivery stream; the caller owns
    /// the handle and must release it via [`Subscription::unsubscribe`] (or
    /// by dropping it) when the consumer goes away.
    async fn subscribe(&self, topic: &Topic) -> Result<Box<dyn Subscription>, BrokerError>;

    /// Poll readiness, waiting up to `timeout` for the broker to come up.
    async fn ready(&self, timeout: Duration) -> bool;

    /// Allow buffered deliveries to flush before shutdown.
    async fn drain(&self);

    /// Stop the broker. Existing subscriptions see end-of-stream.
    async fn shutdown(&self);
}

/// A live subscription handle for one topic.
#[async_trait]
pub trait Subscription: Send {
    /// Receive the next message for the subscribed topic.
    ///
    /// Returns `None` once the subscription is no longer active (broker
    /// shut down or the subscription was released).
    async fn recv(&mut self) -> Option<BrokerMessage>;

    /// Release the subscription so the broker stops delivering to it.
    ///
    /// Idempotent at the broker level: releasing an already-released
    /// subscription is a no-op.
    async fn unsubscribe(self: Box<Self>);
}
