//! In-process topic bus.
//!
//! The embedded broker: per-topic broadcast channels behind a read/write
//! locked registry. Every subscription gets its own buffered delivery
//! stream, so a slow consumer lags (and eventually drops its own oldest
//! messages) without ever blocking publishers or other subscribers.
//!
//! Wildcard delivery: subscribers on the universal `">"` topic receive every
//! published message in addition to the exact-match subscribers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{broadcast, RwLock};

use crate::domain::{BrokerMessage, Topic, WILDCARD_ALL};
use crate::ports::{Broker, BrokerError, BrokerLogSink, Subscription};

/// Default per-subscription buffer. Large enough for bursts; a subscriber
/// that falls further behind loses its own oldest messages only.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// How often `ready` re-checks the readiness flag while waiting.
const READY_RECHECK: Duration = Duration::from_millis(10);

struct BusInner {
    /// Map of topic name → broadcast sender for that topic.
    topics: RwLock<HashMap<String, broadcast::Sender<BrokerMessage>>>,

    /// Set once `start` has run; cleared again on shutdown.
    ready: AtomicBool,

    /// Set by `shutdown`; all operations fail afterwards.
    closed: AtomicBool,

    /// Buffer size for each topic's broadcast channel.
    capacity: usize,

    /// Lifecycle reporting sink.
    sink: Arc<dyn BrokerLogSink>,
}

/// Embedded topic-based pub/sub bus.
pub struct MemoryBus {
    inner: Arc<BusInner>,
}

impl MemoryBus {
    /// Creates a bus with the default per-subscription capacity.
    pub fn new(sink: Arc<dyn BrokerLogSink>) -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY, sink)
    }

    /// Creates a bus with an explicit per-subscription buffer size.
    pub fn with_capacity(capacity: usize, sink: Arc<dyn BrokerLogSink>) -> Self {
        Self {
            inner: Arc::new(BusInner {
                topics: RwLock::new(HashMap::new()),
                ready: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                capacity,
                sink,
            }),
        }
    }

    /// Brings the bus up. Called by the supervisor, not by request paths.
    pub fn start(&self) {
        self.inner.ready.store(true, Ordering::SeqCst);
        self.inner.sink.notice("message bus started");
    }

    /// Number of live subscriptions on a topic (diagnostics and tests).
    pub async fn subscriber_count(&self, topic: &Topic) -> usize {
        let topics = self.inner.topics.read().await;
        topics
            .get(topic.as_str())
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }
}

impl BusInner {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Removes a topic entry once its last subscriber is gone.
    ///
    /// The count is re-checked under the write lock: a subscribe landing
    /// between the cheap read-side check and the removal keeps the entry
    /// (and its sender) alive.
    async fn collect_if_empty(&self, topic: &str) {
        {
            let topics = self.topics.read().await;
            match topics.get(topic) {
                Some(sender) if sender.receiver_count() == 0 => {}
                _ => return,
            }
        }

        let mut topics = self.topics.write().await;
        if let Some(sender) = topics.get(topic) {
            if sender.receiver_count() == 0 {
                topics.remove(topic);
                self.sink.debug(&format!("topic '{topic}' released"));
            }
        }
    }
}

#[async_trait]
impl Broker for MemoryBus {
    async fn publish(&self, topic: &Topic, payload: Bytes) -> Result<(), BrokerError> {
        if self.inner.is_closed() {
            return Err(BrokerError::Closed);
        }

        let message = BrokerMessage::new(topic.clone(), payload);
        let topics = self.inner.topics.read().await;

        // Exact-match delivery. Send errors mean no live receivers, which
        // is not a publish failure.
        if let Some(sender) = topics.get(topic.as_str()) {
            let _ = sender.send(message.clone());
        }

        // Wildcard delivery to trusted all-topic subscribers.
        if !topic.is_wildcard() {
            if let Some(sender) = topics.get(WILDCARD_ALL) {
                let _ = sender.send(message);
            }
        }

        self.inner
            .sink
            .trace(&format!("published to '{}'", topic.as_str()));
        Ok(())
    }

    async fn subscribe(&self, topic: &Topic) -> Result<Box<dyn Subscription>, BrokerError> {
        if self.inner.is_closed() {
            return Err(BrokerError::Closed);
        }

        let receiver = {
            let mut topics = self.inner.topics.write().await;
            let sender = topics
                .entry(topic.as_str().to_string())
                .or_insert_with(|| broadcast::channel(self.inner.capacity).0);
            sender.subscribe()
        };

        self.inner
            .sink
            .debug(&format!("subscription created on '{}'", topic.as_str()));

        Ok(Box::new(BusSubscription {
            topic: topic.clone(),
            receiver: Some(receiver),
            inner: Arc::clone(&self.inner),
        }))
    }

    async fn ready(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.inner.ready.load(Ordering::SeqCst) && !self.inner.is_closed() {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(READY_RECHECK).await;
        }
    }

    async fn drain(&self) {
        // Deliveries sit in per-subscription buffers; yielding lets the
        // pump tasks consume what is already queued.
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        self.inner.sink.notice("message bus drained");
    }

    async fn shutdown(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.ready.store(false, Ordering::SeqCst);

        // Dropping the senders closes every subscriber's stream.
        self.inner.topics.write().await.clear();
        self.inner.sink.notice("message bus stopped");
    }
}

/// One live delivery stream for one topic.
struct BusSubscription {
    topic: Topic,
    receiver: Option<broadcast::Receiver<BrokerMessage>>,
    inner: Arc<BusInner>,
}

#[async_trait]
impl Subscription for BusSubscription {
    async fn recv(&mut self) -> Option<BrokerMessage> {
        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.recv().await {
                Ok(message) => return Some(message),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    // This subscriber fell behind; its oldest messages were
                    // dropped. Other subscriptions are unaffected.
                    self.inner.sink.warn(&format!(
                        "subscription on '{}' lagged, {missed} messages dropped",
                        self.topic.as_str()
                    ));
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    async fn unsubscribe(mut self: Box<Self>) {
        if self.receiver.take().is_some() {
            self.inner.collect_if_empty(self.topic.as_str()).await;
            self.inner.sink.debug(&format!(
                "subscription released on '{}'",
                self.topic.as_str()
            ));
        }
    }
}
