//! Per-session state machine.
//!
//! A session binds one duplex connection to one topic for its lifetime.
//! Two execution contexts touch the close transition: the connection read
//! path and the broker delivery path. The transition is an atomic
//! test-and-set so concurrent close attempts collapse into one winner.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use uuid::Uuid;

use crate::domain::Topic;

/// Unique identifier for a duplex session, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a duplex session. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    /// Upgrade succeeded, broker subscription not yet established.
    Connecting = 0,
    /// Both the upgrade and the subscription succeeded; flows are pumping.
    Active = 1,
    /// A terminal condition was observed; cleanup is in progress.
    Closing = 2,
    /// Resources released. Nothing survives this state.
    Closed = 3,
}

impl SessionState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => SessionState::Connecting,
            1 => SessionState::Active,
            2 => SessionState::Closing,
            _ => SessionState::Closed,
        }
    }
}

/// One live duplex connection bound to one topic.
pub struct Session {
    id: SessionId,
    topic: Topic,
    remote: String,
    state: AtomicU8,
}

impl Session {
    /// Creates a session in `Connecting`.
    pub fn new(topic: Topic, remote: impl Into<String>) -> Self {
        Self {
            id: SessionId::new(),
            topic,
            remote: remote.into(),
            state: AtomicU8::new(SessionState::Connecting as u8),
        }
    }

    /// Session identifier for diagnostics.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// The topic this session is bound to.
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Remote address of the client connection.
    pub fn remote(&self) -> &str {
        &self.remote
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Marks the session live once the broker subscription succeeded.
    ///
    /// Returns `false` if the session already left `Connecting`.
    pub fn activate(&self) -> bool {
        self.state
            .compare_exchange(
                SessionState::Connecting as u8,
                SessionState::Active as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// Requests the close transition.
    ///
    /// Safe to call concurrently from both flows: exactly one caller wins
    /// and gets `true`; everyone else observes the session already in
    /// `Closing`/`Closed` and gets `false`.
    pub fn begin_close(&self) -> bool {
        loop {
            let current = self.state.load(Ordering::SeqCst);
            if current >= SessionState::Closing as u8 {
                return false;
            }
            if self
                .state
                .compare_exchange(
                    current,
                    SessionState::Closing as u8,
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                )
                .is_ok()
            {
                return true;
            }
        }
    }

    /// Marks cleanup finished. Terminal.
    pub fn mark_closed(&self) {
        self.state.store(SessionState::Closed as u8, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Barrier;

    fn session() -> Session {
        Session::new(Topic::parse("chat").unwrap(), "127.0.0.1:9999")
    }

    #[test]
    fn starts_in_connecting() {
        assert_eq!(session().state(), SessionState::Connecting);
    }

    #[test]
    fn activate_moves_to_active_once() {
        let s = session();
        assert!(s.activate());
        assert_eq!(s.state(), SessionState::Active);
        assert!(!s.activate());
    }

    #[test]
    fn begin_close_from_active_wins_once() {
        let s = session();
        s.activate();

        assert!(s.begin_close());
        assert_eq!(s.state(), SessionState::Closing);
        assert!(!s.begin_close());
    }

    #[test]
    fn begin_close_from_connecting_is_allowed() {
        // Subscription failure closes a session that never reached Active.
        let s = session();
        assert!(s.begin_close());
        assert_eq!(s.state(), SessionState::Closing);
    }

    #[test]
    fn mark_closed_is_terminal() {
        let s = session();
        s.activate();
        s.begin_close();
        s.mark_closed();

        assert_eq!(s.state(), SessionState::Closed);
        assert!(!s.begin_close());
        assert!(!s.activate());
    }

    #[tokio::test]
    async fn concurrent_close_attempts_produce_one_winner() {
        // Simulates a connection error and a broker write failure arriving
        // at the same time: exactly one flow performs cleanup.
        for _ in 0..100 {
            let s = Arc::new(session());
            s.activate();
            let barrier = Arc::new(Barrier::new(2));

            let a = {
                let s = Arc::clone(&s);
                let barrier = Arc::clone(&barrier);
                tokio::spawn(async move {
                    barrier.wait().await;
                    s.begin_close()
                })
            };
            let b = {
                let s = Arc::clone(&s);
                let barrier = Arc::clone(&barrier);
                tokio::spawn(async move {
                    barrier.wait().await;
                    s.begin_close()
                })
            };

            let (won_a, won_b) = (a.await.unwrap(), b.await.unwrap());
            assert!(won_a ^ won_b, "exactly one flow must win the close");
            assert_eq!(s.state(), SessionState::Closing);
        }
    }

    #[test]
    fn session_exposes_diagnostic_identity() {
        let s = session();
        assert_eq!(s.topic().as_str(), "chat");
        assert_eq!(s.remote(), "127.0.0.1:9999");
        assert_eq!(s.id().to_string().len(), 36);
    }
}
