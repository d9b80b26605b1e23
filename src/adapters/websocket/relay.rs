//! Session relay: the live bidirectional pump between one WebSocket
//! connection and the broker.
//!
//! # Flows
//!
//! ```text
//! broker subscription ──recv──▶ relay ──write──▶ connection
//! connection ──read──▶ relay ──publish──▶ broker
//! ```
//!
//! Both flows run until either side reports a terminal condition:
//! - a connection read failure or close frame
//! - a connection write failure (the peer is presumed dead)
//! - the broker subscription stream ending (broker shutdown)
//!
//! The first terminal condition wins the close transition on the session's
//! state machine; cleanup (unsubscribe, close) then runs exactly once.
//! A publish failure is not terminal: the message is lost, the session
//! continues.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use crate::domain::{BrokerMessage, Topic};
use crate::ports::Broker;

use super::session::Session;

/// Liveness probe token clients may send on the duplex path.
///
/// Recognized and dropped before reaching the broker: it has no
/// topic-semantic value and must not be published.
pub const CONTROL_TOKEN: &[u8] = b"ping";

/// Runs one duplex session to completion, owning the connection.
///
/// Subscribes to the bound topic, pumps both directions, and tears down
/// broker-side resources exactly once when either side ends. The session
/// never reaches `Active` if the subscription fails.
pub async fn run_session(
    socket: WebSocket,
    topic: Topic,
    remote: String,
    broker: Arc<dyn Broker>,
) {
    let session = Session::new(topic, remote);
    info!(
        session = %session.id(),
        client = session.remote(),
        topic = session.topic().as_str(),
        "duplex session connecting"
    );

    let mut subscription = match broker.subscribe(session.topic()).await {
        Ok(sub) => sub,
        Err(err) => {
            warn!(
                session = %session.id(),
                error = %err,
                "broker subscription failed, closing connection"
            );
            session.begin_close();
            let mut socket = socket;
            let _ = socket.send(Message::Close(None)).await;
            session.mark_closed();
            return;
        }
    };

    session.activate();
    info!(session = %session.id(), "duplex session active");

    let (mut writer, mut reader) = socket.split();

    loop {
        tokio::select! {
            delivered = subscription.recv() => {
                match delivered {
                    Some(message) => {
                        // One write attempt; failure means the peer is dead.
                        if writer.send(to_ws_message(&message)).await.is_err() {
                            debug!(
                                session = %session.id(),
                                "write to connection failed"
                            );
                            session.begin_close();
                            break;
                        }
                    }
                    None => {
                        debug!(session = %session.id(), "broker stream ended");
                        session.begin_close();
                        break;
                    }
                }
            }
            frame = reader.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        relay_inbound(&session, &broker, Bytes::from(text)).await;
                    }
                    Some(Ok(Message::Binary(data))) => {
                        relay_inbound(&session, &broker, Bytes::from(data)).await;
                    }
                    // Protocol ping/pong frames are answered by the server
                    // transport; nothing to forward.
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(session = %session.id(), "connection closed by peer");
                        session.begin_close();
                        break;
                    }
                    Some(Err(err)) => {
                        debug!(
                            session = %session.id(),
                            error = %err,
                            "connection read failed"
                        );
                        session.begin_close();
                        break;
                    }
                }
            }
        }
    }

    // Exactly-once teardown: release the subscription, close the
    // connection, then the session is terminal.
    subscription.unsubscribe().await;
    let _ = writer.send(Message::Close(None)).await;
    session.mark_closed();
    info!(
        session = %session.id(),
        client = session.remote(),
        topic = session.topic().as_str(),
        "duplex session closed"
    );
}

/// Forwards one inbound payload to the broker, filtering control tokens.
///
/// A publish failure is logged and swallowed: a single lost message does
/// not terminate the session.
async fn relay_inbound(session: &Session, broker: &Arc<dyn Broker>, payload: Bytes) {
    if is_control_token(&payload) {
        debug!(session = %session.id(), "control token dropped");
        return;
    }

    debug!(
        session = %session.id(),
        topic = session.topic().as_str(),
        bytes = payload.len(),
        "connection -> broker"
    );

    if let Err(err) = broker.publish(session.topic(), payload).await {
        warn!(
            session = %session.id(),
            error = %err,
            "publish failed, session continues"
        );
    }
}

/// Whether a payload is a recognized liveness probe.
fn is_control_token(payload: &[u8]) -> bool {
    payload == CONTROL_TOKEN
}

/// Broker payloads go out as text when they are valid UTF-8, binary
/// otherwise; either way the bytes are forwarded verbatim.
fn to_ws_message(message: &BrokerMessage) -> Message {
    match std::str::from_utf8(&message.payload) {
        Ok(text) => Message::Text(text.to_string()),
        Err(_) => Message::Binary(message.payload.to_vec()),
    }
}
