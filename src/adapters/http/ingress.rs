//! Ingress dispatcher.
//!
//! Routes every inbound request by method:
//! - `GET <path>` with a WebSocket upgrade → duplex session bound to the
//!   topic taken from the path (root path → `"default"`)
//! - `POST <path>` with a non-empty body → one-shot publish, no
//!   subscription
//! - anything else → 405
//!
//! Topic validation happens before any upgrade or publish; a rejected path
//! is answered with 400 and never reaches the broker.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Path, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use bytes::Bytes;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::adapters::websocket::run_session;
use crate::domain::Topic;
use crate::ports::Broker;

/// Shared state for the ingress handlers.
///
/// Only the broker handle: sessions carry their own state, and there is no
/// cross-session coordination on the request path.
#[derive(Clone)]
pub struct GatewayState {
    pub broker: Arc<dyn Broker>,
}

impl GatewayState {
    /// Creates ingress state over a broker handle.
    pub fn new(broker: Arc<dyn Broker>) -> Self {
        Self { broker }
    }
}

/// Builds the gateway router.
///
/// Origins are left open, matching the browser-facing dev posture of the
/// service; unmatched methods on the routes answer 405.
pub fn gateway_router(state: GatewayState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(duplex_root).post(one_shot_root))
        .route("/*path", get(duplex).post(one_shot))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn duplex_root(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<GatewayState>,
) -> Response {
    handle_duplex(ws, addr, state, "")
}

async fn duplex(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<GatewayState>,
    Path(path): Path<String>,
) -> Response {
    handle_duplex(ws, addr, state, &path)
}

async fn one_shot_root(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<GatewayState>,
    body: Bytes,
) -> Response {
    handle_one_shot(addr, state, "", body).await
}

async fn one_shot(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<GatewayState>,
    Path(path): Path<String>,
    body: Bytes,
) -> Response {
    handle_one_shot(addr, state, &path, body).await
}

/// Duplex path: validate, upgrade, hand the connection to a session relay.
///
/// From the upgrade callback on, the relay owns the connection's lifetime.
fn handle_duplex(
    ws: WebSocketUpgrade,
    addr: SocketAddr,
    state: GatewayState,
    raw_path: &str,
) -> Response {
    let topic = match Topic::parse(raw_path) {
        Ok(topic) => topic,
        Err(err) => {
            warn!(client = %addr, error = %err, "duplex upgrade rejected");
            return (StatusCode::BAD_REQUEST, "Invalid topic").into_response();
        }
    };

    info!(client = %addr, topic = topic.as_str(), "duplex upgrade accepted");
    ws.on_upgrade(move |socket| run_session(socket, topic, addr.to_string(), state.broker))
}

/// One-shot path: validate, read the full body, publish once.
///
/// Empty bodies are rejected; they would be indistinguishable from a
/// liveness signal downstream. Broker failures answer 500 with no retry.
async fn handle_one_shot(
    addr: SocketAddr,
    state: GatewayState,
    raw_path: &str,
    body: Bytes,
) -> Response {
    let topic = match Topic::parse(raw_path) {
        Ok(topic) => topic,
        Err(err) => {
            warn!(client = %addr, error = %err, "one-shot publish rejected");
            return (StatusCode::BAD_REQUEST, "Invalid topic").into_response();
        }
    };

    if body.is_empty() {
        return (StatusCode::BAD_REQUEST, "Empty body").into_response();
    }

    info!(
        client = %addr,
        topic = topic.as_str(),
        bytes = body.len(),
        "one-shot publish"
    );

    match state.broker.publish(&topic, body).await {
        Ok(()) => (
            StatusCode::OK,
            format!("Message published to topic: {}", topic.as_str()),
        )
            .into_response(),
        Err(err) => {
            warn!(client = %addr, error = %err, "one-shot publish failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to publish message",
            )
                .into_response()
        }
    }
}
