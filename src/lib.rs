//! Topic Bridge - WebSocket/HTTP gateway to a topic-based pub/sub bus
//!
//! This crate bridges browser-style duplex connections and plain HTTP
//! submissions onto an embedded publish/subscribe message bus, so clients
//! without a native pub/sub library can participate over web transports.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
